use serde::{Deserialize, Serialize};

// ===== Health Check =====
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub transactions: usize,
}

// ===== Query Parameters =====
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub within_secs: Option<u64>,
}

pub const DEFAULT_LIST_LIMIT: usize = 10;
