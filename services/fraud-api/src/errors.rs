use actix_web::{HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),
    StorageError(String),
    ConfigurationError(String),
    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            ApiError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::StorageError(_) => "STORAGE_ERROR",
            ApiError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let body = serde_json::json!({
            "error": self.code(),
            "message": self.to_string()
        });
        match self {
            ApiError::ValidationError(_) => HttpResponse::BadRequest().json(body),
            _ => HttpResponse::InternalServerError().json(body),
        }
    }
}

impl From<ledger_core::Error> for ApiError {
    fn from(err: ledger_core::Error) -> Self {
        match err {
            ledger_core::Error::Validation(msg) => ApiError::ValidationError(msg),
            e @ ledger_core::Error::IdConflict { .. } => ApiError::ValidationError(e.to_string()),
            ledger_core::Error::Config(msg) => ApiError::ConfigurationError(msg),
            ledger_core::Error::Risk(e) => ApiError::ConfigurationError(e.to_string()),
            e @ (ledger_core::Error::Storage(_)
            | ledger_core::Error::Serialization(_)
            | ledger_core::Error::Io(_)) => ApiError::StorageError(e.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
