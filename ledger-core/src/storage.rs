//! Snapshot storage for ledger entries
//!
//! The ledger itself is in-memory; a [`SnapshotStore`] persists the full
//! entry list and hands it back on restart. [`JsonFileStore`] keeps the
//! `{ "transactions": [...] }` file layout.

use crate::{types::LedgerEntry, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Persistence backend for ledger snapshots
pub trait SnapshotStore: Send + Sync + fmt::Debug {
    /// Load all stored entries, chronological
    fn load(&self) -> Result<Vec<LedgerEntry>>;

    /// Replace the stored snapshot
    fn save(&self, entries: &[LedgerEntry]) -> Result<()>;
}

#[derive(Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    transactions: Vec<LedgerEntry>,
}

#[derive(Serialize)]
struct SnapshotFileRef<'a> {
    transactions: &'a [LedgerEntry],
}

/// Pretty-printed JSON file store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File location
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Vec<LedgerEntry>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No snapshot at {:?}, starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let file: SnapshotFile = serde_json::from_str(&content)?;
        tracing::info!(
            "Loaded {} transactions from {:?}",
            file.transactions.len(),
            self.path
        );
        Ok(file.transactions)
    }

    fn save(&self, entries: &[LedgerEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_string_pretty(&SnapshotFileRef {
            transactions: entries,
        })?;

        // Write-then-rename so readers never see a partial file
        let tmp = self.temp_path();
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Storage(format!("Failed to replace {:?}: {}", self.path, e)))?;

        tracing::debug!("Saved {} transactions to {:?}", entries.len(), self.path);
        Ok(())
    }
}
