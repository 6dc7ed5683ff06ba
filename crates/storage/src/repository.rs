use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::client_store::{ClientStore, InMemoryClientStore};
use crate::images::{ImageSource, InMemoryImageSource};

/// HTTP status the ledger API uses to signal "too many requests".
pub const RATE_LIMIT_STATUS: u16 = 429;

/// One ledger row: an ordered list of cell values.
pub type LedgerRow = Vec<String>;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("rate limited (status {status})")]
    RateLimited { status: u16 },

    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("cryptographic operation failed")]
    Crypto,
}

impl StorageError {
    /// Whether the failure is a rate limit that may succeed on retry.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, StorageError::RateLimited { .. })
    }

    /// Classify a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if status == RATE_LIMIT_STATUS {
            StorageError::RateLimited { status }
        } else {
            StorageError::Http {
                status,
                message: message.into(),
            }
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

/// Append-only table of submitted ratings; the system of record for resumption.
///
/// Appends are not atomic across concurrent clients: rows from different
/// respondents may interleave.
#[async_trait]
pub trait RatingLedger: Send + Sync {
    /// Read every row, in ledger order. A header row, if present, is included.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the ledger cannot be read.
    async fn get_all_rows(&self) -> Result<Vec<LedgerRow>, StorageError>;

    /// Append a single row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::RateLimited` when throttled, other variants otherwise.
    async fn append_row(&self, row: &[String]) -> Result<(), StorageError>;

    /// Append several rows in one request.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::RateLimited` when throttled, other variants otherwise.
    async fn append_rows(&self, rows: &[LedgerRow]) -> Result<(), StorageError>;
}

/// Simple in-memory ledger for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    rows: Arc<Mutex<Vec<LedgerRow>>>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rows(rows: Vec<LedgerRow>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    /// Snapshot of the current rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn rows(&self) -> Result<Vec<LedgerRow>, StorageError> {
        let guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl RatingLedger for InMemoryLedger {
    async fn get_all_rows(&self) -> Result<Vec<LedgerRow>, StorageError> {
        self.rows()
    }

    async fn append_row(&self, row: &[String]) -> Result<(), StorageError> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(row.to_vec());
        Ok(())
    }

    async fn append_rows(&self, rows: &[LedgerRow]) -> Result<(), StorageError> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.extend(rows.iter().cloned());
        Ok(())
    }
}

/// Aggregates the ledger, client store and image source behind trait objects
/// for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub ledger: Arc<dyn RatingLedger>,
    pub client_store: Arc<dyn ClientStore>,
    pub images: Arc<dyn ImageSource>,
}

impl Storage {
    #[must_use]
    pub fn new(
        ledger: Arc<dyn RatingLedger>,
        client_store: Arc<dyn ClientStore>,
        images: Arc<dyn ImageSource>,
    ) -> Self {
        Self {
            ledger,
            client_store,
            images,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            ledger: Arc::new(InMemoryLedger::new()),
            client_store: Arc::new(InMemoryClientStore::new()),
            images: Arc::new(InMemoryImageSource::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> LedgerRow {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[tokio::test]
    async fn appends_preserve_order() {
        let ledger = InMemoryLedger::with_rows(vec![row(&["header"])]);
        ledger.append_row(&row(&["a", "1"])).await.unwrap();
        ledger
            .append_rows(&[row(&["b", "2"]), row(&["c"])])
            .await
            .unwrap();

        let rows = ledger.get_all_rows().await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1], row(&["a", "1"]));
        assert_eq!(rows[3], row(&["c"]));
    }

    #[test]
    fn status_429_is_rate_limited() {
        assert!(StorageError::from_status(429, "slow down").is_rate_limited());
        let err = StorageError::from_status(500, "boom");
        assert!(!err.is_rate_limited());
        assert!(matches!(err, StorageError::Http { status: 500, .. }));
    }
}
