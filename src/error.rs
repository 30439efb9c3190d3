use thiserror::Error;

/// Failures surfaced by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be opened or its schema created.
    #[error("store unavailable: {0:#}")]
    Unavailable(anyhow::Error),

    #[error("database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("failed to serialize subject marks: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no student record with id {0}")]
    NotFound(i64),

    #[error("invalid student record: {0}")]
    InvalidRecord(String),
}

impl StoreError {
    /// Stable error code reported over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "store_unavailable",
            StoreError::Query(_) => "db_query_failed",
            StoreError::Encode(_) => "encode_failed",
            StoreError::NotFound(_) => "not_found",
            StoreError::InvalidRecord(_) => "bad_params",
        }
    }
}
