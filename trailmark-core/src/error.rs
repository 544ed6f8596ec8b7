//! Error types for Trailmark operations

/// Result type for Trailmark operations
pub type Result<T> = std::result::Result<T, TrailmarkError>;

/// Error types for the episode recorder
#[derive(Debug, thiserror::Error)]
pub enum TrailmarkError {
    /// Persistence backend failed (unavailable, aborted write, ...)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Store refused the write because it is full
    #[error("Storage quota exceeded: {stored} episodes stored, limit is {limit}")]
    QuotaExceeded {
        /// Episodes already stored
        stored: usize,
        /// Configured limit
        limit: usize,
    },

    /// A stored record was written with a different schema version
    #[error("Schema mismatch: record {id} has schema version {found}, expected {expected}")]
    SchemaMismatch {
        /// Id of the offending record
        id: u64,
        /// Version found on disk
        found: u32,
        /// Version this reader understands
        expected: u32,
    },

    /// A stored line could not be parsed at all
    #[error("Corrupt record at line {line}: {reason}")]
    CorruptRecord {
        /// 1-indexed line number in the store file
        line: usize,
        /// Parser message
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Export could not be produced or delivered
    #[error("Export error: {0}")]
    Export(String),

    /// Operation attempted after the session was shut down
    #[error("Recorder is shut down")]
    Shutdown,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for TrailmarkError {
    fn from(s: String) -> Self {
        TrailmarkError::Other(s)
    }
}

impl From<&str> for TrailmarkError {
    fn from(s: &str) -> Self {
        TrailmarkError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for TrailmarkError {
    fn from(err: anyhow::Error) -> Self {
        TrailmarkError::Other(err.to_string())
    }
}
