//! Error types for the key-value store

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur when reading or writing the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Key cannot be stored
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// Stored bytes are not valid UTF-8
    #[error("Value for key '{0}' is not valid UTF-8")]
    InvalidValue(String),
}

impl StoreError {
    pub(crate) fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }
}
