//! Error types for the Quran content client, cache and loader

/// Result type alias for Quran content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when fetching, caching or loading content
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed (transport, timeout, connection)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status
    #[error("API returned status {status} for {url}")]
    Status { url: String, status: u16 },

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Persistent store failure
    #[error("Store error: {0}")]
    Store(#[from] quranstore::StoreError),

    /// At least one verse of a batch could not be fetched
    #[error("Failed to load verses {first}-{last} of chapter {chapter}: {source}")]
    BatchLoad {
        chapter: u32,
        first: u32,
        last: u32,
        #[source]
        source: Box<Error>,
    },

    /// Chapter numbers start at 1
    #[error("Invalid chapter number: {0}")]
    InvalidChapter(u32),

    /// Configuration error (from quranconfig/anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a status error
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// `true` for failures of the remote content API: transport, non-success
    /// status or unparsable body
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::Json(_) | Self::InvalidUrl(_)
        )
    }

    /// `true` when a verse batch failed and the loader waits for a retry
    pub fn is_batch_load(&self) -> bool {
        matches!(self, Self::BatchLoad { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let status = Error::status("https://example.org/1.json", 404);
        assert!(status.is_network());
        assert!(!status.is_batch_load());

        let batch = Error::BatchLoad {
            chapter: 2,
            first: 11,
            last: 20,
            source: Box::new(status),
        };
        assert!(batch.is_batch_load());
        assert!(!batch.is_network());
        assert_eq!(
            batch.to_string(),
            "Failed to load verses 11-20 of chapter 2: API returned status 404 for https://example.org/1.json"
        );
    }
}
