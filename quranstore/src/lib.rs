//! Persistent key-value store for Quran Reader
//!
//! The reader keeps two kinds of data in the same store:
//! - cached API payloads (keys prefixed with `cached_`)
//! - user data (bookmarks, favorites, last-read position, theme)
//!
//! The store itself knows nothing about those conventions: it maps string
//! keys to string values (JSON documents in practice), survives process
//! restarts, and offers no transactions and no expiry.
//!
//! Two implementations are provided:
//! - [`FileStore`]: one file per key in a directory, atomic single-key writes
//! - [`MemoryStore`]: in-process map, for tests and ephemeral sessions
//!
//! # Example
//!
//! ```rust,no_run
//! use quranstore::{FileStore, KeyValueStore};
//!
//! # #[tokio::main]
//! # async fn main() -> quranstore::Result<()> {
//! let store = FileStore::new(".quran/store")?;
//! store.set("lastRead", r#"{"chapterNumber":1}"#).await?;
//! assert!(store.get("lastRead").await?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod file;
pub mod memory;

use async_trait::async_trait;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;

/// String-keyed blob storage
///
/// Implementations provide atomic single-key reads and writes. There is no
/// cross-key transaction: `remove_all` may stop half way on error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes every listed key and returns how many were present
    async fn remove_all(&self, keys: &[String]) -> Result<usize>;

    /// Lists every key currently stored
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Removes a single key, returns `true` if it was present
    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.remove_all(&[key.to_string()]).await? > 0)
    }
}
