//! Read-through cache of API payloads
//!
//! Content is static scripture, so entries never expire: once a resource has
//! been fetched it is served from the store until [`ContentCache::clear`].
//!
//! ```text
//! get(resource)
//!   ├─ store hit   ──────────────► parse ─► decode ─► value
//!   └─ store miss ─► source.fetch ─► decode ─► store.set (best effort) ─► value
//! ```
//!
//! Only payloads that decode into the requested model are stored. An entry
//! that stops decoding is refetched.

use crate::client::ContentSource;
use crate::error::Result;
use crate::models::{ChapterMetadata, ChapterSummary, Verse};
use crate::resource::Resource;
use quranstore::KeyValueStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cache of remote content backed by a persistent key-value store
#[derive(Clone)]
pub struct ContentCache {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn ContentSource>,
}

impl ContentCache {
    pub fn new(store: Arc<dyn KeyValueStore>, source: Arc<dyn ContentSource>) -> Self {
        Self { store, source }
    }

    /// The underlying store, shared with user data
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    /// Returns the JSON payload of `resource`, fetching it on a miss
    ///
    /// A store read failure or an unparsable entry counts as a miss. Fetch
    /// failures are returned and leave the store untouched.
    pub async fn get(&self, resource: &Resource) -> Result<Value> {
        self.get_decoded(resource, Ok).await
    }

    /// Read-through lookup that only keeps payloads `decode` accepts
    ///
    /// A stored entry that no longer decodes is a miss. A fetched payload
    /// that does not decode is returned as [`Error::Json`](crate::Error::Json)
    /// and never stored.
    async fn get_decoded<T, F>(&self, resource: &Resource, decode: F) -> Result<T>
    where
        F: Fn(Value) -> serde_json::Result<T>,
    {
        let key = resource.cache_key();

        match self.store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw).and_then(&decode) {
                Ok(decoded) => {
                    debug!("Cache hit for {}", resource);
                    return Ok(decoded);
                }
                Err(e) => warn!("Discarding unreadable cache entry {}: {}", key, e),
            },
            Ok(None) => debug!("Cache miss for {}", resource),
            Err(e) => warn!("Failed to read cache entry {}: {}", key, e),
        }

        let value = self.source.fetch(resource).await?;
        let raw = serde_json::to_string(&value);

        let decoded = decode(value).map_err(|e| {
            warn!("Unexpected payload for {}: {}", resource, e);
            e
        })?;

        match raw {
            Ok(raw) => {
                if let Err(e) = self.store.set(&key, &raw).await {
                    warn!("Failed to cache {}: {}", resource, e);
                }
            }
            Err(e) => warn!("Failed to serialize {} for caching: {}", resource, e),
        }

        Ok(decoded)
    }

    /// Chapter index
    pub async fn chapter_list(&self) -> Result<Vec<ChapterSummary>> {
        self.get_decoded(&Resource::ChapterList, ChapterSummary::list_from_value)
            .await
    }

    /// Metadata of one chapter
    pub async fn chapter_metadata(&self, chapter: u32) -> Result<ChapterMetadata> {
        self.get_decoded(&Resource::chapter_metadata(chapter), |value| {
            ChapterMetadata::from_value(chapter, value)
        })
        .await
    }

    /// One verse
    pub async fn verse(&self, chapter: u32, verse: u32) -> Result<Verse> {
        self.get_decoded(&Resource::verse(chapter, verse), |value| {
            Verse::from_value(chapter, verse, value)
        })
        .await
    }

    /// Removes every cached payload and returns how many were removed
    ///
    /// User data is left alone. Failures are logged and reported as zero
    /// removals.
    pub async fn clear(&self) -> usize {
        let keys = match self.store.list_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to list store keys: {}", e);
                return 0;
            }
        };

        let cached: Vec<String> = keys
            .into_iter()
            .filter(|key| Resource::is_cache_key(key))
            .collect();

        if cached.is_empty() {
            return 0;
        }

        match self.store.remove_all(&cached).await {
            Ok(removed) => {
                info!("Cleared {} cache entries", removed);
                removed
            }
            Err(e) => {
                warn!("Failed to clear cache: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use quranstore::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentSource for CountingSource {
        async fn fetch(&self, resource: &Resource) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match resource {
                Resource::Verse { chapter: 9, .. } => Err(Error::status("verse", 500)),
                Resource::Verse { chapter, verse } => {
                    Ok(json!({"arabic1": format!("{}:{}", chapter, verse)}))
                }
                Resource::ChapterMetadata { .. } => Ok(json!({"totalAyah": 7})),
                Resource::ChapterList => Ok(json!([])),
            }
        }
    }

    fn cache() -> (ContentCache, Arc<CountingSource>, Arc<MemoryStore>) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(MemoryStore::new());
        (
            ContentCache::new(store.clone(), source.clone()),
            source,
            store,
        )
    }

    #[tokio::test]
    async fn test_second_get_is_served_from_store() {
        let (cache, source, _) = cache();

        let first = cache.get(&Resource::verse(1, 2)).await.unwrap();
        let second = cache.get(&Resource::verse(1, 2)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let (cache, source, store) = cache();

        assert!(cache.verse(9, 1).await.is_err());
        assert!(cache.verse(9, 1).await.is_err());

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_refetched() {
        let (cache, source, store) = cache();
        store.set("cached_surah_1_metadata", "{not json").await.unwrap();

        let metadata = cache.chapter_metadata(1).await.unwrap();

        assert_eq!(metadata.total_verse_count, 7);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let repaired = store.get("cached_surah_1_metadata").await.unwrap().unwrap();
        assert!(serde_json::from_str::<Value>(&repaired).is_ok());
    }

    #[tokio::test]
    async fn test_clear_keeps_user_data() {
        let (cache, _, store) = cache();
        cache.verse(1, 1).await.unwrap();
        cache.chapter_metadata(1).await.unwrap();
        cache.chapter_list().await.unwrap();
        store.set("bookmarks", "[]").await.unwrap();
        store.set("lastRead", "null").await.unwrap();

        assert_eq!(cache.clear().await, 3);

        let keys = store.list_keys().await.unwrap();
        assert_eq!(keys, vec!["bookmarks".to_string(), "lastRead".to_string()]);
        assert_eq!(cache.clear().await, 0);
    }

    /// Answers metadata with an error body first, then with a real payload
    struct FlakySource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentSource for FlakySource {
        async fn fetch(&self, _resource: &Resource) -> Result<Value> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(json!({"error": "temporarily unavailable"}))
            } else {
                Ok(json!({"totalAyah": 7}))
            }
        }
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_not_cached() {
        let source = Arc::new(FlakySource {
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(MemoryStore::new());
        let cache = ContentCache::new(store.clone(), source.clone());

        let err = cache.chapter_metadata(1).await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(store.is_empty().await);

        // The next call goes back to the source and heals
        let metadata = cache.chapter_metadata(1).await.unwrap();
        assert_eq!(metadata.total_verse_count, 7);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.len().await, 1);

        // Now served from the store
        cache.chapter_metadata(1).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_entry_of_wrong_shape_is_refetched() {
        let (cache, source, store) = cache();
        store
            .set("cached_surah_1_metadata", r#"{"error":"temporarily unavailable"}"#)
            .await
            .unwrap();

        let metadata = cache.chapter_metadata(1).await.unwrap();

        assert_eq!(metadata.total_verse_count, 7);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let repaired = store.get("cached_surah_1_metadata").await.unwrap().unwrap();
        assert!(repaired.contains("totalAyah"));
    }
}
