//! Quran content library for Quran Reader
//!
//! This crate fetches Quran text from a public read-only JSON API, keeps
//! every payload in a persistent local cache, and loads the verses of a
//! chapter incrementally as the reader scrolls.
//!
//! # Features
//!
//! - **Remote client**: chapter index, chapter metadata and single verses
//!   ([`QuranClient`])
//! - **Read-through cache**: payloads are fetched once and served from the
//!   store afterwards, with no expiry ([`ContentCache`])
//! - **Incremental loading**: verses arrive in batches of concurrent
//!   requests, with a pause-and-retry state on failure ([`VerseLoader`])
//! - **Library**: bookmarks, favorites and last-read position ([`Library`])
//! - **Search and audio**: chapter search and verse recitation URLs
//! - **Configuration extension**: settings stored in quranconfig
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use quranapi::{ContentCache, QuranClient, VerseLoader};
//! use quranstore::FileStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileStore::new(".quran/store")?);
//!     let client = Arc::new(QuranClient::new().await?);
//!     let cache = ContentCache::new(store, client);
//!
//!     let loader = VerseLoader::new(cache, 36);
//!     loader.start().await?;
//!     while loader.state() == quranapi::LoaderState::Idle {
//!         loader.load_next_batch().await?;
//!     }
//!
//!     for verse in loader.verses() {
//!         println!("{} {}", verse.reference(), verse.arabic_text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Configuration Extension
//!
//! With the `quranconfig` feature (on by default), [`QuranConfigExt`] reads
//! the API, loader, store and audio settings from the global configuration:
//!
//! ```no_run
//! use quranconfig::get_config;
//! use quranapi::QuranConfigExt;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! let client = config.quran_client_builder()?.build().await?;
//! println!("Store in {}", config.get_store_dir()?);
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod cache;
pub mod client;
pub mod error;
pub mod library;
pub mod loader;
pub mod models;
pub mod resource;
pub mod search;

#[cfg(feature = "quranconfig")]
pub mod config_ext;

pub use audio::{DEFAULT_AUDIO_CDN, cdn_audio_url, verse_audio_url};
pub use cache::ContentCache;
pub use client::{ClientBuilder, ContentSource, QuranClient};
pub use error::{Error, Result};
pub use library::{Bookmark, Favorites, FavoritesCallback, LastRead, Library};
pub use loader::{LoadOutcome, LoaderState, VerseLoader};
pub use models::{AudioVariant, ChapterMetadata, ChapterSummary, RevelationPlace, Verse};
pub use resource::{CACHE_PREFIX, Resource};
pub use search::search_chapters;

#[cfg(feature = "quranconfig")]
pub use config_ext::QuranConfigExt;
