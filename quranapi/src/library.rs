//! Reader's personal data: bookmarks, favorites and last-read position
//!
//! These live in the same store as the content cache but under keys without
//! the cache prefix, so clearing the cache never touches them:
//!
//! | key         | value                      |
//! |-------------|----------------------------|
//! | `bookmarks` | JSON array of [`Bookmark`] |
//! | `favorites` | JSON array of [`ChapterSummary`] |
//! | `lastRead`  | JSON [`LastRead`]          |
//!
//! [`Favorites`] is a shared state object: every change is persisted and
//! then announced to subscribers.

use crate::error::Result;
use crate::models::{ChapterSummary, Verse};
use quranstore::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub const BOOKMARKS_KEY: &str = "bookmarks";
pub const FAVORITES_KEY: &str = "favorites";
pub const LAST_READ_KEY: &str = "lastRead";

/// A bookmarked verse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// `"<chapter>-<verse>"`
    pub key: String,
    #[serde(alias = "surahNumber")]
    pub chapter_number: u32,
    #[serde(default, alias = "surahName")]
    pub chapter_name: String,
    #[serde(alias = "ayahNumber")]
    pub verse_number: u32,
    #[serde(default)]
    pub text: String,
}

impl Bookmark {
    pub fn key_for(chapter: u32, verse: u32) -> String {
        format!("{}-{}", chapter, verse)
    }

    pub fn from_verse(verse: &Verse, chapter_name: impl Into<String>) -> Self {
        Self {
            key: Self::key_for(verse.chapter_number, verse.verse_number),
            chapter_number: verse.chapter_number,
            chapter_name: chapter_name.into(),
            verse_number: verse.verse_number,
            text: verse.arabic_text.clone(),
        }
    }
}

/// Where the reader stopped
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LastRead {
    #[serde(alias = "surahNumber")]
    pub chapter_number: u32,
    #[serde(default, alias = "surahName")]
    pub chapter_name: String,
    #[serde(alias = "ayahNumber")]
    pub verse_number: u32,
    #[serde(alias = "totalAyahs")]
    pub total_verses: u32,
}

impl LastRead {
    /// Reading progress through the chapter, in `[0, 1]`
    pub fn progress(&self) -> f32 {
        if self.total_verses == 0 {
            return 0.0;
        }
        (self.verse_number as f32 / self.total_verses as f32).clamp(0.0, 1.0)
    }
}

async fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!("Ignoring unreadable {} entry: {}", key, e);
            Ok(None)
        }
    }
}

async fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await?;
    Ok(())
}

/// Access to bookmarks, last-read position and favorites
#[derive(Clone)]
pub struct Library {
    store: Arc<dyn KeyValueStore>,
}

impl Library {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Bookmarks
    // ========================================================================

    /// Bookmarks, oldest first
    pub async fn bookmarks(&self) -> Result<Vec<Bookmark>> {
        Ok(load_json(self.store.as_ref(), BOOKMARKS_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn is_bookmarked(&self, chapter: u32, verse: u32) -> Result<bool> {
        let key = Bookmark::key_for(chapter, verse);
        Ok(self.bookmarks().await?.iter().any(|b| b.key == key))
    }

    /// Adds the verse to the bookmarks, or removes it if already there
    ///
    /// Returns `true` when the verse is bookmarked afterwards.
    pub async fn toggle_bookmark(&self, verse: &Verse, chapter_name: &str) -> Result<bool> {
        let mut bookmarks = self.bookmarks().await?;
        let key = Bookmark::key_for(verse.chapter_number, verse.verse_number);

        let added = match bookmarks.iter().position(|b| b.key == key) {
            Some(index) => {
                bookmarks.remove(index);
                false
            }
            None => {
                bookmarks.push(Bookmark::from_verse(verse, chapter_name));
                true
            }
        };

        save_json(self.store.as_ref(), BOOKMARKS_KEY, &bookmarks).await?;
        debug!("Bookmark {} {}", key, if added { "added" } else { "removed" });
        Ok(added)
    }

    /// Removes a bookmark by key, returns `true` if it existed
    pub async fn remove_bookmark(&self, key: &str) -> Result<bool> {
        let mut bookmarks = self.bookmarks().await?;
        let before = bookmarks.len();
        bookmarks.retain(|b| b.key != key);

        if bookmarks.len() == before {
            return Ok(false);
        }
        save_json(self.store.as_ref(), BOOKMARKS_KEY, &bookmarks).await?;
        Ok(true)
    }

    // ========================================================================
    // Last read
    // ========================================================================

    pub async fn last_read(&self) -> Result<Option<LastRead>> {
        load_json(self.store.as_ref(), LAST_READ_KEY).await
    }

    pub async fn save_last_read(&self, last_read: &LastRead) -> Result<()> {
        save_json(self.store.as_ref(), LAST_READ_KEY, last_read).await
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    /// Loads the favorites state object
    pub async fn favorites(&self) -> Result<Favorites> {
        Favorites::load(self.store.clone()).await
    }
}

/// Callback invoked with the favorites after every change
pub type FavoritesCallback = Arc<dyn Fn(&[ChapterSummary]) + Send + Sync>;

/// Favorite chapters, persisted on every change
///
/// Cloning shares the same state and subscribers.
#[derive(Clone)]
pub struct Favorites {
    store: Arc<dyn KeyValueStore>,
    chapters: Arc<RwLock<Vec<ChapterSummary>>>,
    subscribers: Arc<RwLock<Vec<FavoritesCallback>>>,
}

impl Favorites {
    /// Reads the persisted favorites; a missing or unreadable entry yields
    /// an empty list
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let chapters: Vec<ChapterSummary> = load_json(store.as_ref(), FAVORITES_KEY)
            .await?
            .unwrap_or_default();

        Ok(Self {
            store,
            chapters: Arc::new(RwLock::new(chapters)),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        })
    }

    pub async fn list(&self) -> Vec<ChapterSummary> {
        self.chapters.read().await.clone()
    }

    pub async fn contains(&self, chapter_number: u32) -> bool {
        self.chapters
            .read()
            .await
            .iter()
            .any(|c| c.chapter_number == chapter_number)
    }

    /// Adds a chapter, returns `false` if it was already a favorite
    pub async fn add(&self, chapter: ChapterSummary) -> bool {
        {
            let mut chapters = self.chapters.write().await;
            if chapters
                .iter()
                .any(|c| c.chapter_number == chapter.chapter_number)
            {
                return false;
            }
            chapters.push(chapter);
        }
        self.changed().await;
        true
    }

    /// Removes a chapter, returns `false` if it was not a favorite
    pub async fn remove(&self, chapter_number: u32) -> bool {
        {
            let mut chapters = self.chapters.write().await;
            let before = chapters.len();
            chapters.retain(|c| c.chapter_number != chapter_number);
            if chapters.len() == before {
                return false;
            }
        }
        self.changed().await;
        true
    }

    /// Adds or removes a chapter, returns `true` when it is a favorite
    /// afterwards
    pub async fn toggle(&self, chapter: ChapterSummary) -> bool {
        if self.remove(chapter.chapter_number).await {
            false
        } else {
            self.add(chapter).await
        }
    }

    /// Registers a callback called after every change
    pub async fn subscribe(&self, callback: FavoritesCallback) {
        self.subscribers.write().await.push(callback);
    }

    async fn changed(&self) {
        let snapshot = self.list().await;

        if let Err(e) = save_json(self.store.as_ref(), FAVORITES_KEY, &snapshot).await {
            warn!("Failed to persist favorites: {}", e);
        }

        let callbacks: Vec<_> = {
            let subscribers = self.subscribers.read().await;
            subscribers.clone()
        };
        for callback in callbacks.iter() {
            callback(snapshot.as_slice());
        }
    }
}
