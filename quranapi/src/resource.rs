//! The three content resources and their cache keys
//!
//! Every cache key starts with [`CACHE_PREFIX`]. User data stored next to
//! the cache (bookmarks, favorites, last-read) never uses that prefix, which
//! is what lets [`ContentCache::clear`](crate::ContentCache::clear) wipe the
//! cache without touching it.

use std::fmt;

/// Prefix reserved for cache entries in the shared store
pub const CACHE_PREFIX: &str = "cached_";

/// A content resource of the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Index of all chapters
    ChapterList,
    /// Metadata of one chapter
    ChapterMetadata { chapter: u32 },
    /// One verse
    Verse { chapter: u32, verse: u32 },
}

impl Resource {
    pub fn chapter_metadata(chapter: u32) -> Self {
        Self::ChapterMetadata { chapter }
    }

    pub fn verse(chapter: u32, verse: u32) -> Self {
        Self::Verse { chapter, verse }
    }

    /// Key of this resource in the store
    ///
    /// Each kind has its own shape (`surah_list`, `surah_N_metadata`,
    /// `ayah_N_M`), so keys never collide across kinds.
    pub fn cache_key(&self) -> String {
        match self {
            Self::ChapterList => format!("{}surah_list", CACHE_PREFIX),
            Self::ChapterMetadata { chapter } => {
                format!("{}surah_{}_metadata", CACHE_PREFIX, chapter)
            }
            Self::Verse { chapter, verse } => format!("{}ayah_{}_{}", CACHE_PREFIX, chapter, verse),
        }
    }

    /// Path of this resource relative to the API base URL
    pub fn path(&self) -> String {
        match self {
            Self::ChapterList => "surah.json".to_string(),
            Self::ChapterMetadata { chapter } => format!("{}.json", chapter),
            Self::Verse { chapter, verse } => format!("{}/{}.json", chapter, verse),
        }
    }

    /// `true` if `key` belongs to the cache
    pub fn is_cache_key(key: &str) -> bool {
        key.starts_with(CACHE_PREFIX)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChapterList => write!(f, "chapter list"),
            Self::ChapterMetadata { chapter } => write!(f, "chapter {} metadata", chapter),
            Self::Verse { chapter, verse } => write!(f, "verse {}:{}", chapter, verse),
        }
    }
}
