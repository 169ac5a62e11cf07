//! Data models for Quran content API responses
//!
//! The API uses its own field names (`surahNo`, `totalAyah`, `arabic1`, ...).
//! Models accept both those names and the camel-case names they serialize
//! to, and keep every field they do not know about in `extra` so that new
//! API fields pass through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Chapters
// ============================================================================

/// Where a chapter was revealed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RevelationPlace {
    #[serde(alias = "Mecca", alias = "Makkah", alias = "mecca", alias = "meccan")]
    Meccan,
    #[serde(
        alias = "Madina",
        alias = "Medina",
        alias = "Madinah",
        alias = "madina",
        alias = "medinan"
    )]
    Medinan,
}

impl RevelationPlace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meccan => "Meccan",
            Self::Medinan => "Medinan",
        }
    }
}

impl fmt::Display for RevelationPlace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the chapter index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    /// 1-based chapter number; assigned from the list position when the
    /// payload does not carry it
    #[serde(default, alias = "surahNo", alias = "surahNumber")]
    pub chapter_number: u32,
    #[serde(alias = "surahName")]
    pub name: String,
    #[serde(default, alias = "surahNameArabic")]
    pub name_arabic: String,
    pub revelation_place: RevelationPlace,
    #[serde(alias = "totalAyah", alias = "ayahCount")]
    pub verse_count: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChapterSummary {
    /// Decodes the chapter index payload
    pub fn list_from_value(value: Value) -> serde_json::Result<Vec<Self>> {
        let mut chapters: Vec<Self> = serde_json::from_value(value)?;
        for (index, chapter) in chapters.iter_mut().enumerate() {
            if chapter.chapter_number == 0 {
                chapter.chapter_number = index as u32 + 1;
            }
        }
        Ok(chapters)
    }

    /// English translation of the name, when the API provides one
    pub fn name_translation(&self) -> Option<&str> {
        self.extra.get("surahNameTranslation").and_then(Value::as_str)
    }
}

/// Descriptive record of a single chapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterMetadata {
    #[serde(default, alias = "surahNo", alias = "surahNumber")]
    pub chapter_number: u32,
    #[serde(alias = "totalAyah", alias = "ayahCount", alias = "verseCount")]
    pub total_verse_count: u32,
    #[serde(default, alias = "surahName")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChapterMetadata {
    /// Decodes a chapter metadata payload requested for `chapter`
    pub fn from_value(chapter: u32, value: Value) -> serde_json::Result<Self> {
        let mut metadata: Self = serde_json::from_value(value)?;
        if metadata.chapter_number == 0 {
            metadata.chapter_number = chapter;
        }
        Ok(metadata)
    }

    /// Display name, falling back to "Chapter N"
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Chapter {}", self.chapter_number))
    }
}

// ============================================================================
// Verses
// ============================================================================

/// One recitation of a verse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AudioVariant {
    #[serde(default)]
    pub reciter: String,
    pub url: String,
    #[serde(default)]
    pub original_url: Option<String>,
}

/// A single verse with its text and recitations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    #[serde(default, alias = "surahNo", alias = "surahNumber")]
    pub chapter_number: u32,
    #[serde(default, alias = "ayahNo", alias = "ayahNumber")]
    pub verse_number: u32,
    #[serde(default, alias = "arabic1", alias = "text")]
    pub arabic_text: String,
    #[serde(default, alias = "english")]
    pub translation_text: Option<String>,
    /// Reciter id to recitation
    #[serde(default, rename = "audio", alias = "audioVariants")]
    pub audio_variants: BTreeMap<String, AudioVariant>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Verse {
    /// Decodes a verse payload requested as `chapter:verse`
    ///
    /// The requested position wins over whatever the payload claims, so a
    /// verse is always filed where it was asked for.
    pub fn from_value(chapter: u32, verse: u32, value: Value) -> serde_json::Result<Self> {
        let mut decoded: Self = serde_json::from_value(value)?;

        let chapter_mismatch = decoded.chapter_number != 0 && decoded.chapter_number != chapter;
        let verse_mismatch = decoded.verse_number != 0 && decoded.verse_number != verse;
        if chapter_mismatch || verse_mismatch {
            tracing::warn!(
                "Payload for {}:{} claims to be {}:{}",
                chapter,
                verse,
                decoded.chapter_number,
                decoded.verse_number
            );
        }

        decoded.chapter_number = chapter;
        decoded.verse_number = verse;
        Ok(decoded)
    }

    /// Recitation URL for the given reciter id
    pub fn audio_url(&self, reciter: &str) -> Option<&str> {
        self.audio_variants.get(reciter).map(|a| a.url.as_str())
    }

    /// `chapter:verse` reference
    pub fn reference(&self) -> String {
        format!("{}:{}", self.chapter_number, self.verse_number)
    }
}
