//! Verse recitation URLs

use crate::models::Verse;

/// Default recitation CDN (Mishary Alafasy, 128 kbps)
pub const DEFAULT_AUDIO_CDN: &str = "https://cdn.islamic.network/quran/audio/128/ar.alafasy";

/// Default reciter id in the API's audio variants
pub const DEFAULT_RECITER: &str = "1";

/// CDN URL of a verse: `{cdn}/{CCC}{VVV}.mp3`
pub fn cdn_audio_url(cdn_base_url: &str, chapter: u32, verse: u32) -> String {
    format!(
        "{}/{:03}{:03}.mp3",
        cdn_base_url.trim_end_matches('/'),
        chapter,
        verse
    )
}

/// Playback URL of a verse
///
/// The API's recitation for `reciter` when the verse has one, the CDN
/// otherwise.
pub fn verse_audio_url(verse: &Verse, reciter: &str, cdn_base_url: &str) -> String {
    match verse.audio_url(reciter) {
        Some(url) => url.to_string(),
        None => cdn_audio_url(cdn_base_url, verse.chapter_number, verse.verse_number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cdn_url_is_zero_padded() {
        assert_eq!(
            cdn_audio_url(DEFAULT_AUDIO_CDN, 2, 255),
            "https://cdn.islamic.network/quran/audio/128/ar.alafasy/002255.mp3"
        );
        assert_eq!(
            cdn_audio_url("https://cdn.example.org/", 114, 6),
            "https://cdn.example.org/114006.mp3"
        );
    }

    #[test]
    fn test_api_variant_wins() {
        let verse = Verse::from_value(
            1,
            1,
            json!({"audio": {"1": {"reciter": "Alafasy", "url": "https://api.example.org/1_1.mp3"}}}),
        )
        .unwrap();

        assert_eq!(
            verse_audio_url(&verse, "1", DEFAULT_AUDIO_CDN),
            "https://api.example.org/1_1.mp3"
        );
        assert_eq!(
            verse_audio_url(&verse, "3", DEFAULT_AUDIO_CDN),
            format!("{}/001001.mp3", DEFAULT_AUDIO_CDN)
        );
    }
}
