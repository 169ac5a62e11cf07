//! Chapter search

use crate::models::ChapterSummary;

/// Chapters matching `query`
///
/// A chapter matches when its name contains the query (case-insensitive),
/// its Arabic name contains it, or its number equals it. A blank query
/// matches nothing.
pub fn search_chapters<'a>(chapters: &'a [ChapterSummary], query: &str) -> Vec<&'a ChapterSummary> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let lowered = query.to_lowercase();
    let number = query.parse::<u32>().ok();

    chapters
        .iter()
        .filter(|chapter| {
            chapter.name.to_lowercase().contains(&lowered)
                || chapter.name_arabic.contains(query)
                || number == Some(chapter.chapter_number)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chapters() -> Vec<ChapterSummary> {
        ChapterSummary::list_from_value(json!([
            {"surahName": "Al-Faatiha", "surahNameArabic": "الفاتحة", "revelationPlace": "Mecca", "totalAyah": 7},
            {"surahName": "Al-Baqara", "surahNameArabic": "البقرة", "revelationPlace": "Madina", "totalAyah": 286},
            {"surahName": "Aal-i-Imraan", "surahNameArabic": "آل عمران", "revelationPlace": "Madina", "totalAyah": 200}
        ]))
        .unwrap()
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let chapters = chapters();
        assert!(search_chapters(&chapters, "").is_empty());
        assert!(search_chapters(&chapters, "   ").is_empty());
    }

    #[test]
    fn test_name_is_case_insensitive() {
        let chapters = chapters();
        let found = search_chapters(&chapters, "BAQ");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].chapter_number, 2);

        assert_eq!(search_chapters(&chapters, "al-").len(), 3);
    }

    #[test]
    fn test_arabic_and_number() {
        let chapters = chapters();
        assert_eq!(search_chapters(&chapters, "عمران")[0].chapter_number, 3);

        let by_number = search_chapters(&chapters, " 1 ");
        assert_eq!(by_number.len(), 1);
        assert_eq!(by_number[0].name, "Al-Faatiha");
    }
}
