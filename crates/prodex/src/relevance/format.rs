use super::JsonSection;
use std::fmt::Write as _;

/// Text returned when there is nothing to format.
pub const EMPTY_MESSAGE: &str = "No relevant JSON data found.";

/// Render sections as the text block handed to the downstream extractor.
pub fn format_for_prompt(sections: &[JsonSection]) -> String {
    if sections.is_empty() {
        return EMPTY_MESSAGE.to_string();
    }

    let mut out = String::from("RELEVANT JSON DATA (sorted by relevance):\n\n");
    for (i, section) in sections.iter().enumerate() {
        let tags: Vec<String> = section.relevance.iter().map(ToString::to_string).collect();
        let data = serde_json::to_string_pretty(&section.data).unwrap_or_default();
        let _ = write!(
            out,
            "=== SECTION {} (Score: {}) ===\nPath: {}\nRelevance: {}\nData:\n{}\n\n",
            i + 1,
            section.score,
            section.path,
            tags.join(", "),
            data
        );
    }
    out
}

/// Rough token count: one token per four characters of formatted output.
pub fn estimate_tokens(sections: &[JsonSection]) -> usize {
    format_for_prompt(sections).chars().count().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relevance::{RelevanceTag, Tier};
    use serde_json::json;

    fn section() -> JsonSection {
        JsonSection {
            path: "structured_0.offers".to_string(),
            data: json!({"price": 12}),
            score: 17,
            relevance: vec![
                RelevanceTag::new(Tier::High, "price"),
                RelevanceTag::new(Tier::Low, "structured"),
            ],
        }
    }

    #[test]
    fn test_format_layout() {
        let text = format_for_prompt(&[section()]);
        let expected = "RELEVANT JSON DATA (sorted by relevance):\n\n\
                        === SECTION 1 (Score: 17) ===\n\
                        Path: structured_0.offers\n\
                        Relevance: high:price, low:structured\n\
                        Data:\n{\n  \"price\": 12\n}\n\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty() {
        assert_eq!(format_for_prompt(&[]), EMPTY_MESSAGE);
        assert_eq!(estimate_tokens(&[]), EMPTY_MESSAGE.len().div_ceil(4));
    }

    #[test]
    fn test_estimate_rounds_up() {
        let text = format_for_prompt(&[section()]);
        let tokens = estimate_tokens(&[section()]);
        assert!(tokens * 4 >= text.chars().count());
        assert!((tokens - 1) * 4 < text.chars().count());
    }
}
