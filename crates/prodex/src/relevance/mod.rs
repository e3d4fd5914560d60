//! JSON relevance engine.
//!
//! Pure functions that rank arbitrary nested JSON by how much product data it
//! carries, strip what a downstream extractor does not need, and fit the
//! result into a token budget. Nothing here performs I/O.

pub mod budget;
pub mod format;
pub mod keywords;
pub mod sanitize;
pub mod score;
pub mod sections;

pub use budget::{prune, truncate_to_budget, BudgetOutcome};
pub use format::{estimate_tokens, format_for_prompt};
pub use keywords::Tier;
pub use sanitize::sanitize;
pub use score::score;
pub use sections::extract_sections;

use crate::error::MalformedDataError;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Default walk depth for [`extract_sections`].
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Maximum number of sections [`extract_sections`] returns.
pub const MAX_SECTIONS: usize = 10;

/// A scored subtree of the input document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSection {
    /// Dotted and indexed locator, e.g. `structured_0.offers[2]`.
    pub path: String,
    /// Sanitized subtree.
    pub data: Value,
    pub score: i64,
    /// Matched keywords, grouped high to negative.
    pub relevance: Vec<RelevanceTag>,
}

/// A keyword that contributed to a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelevanceTag {
    pub tier: Tier,
    pub keyword: String,
}

impl RelevanceTag {
    pub fn new(tier: Tier, keyword: impl Into<String>) -> Self {
        Self {
            tier,
            keyword: keyword.into(),
        }
    }
}

impl std::fmt::Display for RelevanceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.tier, self.keyword)
    }
}

/// Parse a JSON document.
pub fn parse(text: &str) -> Result<Value, MalformedDataError> {
    Ok(serde_json::from_str(text)?)
}

/// Parse and extract sections, treating malformed input as "nothing relevant".
pub fn analyze_raw(text: &str, max_depth: usize) -> Vec<JsonSection> {
    match parse(text) {
        Ok(value) => extract_sections(&value, max_depth),
        Err(e) => {
            debug!("ignoring relevance input: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_raw_malformed_is_empty() {
        assert!(analyze_raw("{not json", DEFAULT_MAX_DEPTH).is_empty());
        assert!(analyze_raw("", DEFAULT_MAX_DEPTH).is_empty());
    }

    #[test]
    fn test_analyze_raw_valid() {
        let sections = analyze_raw(r#"{"p": {"sku": "X1", "price": 3}}"#, DEFAULT_MAX_DEPTH);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].path, "p");
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(RelevanceTag::new(Tier::Medium, "rating").to_string(), "medium:rating");
    }
}
