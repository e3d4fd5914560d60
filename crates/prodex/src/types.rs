//! Normalized page data shared by every extraction strategy.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of image URLs kept on a [`PageRecord`].
pub const MAX_IMAGES: usize = 50;

/// Everything one successful acquisition attempt produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRecord {
    /// Requested URL.
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    pub title: Option<String>,
    pub price: Option<String>,
    pub sku: Option<String>,
    /// Non-empty, deduplicated, capped at [`MAX_IMAGES`].
    pub images: Vec<String>,
    /// Full page markup.
    pub raw_content: String,
    /// Discovered JSON blobs keyed by provenance tag, in discovery order.
    pub relevance_metadata: IndexMap<String, Value>,
    /// Elements exposing `data-*` attributes (full-browser strategy only).
    pub data_attributes: IndexMap<String, DataAttributeRecord>,
    /// Non-empty element text (full-browser strategy only).
    pub text_content: IndexMap<String, String>,
    pub meta: AcquisitionMeta,
}

/// How a [`PageRecord`] was obtained.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquisitionMeta {
    /// Extraction strategy name.
    pub strategy: String,
    /// IP strategy name actually used.
    pub ip_strategy: String,
    pub elapsed_ms: u64,
    pub user_agent: Option<String>,
}

/// `data-*` attributes of a single element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataAttributeRecord {
    pub tag: String,
    pub class: String,
    pub id: String,
    pub text: String,
    pub data: IndexMap<String, String>,
}

/// Trim, drop empties, deduplicate preserving first occurrence, and cap.
pub fn normalize_images<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: IndexSet<String> = IndexSet::new();
    for candidate in candidates {
        let url = candidate.as_ref().trim();
        if url.is_empty() {
            continue;
        }
        seen.insert(url.to_string());
        if seen.len() >= MAX_IMAGES {
            break;
        }
    }
    seen.into_iter().collect()
}

/// Turn an empty or whitespace-only string into `None`.
pub(crate) fn non_empty(text: impl AsRef<str>) -> Option<String> {
    let trimmed = text.as_ref().trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_images_dedups_and_drops_empty() {
        let images = normalize_images(["a.jpg", "", "  ", "b.jpg", "a.jpg", " c.jpg "]);
        assert_eq!(images, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_normalize_images_caps() {
        let many: Vec<String> = (0..200).map(|i| format!("https://cdn/{i}.jpg")).collect();
        let images = normalize_images(&many);
        assert_eq!(images.len(), MAX_IMAGES);
        assert_eq!(images[0], "https://cdn/0.jpg");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  x "), Some("x".to_string()));
        assert_eq!(non_empty("   "), None);
    }
}
