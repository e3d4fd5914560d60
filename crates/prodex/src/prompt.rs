//! Bounded text payload for the downstream extraction call.

use crate::relevance::{extract_sections, format_for_prompt, truncate_to_budget, JsonSection};
use crate::types::PageRecord;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Write as _;
use tracing::debug;

/// Images listed among the selector hints.
const HINT_IMAGES: usize = 5;

const INSTRUCTIONS: &str = "\
Extract as much product information as possible. Focus on:
- Product title, brand, price
- Available sizes, colors, variants
- Product images
- Product description and features
- Categories and breadcrumbs
- Reviews and ratings
- Product identifiers (UPC, EAN, etc.)
- Package dimensions and weight

Only include fields that you can confidently extract from the data. If a field is not available, omit it rather than guessing.";

/// What the prompt body was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Scored JSON sections plus selector hints.
    RelevantJson,
    /// A prefix of the page markup.
    RawMarkup,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssembledPrompt {
    pub text: String,
    pub framing: Framing,
    /// Sections included in `text`; empty for raw markup.
    pub sections: Vec<JsonSection>,
    pub was_truncated: bool,
    /// Token estimate of the sections before budgeting.
    pub original_tokens: usize,
}

/// Limits applied when assembling a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptAssembler {
    pub max_json_tokens: usize,
    pub max_markup_chars: usize,
    pub max_depth: usize,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self {
            max_json_tokens: 8000,
            max_markup_chars: 15_000,
            max_depth: crate::relevance::DEFAULT_MAX_DEPTH,
        }
    }
}

impl PromptAssembler {
    pub fn with_budget(mut self, max_json_tokens: usize) -> Self {
        self.max_json_tokens = max_json_tokens;
        self
    }

    pub fn assemble(&self, record: &PageRecord) -> AssembledPrompt {
        let combined: Map<String, Value> = record
            .relevance_metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let sections = extract_sections(&Value::Object(combined), self.max_depth);
        let budget = truncate_to_budget(sections, self.max_json_tokens);

        if budget.sections.is_empty() {
            debug!(url = %record.url, "no relevant JSON, framing raw markup");
            return AssembledPrompt {
                text: self.raw_markup_text(record),
                framing: Framing::RawMarkup,
                sections: Vec::new(),
                was_truncated: budget.was_truncated,
                original_tokens: budget.original_tokens,
            };
        }

        debug!(
            url = %record.url,
            sections = budget.sections.len(),
            truncated = budget.was_truncated,
            "framing relevant JSON"
        );
        AssembledPrompt {
            text: relevant_json_text(record, &budget.sections),
            framing: Framing::RelevantJson,
            sections: budget.sections,
            was_truncated: budget.was_truncated,
            original_tokens: budget.original_tokens,
        }
    }

    fn raw_markup_text(&self, record: &PageRecord) -> String {
        let markup: String = record.raw_content.chars().take(self.max_markup_chars).collect();
        format!(
            "Extract product information from this ecommerce page HTML.\n\nURL: {}\n\nHTML Content:\n{}\n\n{}",
            record.url, markup, INSTRUCTIONS
        )
    }
}

fn relevant_json_text(record: &PageRecord, sections: &[JsonSection]) -> String {
    let mut text = format!(
        "Extract product information from this ecommerce page's embedded data.\n\nURL: {}\n\n",
        record.url
    );

    let mut hints = String::new();
    for (label, value) in [
        ("Title", &record.title),
        ("Price", &record.price),
        ("SKU", &record.sku),
    ] {
        if let Some(value) = value {
            let _ = writeln!(hints, "- {label}: {value}");
        }
    }
    if !record.images.is_empty() {
        let images: Vec<&str> = record
            .images
            .iter()
            .take(HINT_IMAGES)
            .map(String::as_str)
            .collect();
        let _ = writeln!(hints, "- Images: {}", images.join(", "));
    }
    if !hints.is_empty() {
        text.push_str("Page hints:\n");
        text.push_str(&hints);
        text.push('\n');
    }

    text.push_str(&format_for_prompt(sections));
    text.push_str(INSTRUCTIONS);
    text
}
