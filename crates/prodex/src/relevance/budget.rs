//! Token budgeting with per-section pruning.
//!
//! Sections are admitted greedily in the order given. A section that does not
//! fit is replaced by a pruned copy: long arrays are capped by what they hold
//! and deeply nested objects collapse to their identifying fields.

use super::format::estimate_tokens;
use super::keywords::{contains_any, IMPORTANT_FIELDS};
use super::JsonSection;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Object nesting kept intact by pruning.
pub const COLLAPSE_DEPTH: i32 = 2;

/// Result of fitting sections into a token ceiling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetOutcome {
    pub sections: Vec<JsonSection>,
    pub was_truncated: bool,
    /// Estimate of the input before any pruning.
    pub original_tokens: usize,
}

/// Fit `sections` into `max_tokens`.
///
/// When the input already fits it is returned unchanged. Otherwise the
/// formatted estimate of the result is at most `max_tokens` unless the result
/// is empty.
pub fn truncate_to_budget(sections: Vec<JsonSection>, max_tokens: usize) -> BudgetOutcome {
    let original_tokens = estimate_tokens(&sections);
    if original_tokens <= max_tokens {
        return BudgetOutcome {
            sections,
            was_truncated: false,
            original_tokens,
        };
    }

    let mut admitted: Vec<JsonSection> = Vec::with_capacity(sections.len());
    for section in sections {
        admitted.push(section);
        if estimate_tokens(&admitted) <= max_tokens {
            continue;
        }

        let Some(section) = admitted.pop() else {
            break;
        };
        admitted.push(prune(&section));
        if estimate_tokens(&admitted) <= max_tokens {
            debug!(path = %section.path, "admitted pruned section");
            continue;
        }

        admitted.pop();
        debug!(path = %section.path, "section skipped, over budget even when pruned");
    }

    BudgetOutcome {
        sections: admitted,
        was_truncated: true,
        original_tokens,
    }
}

/// Pruned copy of a section: arrays capped, deep objects collapsed.
pub fn prune(section: &JsonSection) -> JsonSection {
    let root_key = last_segment(&section.path);
    let capped = cap_arrays(&section.data, root_key);
    JsonSection {
        path: section.path.clone(),
        data: collapse(&capped, COLLAPSE_DEPTH),
        score: section.score,
        relevance: section.relevance.clone(),
    }
}

/// Maximum kept length for an array stored under `key`.
pub fn array_cap(key: &str) -> usize {
    let key = key.to_lowercase();
    if contains_any(&key, &["review", "comment", "feedback", "question"]) {
        3
    } else if contains_any(&key, &["image", "gallery", "media", "photo"]) {
        10
    } else if contains_any(&key, &["variant", "offer", "sku", "option"]) {
        25
    } else {
        15
    }
}

fn last_segment(path: &str) -> &str {
    let tail = path.rsplit('.').next().unwrap_or(path);
    tail.split('[').next().unwrap_or(tail)
}

fn cap_arrays(value: &Value, key: &str) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .take(array_cap(key))
                .map(|item| cap_arrays(item, key))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), cap_arrays(v, k)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

fn collapse(value: &Value, remaining: i32) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| collapse(item, remaining - 1))
                .collect(),
        ),
        Value::Object(map) if remaining <= 0 => project(map),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), collapse(v, remaining - 1)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

fn project(map: &Map<String, Value>) -> Value {
    let mut kept = Map::new();
    for (key, value) in map {
        if !contains_any(&key.to_lowercase(), IMPORTANT_FIELDS) {
            continue;
        }
        let value = match value {
            Value::Object(_) | Value::Array(_) => Value::String("[Object]".to_string()),
            scalar => scalar.clone(),
        };
        kept.insert(key.clone(), value);
    }
    if kept.is_empty() {
        Value::String("[Complex Object]".to_string())
    } else {
        Value::Object(kept)
    }
}
