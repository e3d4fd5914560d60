use super::sanitize::sanitize;
use super::score::assess;
use super::{JsonSection, MAX_SECTIONS};
use serde_json::Value;

/// Score every container node down to `max_depth` and keep the best.
///
/// Top-level keys sit at depth 1. Only objects and arrays are scored, and
/// only those with a strictly positive score become sections. Ties keep
/// discovery order.
pub fn extract_sections(json: &Value, max_depth: usize) -> Vec<JsonSection> {
    let mut found = Vec::new();
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                walk(key.clone(), value, 1, max_depth, &mut found);
            }
        }
        Value::Array(items) => {
            for (i, value) in items.iter().enumerate() {
                walk(format!("[{i}]"), value, 1, max_depth, &mut found);
            }
        }
        _ => {}
    }

    found.sort_by(|a, b| b.score.cmp(&a.score));
    found.truncate(MAX_SECTIONS);
    found
}

fn walk(path: String, value: &Value, depth: usize, max_depth: usize, out: &mut Vec<JsonSection>) {
    if depth > max_depth || !is_container(value) {
        return;
    }

    let (score, relevance) = assess(&path, value);
    if score > 0 {
        out.push(JsonSection {
            path: path.clone(),
            data: sanitize(value),
            score,
            relevance,
        });
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if is_container(child) {
                    walk(format!("{path}.{key}"), child, depth + 1, max_depth, out);
                }
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                if is_container(child) {
                    walk(format!("{path}[{i}]"), child, depth + 1, max_depth, out);
                }
            }
        }
        _ => {}
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paths_and_depth_limit() {
        let doc = json!({
            "structured_0": {
                "offers": [{"price": 1}, {"price": 2}],
                "deep": {"level3": {"level4": {"price": 9}}}
            }
        });
        let sections = extract_sections(&doc, 3);
        let paths: Vec<&str> = sections.iter().map(|s| s.path.as_str()).collect();
        assert!(paths.contains(&"structured_0"));
        assert!(paths.contains(&"structured_0.offers"));
        assert!(paths.contains(&"structured_0.offers[1]"));
        assert!(paths.contains(&"structured_0.deep.level3"));
        assert!(!paths.iter().any(|p| p.ends_with("level4")));
    }

    #[test]
    fn test_scalars_are_not_sections() {
        let sections = extract_sections(&json!({"product": "x", "price": 3}), 3);
        assert!(sections.is_empty());
    }

    #[test]
    fn test_non_positive_parent_excluded_child_kept() {
        let doc = json!({
            "ads": {
                "x": {"price": 1, "sku": "a"},
                "banner": 1, "popup": 1, "cookie": 1, "consent": 1, "share": 1
            }
        });
        let sections = extract_sections(&doc, 3);
        assert!(sections.iter().all(|s| s.score > 0));
        assert!(!sections.iter().any(|s| s.path == "ads"));
        assert!(sections.iter().any(|s| s.path == "ads.x"));
    }

    #[test]
    fn test_at_most_ten_sorted_and_stable() {
        let mut doc = serde_json::Map::new();
        for i in 0..25 {
            doc.insert(format!("k{i}"), json!({"title": i}));
        }
        let sections = extract_sections(&Value::Object(doc), 3);
        assert_eq!(sections.len(), MAX_SECTIONS);
        assert!(sections.windows(2).all(|w| w[0].score >= w[1].score));
        let order: Vec<&str> = sections.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(order[0], "k0");
        assert_eq!(order[9], "k9");
    }

    #[test]
    fn test_data_is_sanitized() {
        let sections = extract_sections(&json!({"p": {"price": 1, "authToken": "x"}}), 3);
        assert_eq!(sections[0].data, json!({"price": 1}));
    }
}
