use super::keywords::{contains_any, PRESERVED_KEY_MARKERS, SENSITIVE_KEYS, UNNECESSARY_KEYS};
use serde_json::{Map, Value};

/// Strip sensitive and non-product keys from the objects in `subtree`.
///
/// Arrays are returned as they are, elements included.
pub fn sanitize(subtree: &Value) -> Value {
    match subtree {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                if keep_key(key) {
                    out.insert(key.clone(), sanitize(value));
                }
            }
            Value::Object(out)
        }
        Value::Array(_) => subtree.clone(),
        scalar => scalar.clone(),
    }
}

fn keep_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    if contains_any(&lower, SENSITIVE_KEYS) {
        return false;
    }
    !contains_any(&lower, UNNECESSARY_KEYS) || contains_any(&lower, PRESERVED_KEY_MARKERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_removes_sensitive_even_when_product_related() {
        let out = sanitize(&json!({"productToken": "x", "apiKey": "y", "name": "ok"}));
        assert_eq!(out, json!({"name": "ok"}));
    }

    #[test]
    fn test_product_markers_override_unnecessary() {
        let out = sanitize(&json!({
            "productUrl": "/p/1",
            "variantOptions": [1],
            "skuMetadata": {"a": 1},
            "url": "/drop",
            "tracking": {}
        }));
        let map = out.as_object().expect("object");
        assert!(map.contains_key("productUrl"));
        assert!(map.contains_key("variantOptions"));
        assert!(map.contains_key("skuMetadata"));
        assert!(!map.contains_key("url"));
        assert!(!map.contains_key("tracking"));
    }

    #[test]
    fn test_arrays_keep_full_fidelity() {
        let items: Vec<Value> = (0..40).map(|i| json!({"id": i, "debugInfo": "x"})).collect();
        let out = sanitize(&json!({ "items": items.clone() }));
        assert_eq!(out["items"], Value::Array(items));
    }

    #[test]
    fn test_image_and_offer_urls_survive() {
        let input = json!({
            "images": [{"url": "https://cdn/x.jpg", "alt": "front"}],
            "offers": [{"url": "/p/1", "price": 3, "shipping": "free"}],
            "tracking": [1]
        });
        let out = sanitize(&input);
        assert_eq!(out["images"], input["images"]);
        assert_eq!(out["offers"], input["offers"]);
        assert!(out.get("tracking").is_none());
    }

    #[test]
    fn test_top_level_array_untouched() {
        let input = json!([{"apiKey": "k", "sku": "A1"}]);
        assert_eq!(sanitize(&input), input);
    }

    #[test]
    fn test_idempotent() {
        let input = json!({"a": {"Password": 1, "b": [{"cookieId": 2, "sku": 3}]}, "c": null});
        let once = sanitize(&input);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(sanitize(&json!("x")), json!("x"));
        assert_eq!(sanitize(&json!(3)), json!(3));
    }
}
