//! Keyword scoring with size penalty and density bonus.

use super::keywords::{Tier, CORE_KEYWORDS};
use super::RelevanceTag;
use serde_json::Value;

const KIB: usize = 1024;

/// Serialized size allowed before the size penalty starts.
pub const SIZE_ALLOWANCE: usize = 50 * KIB;
const PENALTY_STEP: usize = 100 * KIB;
const PENALTY_PER_STEP: i64 = 10;
const OVERSIZE_THRESHOLD: usize = 500 * KIB;
const OVERSIZE_PENALTY: i64 = 50;
/// Bonus for a small subtree mentioning every core keyword.
pub const DENSITY_BONUS: i64 = 30;

/// Relevance score of `subtree` located at `path`. May be negative.
pub fn score(path: &str, subtree: &Value) -> i64 {
    assess(path, subtree).0
}

/// Score and matched tags in one pass over the serialization.
pub(crate) fn assess(path: &str, subtree: &Value) -> (i64, Vec<RelevanceTag>) {
    let serialized = serde_json::to_string(subtree).unwrap_or_default();
    let haystack = serialized.to_lowercase();
    let path_lower = path.to_lowercase();

    let mut total = 0i64;
    let mut tags = Vec::new();
    for tier in Tier::ALL {
        for keyword in tier.keywords() {
            if path_lower.contains(keyword) || haystack.contains(keyword) {
                total += tier.points();
                tags.push(RelevanceTag {
                    tier,
                    keyword: (*keyword).to_string(),
                });
            }
        }
    }

    let len = serialized.len();
    total -= size_penalty(len);
    if len < SIZE_ALLOWANCE && CORE_KEYWORDS.iter().all(|k| haystack.contains(k)) {
        total += DENSITY_BONUS;
    }

    (total, tags)
}

/// Penalty for a serialization of `len` bytes.
pub fn size_penalty(len: usize) -> i64 {
    let mut penalty = 0;
    if len > SIZE_ALLOWANCE {
        penalty += ((len - SIZE_ALLOWANCE) / PENALTY_STEP) as i64 * PENALTY_PER_STEP;
    }
    if len > OVERSIZE_THRESHOLD {
        penalty += OVERSIZE_PENALTY;
    }
    penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_core_keys_earn_density_bonus() {
        let subtree = json!({
            "product": "Lip Balm",
            "sku": "LB-1",
            "price": 4.5,
            "brand": "Acme",
            "name": "Lip Balm",
            "image": "https://cdn/lb.jpg"
        });
        assert!(score("x", &subtree) >= 90);
    }

    #[test]
    fn test_keyword_counts_once() {
        let once = score("p", &json!({"price": 1}));
        let many = score("p", &json!({"price": 1, "priceMax": 2, "priceMin": 0}));
        assert_eq!(once, many);
    }

    #[test]
    fn test_path_contributes() {
        assert_eq!(score("", &json!({"x": 1})), 0);
        assert_eq!(score("gallery", &json!({"x": 1})), 10);
    }

    #[test]
    fn test_negative_keywords() {
        assert_eq!(score("popup", &json!([1, 2])), -5);
    }

    #[test]
    fn test_tags_in_tier_order() {
        let (_, tags) = assess("review", &json!({"title": "t", "banner": 1}));
        let tiers: Vec<Tier> = tags.iter().map(|t| t.tier).collect();
        let mut sorted = tiers.clone();
        sorted.sort_by_key(|t| Tier::ALL.iter().position(|x| x == t));
        assert_eq!(tiers, sorted);
        assert!(tags.iter().any(|t| t.to_string() == "negative:banner"));
    }

    #[test]
    fn test_size_penalty_steps() {
        assert_eq!(size_penalty(10), 0);
        assert_eq!(size_penalty(SIZE_ALLOWANCE + 99 * KIB), 0);
        assert_eq!(size_penalty(SIZE_ALLOWANCE + 100 * KIB), 10);
        assert_eq!(size_penalty(SIZE_ALLOWANCE + 250 * KIB), 20);
        assert_eq!(size_penalty(600 * KIB), 40 + 50);
    }

    #[test]
    fn test_large_subtree_loses_density_bonus() {
        let filler = "z".repeat(SIZE_ALLOWANCE);
        let small = json!({"product": 1, "sku": 1, "price": 1, "brand": 1, "name": 1, "image": 1});
        let big = json!({"product": 1, "sku": 1, "price": 1, "brand": 1, "name": 1, "image": 1, "f": filler});
        assert_eq!(score("x", &small) - score("x", &big), DENSITY_BONUS);
    }
}
