//! Property tests for the relevance engine.

use proptest::prelude::*;
use prodex::relevance::keywords::{PRESERVED_KEY_MARKERS, SENSITIVE_KEYS};
use prodex::relevance::{
    estimate_tokens, extract_sections, format_for_prompt, sanitize, truncate_to_budget,
    JsonSection, RelevanceTag, Tier, DEFAULT_MAX_DEPTH, MAX_SECTIONS,
};
use serde_json::{json, Map, Value};

const KEYS: &[&str] = &[
    "product", "sku", "price", "name", "image", "brand", "variants", "offers", "productUrl",
    "variantMetadata", "skuTracking", "reviews", "analytics", "tracking", "apiToken", "cookie",
    "banner", "settings", "data", "items", "props", "x", "description",
];

fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(KEYS).prop_map(str::to_string),
        1 => "[a-z]{1,8}",
    ]
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,24}".prop_map(Value::String),
    ];
    leaf.prop_recursive(5, 96, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((arb_key(), inner), 0..8)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn arb_document() -> impl Strategy<Value = Value> {
    prop::collection::vec((arb_key(), arb_json()), 1..10)
        .prop_map(|pairs| Value::Object(pairs.into_iter().collect::<Map<_, _>>()))
}

proptest! {
    #[test]
    fn sections_are_bounded_sorted_and_positive(doc in arb_document()) {
        let sections = extract_sections(&doc, DEFAULT_MAX_DEPTH);
        prop_assert!(sections.len() <= MAX_SECTIONS);
        prop_assert!(sections.iter().all(|s| s.score > 0));
        prop_assert!(sections.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn budget_is_respected(doc in arb_document(), budget in 0usize..600) {
        let sections = extract_sections(&doc, DEFAULT_MAX_DEPTH);
        let outcome = truncate_to_budget(sections, budget);
        prop_assert!(
            outcome.sections.is_empty() || estimate_tokens(&outcome.sections) <= budget
        );
    }

    #[test]
    fn sanitize_is_idempotent(value in arb_json()) {
        let once = sanitize(&value);
        prop_assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn sanitize_keeps_product_keys(doc in arb_document()) {
        let cleaned = sanitize(&doc);
        let (Value::Object(before), Value::Object(after)) = (&doc, &cleaned) else {
            return Err(TestCaseError::fail("expected objects"));
        };
        for key in before.keys() {
            let lower = key.to_lowercase();
            let preserved = PRESERVED_KEY_MARKERS.iter().any(|m| lower.contains(m));
            let sensitive = SENSITIVE_KEYS.iter().any(|m| lower.contains(m));
            if preserved && !sensitive {
                prop_assert!(after.contains_key(key), "dropped {}", key);
            }
        }
    }
}

#[test]
fn oversized_section_set_is_truncated() {
    let reviews: Vec<Value> = (0..120)
        .map(|i| json!({"rating": 4, "text": format!("review {i} {}", "great product ".repeat(4))}))
        .collect();
    let doc = json!({
        "structured_0": {"product": {"name": "Trail Runner", "sku": "TR-42", "reviews": reviews}},
        "structured_1": {"offers": {"price": "129.00", "images": (0..40).map(|i| format!("https://cdn.example/product/{i}.jpg")).collect::<Vec<_>>()}},
    });

    let sections = extract_sections(&doc, DEFAULT_MAX_DEPTH);
    let original = estimate_tokens(&sections);
    assert!(original * 4 >= 40_000, "fixture too small: {original} tokens");

    let outcome = truncate_to_budget(sections.clone(), 8000);
    assert!(outcome.was_truncated);
    assert_eq!(outcome.original_tokens, original);
    assert!(estimate_tokens(&outcome.sections) <= 8000);
    assert!(estimate_tokens(&outcome.sections) < original);
    assert!(!outcome.sections.is_empty());
}

fn review_section(i: usize) -> JsonSection {
    let reviews: Vec<Value> = (0..18)
        .map(|j| {
            json!({
                "author": format!("shopper {j}"),
                "rating": 4,
                "text": "great product, fits well ".repeat(6),
            })
        })
        .collect();
    JsonSection {
        path: format!("structured_{i}.reviews"),
        data: Value::Array(reviews),
        score: 40 - i as i64,
        relevance: vec![RelevanceTag::new(Tier::High, "review")],
    }
}

#[test]
fn ten_sections_of_forty_thousand_chars_fit_eight_thousand_tokens() {
    let sections: Vec<JsonSection> = (0..10).map(review_section).collect();
    let chars = format_for_prompt(&sections).chars().count();
    assert!((38_000..=42_000).contains(&chars), "fixture is {chars} chars");

    let outcome = truncate_to_budget(sections.clone(), 8000);
    let admitted_tokens = estimate_tokens(&outcome.sections);

    assert!(outcome.was_truncated);
    assert_eq!(outcome.original_tokens, estimate_tokens(&sections));
    assert!(admitted_tokens <= 8000, "{admitted_tokens} tokens admitted");
    // Strictly smaller: fewer tokens than the input, because later sections
    // were admitted as pruned copies rather than in full.
    assert!(admitted_tokens < outcome.original_tokens);
    assert_eq!(outcome.sections[0], sections[0]);
    let pruned: Vec<&JsonSection> = outcome
        .sections
        .iter()
        .filter(|s| s.data.as_array().map(Vec::len) == Some(3))
        .collect();
    assert!(!pruned.is_empty());
    assert!(pruned.iter().all(|s| s.path > sections[0].path));
}

#[test]
fn small_set_passes_through_unchanged() {
    let doc = json!({"structured_0": {"product": {"name": "Mug", "sku": "M1", "price": 9}}});
    let sections = extract_sections(&doc, DEFAULT_MAX_DEPTH);
    let outcome = truncate_to_budget(sections.clone(), 8000);
    assert!(!outcome.was_truncated);
    assert_eq!(outcome.sections, sections);
}
