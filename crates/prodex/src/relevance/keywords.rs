//! Fixed keyword tables driving scoring, sanitizing, and pruning.

use serde::Serialize;

/// Relevance tier of a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    High,
    Medium,
    Low,
    Negative,
}

impl Tier {
    /// All tiers, in tag order.
    pub const ALL: [Tier; 4] = [Tier::High, Tier::Medium, Tier::Low, Tier::Negative];

    pub fn points(self) -> i64 {
        match self {
            Tier::High => 10,
            Tier::Medium => 7,
            Tier::Low => 3,
            Tier::Negative => -5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Low => "low",
            Tier::Negative => "negative",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Tier::High => HIGH,
            Tier::Medium => MEDIUM,
            Tier::Low => LOW,
            Tier::Negative => NEGATIVE,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

const HIGH: &[&str] = &[
    "product", "sku", "variant", "price", "title", "brand", "name", "image", "media", "photo",
    "picture", "thumbnail", "gallery", "id", "productid", "product_id", "sku_id", "item_id",
];

const MEDIUM: &[&str] = &[
    "description", "desc", "detail", "category", "breadcrumb", "review", "rating", "star",
    "comment", "feedback", "availability", "inventory", "stock", "quantity", "dimension", "size",
    "weight", "color", "flavor", "feature", "benefit", "ingredient", "material",
];

const LOW: &[&str] = &[
    "seo", "meta", "canonical", "structured", "schema", "analytics", "tracking", "config",
    "setting",
];

const NEGATIVE: &[&str] = &[
    "ad", "banner", "popup", "cookie", "consent", "privacy", "newsletter", "social", "share",
    "comment", "related", "recommendation", "suggestion", "promotion", "discount",
];

/// Keys always stripped by `sanitize`.
pub const SENSITIVE_KEYS: &[&str] = &["password", "token", "key", "secret", "auth"];

/// Keys stripped by `sanitize` unless they look product-related.
pub const UNNECESSARY_KEYS: &[&str] = &[
    "analytics", "tracking", "debug", "log", "error", "warning", "timestamp", "created",
    "updated", "modified", "version", "config", "settings", "options", "preferences", "user",
    "session", "cookie", "cache", "temp", "tmp", "backup", "metadata", "meta", "seo", "canonical",
    "robots", "sitemap", "breadcrumb", "navigation", "menu", "header", "footer", "sidebar",
    "widget", "component", "module", "plugin", "script", "style", "css", "js", "html", "dom",
    "element", "event", "handler", "callback", "function", "method", "api", "endpoint", "url",
    "path", "route", "controller", "service", "util", "helper", "tool", "utility", "feature",
    "benefit", "ingredient", "material", "dimension", "weight", "package", "shipping",
    "warranty", "guarantee", "return", "refund", "policy", "tag", "label", "manufacturer",
    "comment", "feedback",
];

/// A key containing any of these survives the unnecessary list.
pub const PRESERVED_KEY_MARKERS: &[&str] = &["sku", "variant", "product"];

/// Fields kept when a deeply nested object is collapsed.
pub const IMPORTANT_FIELDS: &[&str] = &[
    "id", "name", "title", "price", "sku", "brand", "product", "variant",
];

/// All of these present in a small subtree earn the density bonus.
pub const CORE_KEYWORDS: &[&str] = &["product", "sku", "price", "brand", "name", "image"];

/// Case-insensitive substring test against a pre-lowered haystack.
pub(crate) fn contains_any(haystack_lower: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack_lower.contains(n))
}
