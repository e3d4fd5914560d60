//! JSON harvesting from raw (unrendered) markup.
//!
//! Three passes over every non-empty `<script>`:
//!
//! 1. **Structured**: the `type` attribute mentions JSON; the whole body must parse.
//! 2. **Window state**: `window.NAME = {...}` assignments, brace-matched.
//! 3. **Pattern match**: any brace-matched object literal that parses and
//!    carries a product key.
//!
//! When no script yields anything, markup-wide regex hits and `data-*`
//! attributes are returned instead.

use super::markup::css;
use super::Provenance;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::debug;

/// Keys that make an object literal worth keeping.
pub const PRODUCT_INDICATOR_KEYS: &[&str] = &[
    "product",
    "sku",
    "price",
    "brand",
    "title",
    "offers",
    "variants",
    "images",
    "description",
];

/// Substrings that make a script worth scanning at all.
const SCRIPT_MARKERS: &[&str] = &[
    "\"product\"",
    "\"sku\"",
    "\"price\"",
    "\"brand\"",
    "\"title\"",
    "\"description\"",
    "window.",
    "__INITIAL_STATE__",
    "__PRELOADED_STATE__",
];

const MARKUP_PATTERN_LIMIT: usize = 10;
const DATA_ATTRIBUTE_ELEMENT_LIMIT: usize = 50;

/// One discovered JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestedBlob {
    pub key: String,
    pub provenance: Provenance,
    pub value: Value,
}

fn window_assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"window\.[A-Za-z_$][\w$]*\s*=\s*\{").expect("valid regex"))
}

fn markup_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r#""product":\s*\{[^}]*\}"#,
            r#""sku":\s*"[^"]*""#,
            r#""price":\s*"[^"]*""#,
            r#""brand":\s*"[^"]*""#,
            r#""title":\s*"[^"]*""#,
            r#""description":\s*"[^"]*""#,
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    })
}

fn script_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| css("script"))
}

/// Harvest every JSON blob from a parsed document.
pub fn harvest(html: &str, document: &Html) -> Vec<HarvestedBlob> {
    let mut blobs = harvest_scripts(document);
    if blobs.is_empty() {
        debug!("no JSON in script tags, scanning whole markup");
        blobs.extend(harvest_markup_patterns(html));
        blobs.extend(harvest_data_attributes(document));
    }
    blobs
}

/// Script passes only. `{script}` in keys counts non-empty scripts.
pub fn harvest_scripts(document: &Html) -> Vec<HarvestedBlob> {
    let mut blobs = Vec::new();

    let scripts = document
        .select(script_selector())
        .map(|el| (el.value().attr("type"), el.value().attr("id"), el.inner_html()))
        .filter(|(_, _, body)| !body.trim().is_empty());

    for (index, (kind, id, body)) in scripts.enumerate() {
        let body = body.trim();
        let is_json_type = kind.is_some_and(|t| t.to_ascii_lowercase().contains("json"));

        if is_json_type {
            match serde_json::from_str::<Value>(body) {
                Ok(value) => blobs.push(HarvestedBlob {
                    key: match id {
                        Some(id) if !id.is_empty() => format!("structured_{id}"),
                        _ => format!("structured_{index}"),
                    },
                    provenance: Provenance::Structured,
                    value,
                }),
                Err(e) => debug!("skipping unparsable JSON script {index}: {e}"),
            }
            continue;
        }

        if SCRIPT_MARKERS.iter().any(|m| body.contains(m)) {
            scan_script(index, body, &mut blobs);
        }
    }

    blobs
}

fn scan_script(index: usize, body: &str, blobs: &mut Vec<HarvestedBlob>) {
    let mut covered: Vec<(usize, usize)> = Vec::new();

    for (i, m) in window_assignment().find_iter(body).enumerate() {
        let open = m.end() - 1;
        let Some(close) = matching_brace(body, open) else {
            continue;
        };
        if let Ok(value) = serde_json::from_str::<Value>(&body[open..=close]) {
            covered.push((open, close));
            blobs.push(HarvestedBlob {
                key: format!("window_state_{index}_{i}"),
                provenance: Provenance::WindowState,
                value,
            });
        }
    }

    let bytes = body.as_bytes();
    let mut found = 0usize;
    let mut pos = 0usize;
    while let Some(offset) = body[pos..].find('{') {
        let open = pos + offset;
        pos = open + 1;

        if let Some(&(_, end)) = covered.iter().find(|(s, e)| (*s..=*e).contains(&open)) {
            pos = end + 1;
            continue;
        }
        if !looks_like_json_object(&bytes[open + 1..]) {
            continue;
        }
        let Some(close) = matching_brace(body, open) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(&body[open..=close]) else {
            continue;
        };
        if has_indicator_key(&value) {
            blobs.push(HarvestedBlob {
                key: format!("script_json_{index}_{found}"),
                provenance: Provenance::PatternMatched,
                value,
            });
            found += 1;
            pos = close + 1;
        }
    }
}

fn has_indicator_key(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| PRODUCT_INDICATOR_KEYS.iter().any(|k| map.contains_key(*k)))
}

/// A JSON object body starts with a quoted key or closes immediately.
fn looks_like_json_object(after_open: &[u8]) -> bool {
    after_open
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'"' || *b == b'}')
}

/// Byte index of the `}` closing the `{` at `open`, skipping string contents.
///
/// Understands `"`, `'`, and backtick strings with backslash escapes.
pub fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// First matches of each markup-wide product regex, as string arrays.
pub fn harvest_markup_patterns(html: &str) -> Vec<HarvestedBlob> {
    markup_patterns()
        .iter()
        .enumerate()
        .filter_map(|(i, re)| {
            let hits: Vec<Value> = re
                .find_iter(html)
                .take(MARKUP_PATTERN_LIMIT)
                .map(|m| Value::String(m.as_str().to_string()))
                .collect();
            (!hits.is_empty()).then(|| HarvestedBlob {
                key: format!("html_pattern_{i}"),
                provenance: Provenance::MarkupPattern,
                value: Value::Array(hits),
            })
        })
        .collect()
}

/// `data-*` attributes of the first elements carrying any, keyed `{TAG}_{attr}`.
pub fn harvest_data_attributes(document: &Html) -> Option<HarvestedBlob> {
    static ALL: OnceLock<Selector> = OnceLock::new();
    let all = ALL.get_or_init(|| css("*"));

    let mut attrs = Map::new();
    let carriers = document
        .select(all)
        .filter(|el| el.value().attrs().any(|(name, _)| name.starts_with("data-")))
        .take(DATA_ATTRIBUTE_ELEMENT_LIMIT);

    for el in carriers {
        let tag = el.value().name().to_ascii_uppercase();
        for (name, value) in el.value().attrs() {
            if name.starts_with("data-") && !value.is_empty() {
                attrs.insert(format!("{tag}_{name}"), Value::String(value.to_string()));
            }
        }
    }

    (!attrs.is_empty()).then(|| HarvestedBlob {
        key: "data_attributes".to_string(),
        provenance: Provenance::DataAttributes,
        value: Value::Object(attrs),
    })
}
