//! Extraction from fully rendered markup.
//!
//! Unlike [`super::harvest`], nothing here is filtered for product relevance:
//! every image, every `data-*` carrier, every text node, and every JSON
//! script is kept for the relevance engine to sort out.

use super::markup::css;
use crate::types::{normalize_images, DataAttributeRecord};
use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

const SKIPPED_TEXT_TAGS: &[&str] = &["script", "style", "noscript"];

/// Everything collected from one rendered page.
#[derive(Debug, Clone, Default)]
pub struct RenderedExtract {
    pub images: Vec<String>,
    pub data_attributes: IndexMap<String, DataAttributeRecord>,
    pub text_content: IndexMap<String, String>,
    pub json: IndexMap<String, Value>,
}

struct Selectors {
    all: Selector,
    images: Selector,
    json_scripts: Selector,
    ld_json: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| Selectors {
        all: css("*"),
        images: css("img"),
        json_scripts: css(
            r#"script[type="application/json"], script[type="text/json"], script[id*="json"], script[data-comp]"#,
        ),
        ld_json: css(r#"script[type="application/ld+json"]"#),
    })
}

pub fn extract_rendered(document: &Html) -> RenderedExtract {
    let sel = selectors();
    let mut out = RenderedExtract::default();

    let images = document.select(&sel.images).filter_map(|img| {
        let el = img.value();
        ["src", "data-src", "data-lazy-src"]
            .iter()
            .filter_map(|a| el.attr(a))
            .find(|v| !v.trim().is_empty())
    });
    out.images = normalize_images(images);

    for el in document.select(&sel.all) {
        let data: IndexMap<String, String> = el
            .value()
            .attrs()
            .filter(|(name, _)| name.starts_with("data-"))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        let skip_text = SKIPPED_TEXT_TAGS.contains(&el.value().name());
        let text = if skip_text { String::new() } else { visible_text(&el) };

        if data.is_empty() && text.is_empty() {
            continue;
        }

        let (tag, class, id) = identity(&el);
        let key = format!("{tag}_{class}_{id}");

        if !text.is_empty() {
            out.text_content.insert(key.clone(), text.clone());
        }
        if !data.is_empty() {
            out.data_attributes.insert(
                key,
                DataAttributeRecord {
                    tag,
                    class,
                    id,
                    text,
                    data,
                },
            );
        }
    }

    for script in document.select(&sel.json_scripts) {
        let el = script.value();
        let key = format!(
            "script_{}_{}_{}",
            el.attr("id").unwrap_or("no-id"),
            el.attr("type").unwrap_or("no-type"),
            el.attr("data-comp").unwrap_or("no-comp"),
        );
        if let Some(value) = parse_script(&script, &key) {
            out.json.insert(key, value);
        }
    }

    for script in document.select(&sel.ld_json) {
        let key = format!("ld_json_{}", script.value().attr("id").unwrap_or("no-id"));
        if let Some(value) = parse_script(&script, &key) {
            out.json.insert(key, value);
        }
    }

    out
}

fn identity(el: &ElementRef<'_>) -> (String, String, String) {
    let v = el.value();
    let attr_or = |attr: &str, fallback: &str| {
        v.attr(attr)
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };
    (
        v.name().to_ascii_lowercase(),
        attr_or("class", "no-class"),
        attr_or("id", "no-id"),
    )
}

/// Element text without the contents of script, style, and noscript.
fn visible_text(el: &ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|p| SKIPPED_TEXT_TAGS.contains(&p.value().name()));
        if !hidden {
            parts.extend(text.split_whitespace());
        }
    }
    parts.join(" ")
}

fn parse_script(script: &ElementRef<'_>, key: &str) -> Option<Value> {
    let body = script.inner_html();
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("skipping invalid JSON in {key}: {e}");
            None
        }
    }
}
