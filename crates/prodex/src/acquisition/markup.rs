//! Selector hints read straight from page markup.

use crate::types::{non_empty, normalize_images};
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Best-effort product fields found by fixed CSS selectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectorHints {
    pub title: Option<String>,
    pub price: Option<String>,
    pub sku: Option<String>,
    pub images: Vec<String>,
}

struct Selectors {
    title: Selector,
    price: Selector,
    sku: Selector,
    images: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| Selectors {
        title: css("h1, .product-title, .title"),
        price: css(".price, .product-price, [data-price]"),
        sku: css(r#"[data-sku], .sku, .product-sku, meta[property="product:sku"]"#),
        images: css(r#"img[src*="product"], img[data-src*="product"]"#),
    })
}

pub(crate) fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector is valid")
}

/// Apply the title, price, sku, and image selectors.
pub fn extract_hints(document: &Html) -> SelectorHints {
    let sel = selectors();

    let sku = document.select(&sel.sku).find_map(|el| {
        el.value()
            .attr("data-sku")
            .or_else(|| el.value().attr("content"))
            .and_then(non_empty)
            .or_else(|| non_empty(element_text(&el)))
    });

    let images = document.select(&sel.images).filter_map(|img| {
        img.value()
            .attr("src")
            .filter(|s| !s.trim().is_empty())
            .or_else(|| img.value().attr("data-src"))
    });

    SelectorHints {
        title: first_text(document, &sel.title),
        price: first_text(document, &sel.price),
        sku,
        images: normalize_images(images),
    }
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| non_empty(element_text(&el)))
}

/// Concatenated descendant text, whitespace runs collapsed.
pub(crate) fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
