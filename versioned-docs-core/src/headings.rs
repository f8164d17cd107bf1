//! Heading extraction from rendered page HTML.
//!
//! The HTML is parsed as an HTML5 fragment, so raw markup carried over from
//! markdown (bare `&`, unclosed tags, JSX-like attributes) never stops extraction.

use std::sync::OnceLock;

use scraper::{Html, Selector};
use tracing::debug;

use crate::contract::Heading;

fn heading_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("h1, h2, h3").expect("valid heading selector"))
}

/// Collects `h1`, `h2` and `h3` elements in document order.
///
/// The text of a heading is its full text content, including nested inline
/// elements. A heading without an `id` attribute gets an empty id.
pub fn extract_headings(html: &str) -> Vec<Heading> {
    let fragment = Html::parse_fragment(html);
    if !fragment.errors.is_empty() {
        debug!(
            errors = fragment.errors.len(),
            "Recovered from malformed markup while extracting headings"
        );
    }

    fragment
        .select(heading_selector())
        .map(|element| Heading {
            id: element.value().attr("id").unwrap_or_default().to_string(),
            text: element.text().collect(),
        })
        .collect()
}
