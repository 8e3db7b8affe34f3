//! Price extraction from fetched station pages.
//!
//! Each station carries an [`ExtractionRule`]; [`extract`] parses the HTML once
//! and dispatches to the matching strategy. Strategies are pure functions of
//! the document and the rule parameters.

pub mod fragments;
pub mod label_value;
pub mod price;
pub mod selector_max;

pub use price::{normalize_fragments, normalize_price};

use crate::error::{Result, ScraperError};
use crate::types::ExtractionRule;
use scraper::{Html, Selector};
use tracing::debug;

/// Extract a single price from `html` using `rule`
pub fn extract(html: &str, rule: &ExtractionRule) -> Result<f64> {
    debug!("Extracting price with {} from {} bytes of HTML", rule.type_name(), html.len());
    let document = Html::parse_document(html);

    match rule {
        ExtractionRule::SelectorMax {
            selector,
            attribute,
        } => selector_max::extract(&document, selector, attribute),
        ExtractionRule::LabelValue {
            label_selector,
            marker,
            value_tag,
        } => label_value::extract(&document, label_selector, marker, value_tag),
        ExtractionRule::Fragments { selector } => fragments::extract(&document, selector),
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| ScraperError::InvalidSelector(selector.to_string()))
}
