use super::parse_selector;
use crate::error::{Result, ScraperError};
use scraper::Html;
use tracing::debug;

/// Highest numeric `attribute` value among the elements matching `selector`.
///
/// Pages like TinQ list every pump grade under one selector. The highest value
/// has so far been the E10 price; nothing on the page guarantees that.
pub fn extract(document: &Html, selector: &str, attribute: &str) -> Result<f64> {
    let css = parse_selector(selector)?;

    let elements: Vec<_> = document.select(&css).collect();
    debug!("Selector '{}' matched {} elements", selector, elements.len());

    if elements.is_empty() {
        return Err(ScraperError::NoPriceFound(format!(
            "selector '{selector}' matched no elements"
        )));
    }

    let candidates: Vec<f64> = elements
        .iter()
        .filter_map(|element| element.value().attr(attribute))
        .filter_map(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .collect();
    debug!("Numeric candidates: {:?}", candidates);

    candidates
        .into_iter()
        .reduce(f64::max)
        .ok_or_else(|| {
            ScraperError::NoPriceFound(format!(
                "no numeric '{attribute}' attribute under '{selector}'"
            ))
        })
}
