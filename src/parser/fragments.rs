use super::{normalize_fragments, parse_selector};
use crate::error::{Result, ScraperError};
use scraper::{ElementRef, Html};
use tracing::debug;

/// Price split across markup, e.g. `<span class="price">1<sup>92</sup><sub>9</sub></span>`.
///
/// The container's own text nodes form the whole part, the text of its first
/// and second child elements the fractional fragments.
pub fn extract(document: &Html, selector: &str) -> Result<f64> {
    let css = parse_selector(selector)?;

    let container = document.select(&css).next().ok_or_else(|| {
        ScraperError::NoPriceFound(format!("price container '{selector}' not found"))
    })?;

    let whole: String = container
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect();

    let fragments: Vec<String> = container
        .children()
        .filter_map(ElementRef::wrap)
        .take(2)
        .map(|element| element.text().collect::<String>())
        .collect();
    debug!("Fragments for '{}': whole={:?} rest={:?}", selector, whole.trim(), fragments);

    let fragment_refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
    normalize_fragments(&whole, &fragment_refs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Result<f64> {
        extract(&Html::parse_document(html), ".price")
    }

    #[test]
    fn test_whole_cents_and_mills() {
        let html = r#"<div class="price">1<span class="cents">92</span><span>9</span></div>"#;
        assert_eq!(run(html).unwrap(), 1.929);
    }

    #[test]
    fn test_decorated_whole_part() {
        let html = r#"<div class="price"> € 1,<sup>89</sup><sub>9</sub> </div>"#;
        assert_eq!(run(html).unwrap(), 1.899);
    }

    #[test]
    fn test_only_first_two_children_count() {
        let html = r#"<div class="price">2<b>01</b><b>9</b><small>/L</small></div>"#;
        assert_eq!(run(html).unwrap(), 2.019);
    }

    #[test]
    fn test_container_absent() {
        assert!(matches!(
            run("<div class=\"other\">1</div>"),
            Err(ScraperError::NoPriceFound(_))
        ));
    }
}
