use super::{normalize_price, parse_selector};
use crate::error::{Result, ScraperError};
use scraper::{ElementRef, Html};
use tracing::debug;

/// Price text from the element that directly follows the first label containing `marker`.
///
/// Mirrors definition-list markup such as `<dt>Pompprijs</dt><dd>€ 1,929</dd>`:
/// the next element sibling must be a `value_tag` element.
pub fn extract(
    document: &Html,
    label_selector: &str,
    marker: &str,
    value_tag: &str,
) -> Result<f64> {
    let css = parse_selector(label_selector)?;

    let label = document
        .select(&css)
        .find(|element| element.text().collect::<String>().contains(marker))
        .ok_or_else(|| ScraperError::LabelNotFound(marker.to_string()))?;

    let value = next_element_sibling(label)
        .filter(|element| element.value().name().eq_ignore_ascii_case(value_tag))
        .ok_or_else(|| ScraperError::ValueNotFound(marker.to_string()))?;

    let raw = value.text().collect::<String>();
    debug!("Value next to '{}': {:?}", marker, raw.trim());

    normalize_price(&raw)
}

fn next_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Result<f64> {
        extract(&Html::parse_document(html), "dt", "Pompprijs", "dd")
    }

    #[test]
    fn test_value_next_to_label() {
        let html = r#"
            <dl>
                <dt>Adviesprijs</dt><dd>€ 2,159</dd>
                <dt>Pompprijs</dt>
                <dd>€ 1,929</dd>
            </dl>"#;
        assert_eq!(run(html).unwrap(), 1.929);
    }

    #[test]
    fn test_first_matching_label_wins() {
        let html = r#"
            <dl><dt>Pompprijs E10</dt><dd>€ 1,929</dd></dl>
            <dl><dt>Pompprijs Diesel</dt><dd>€ 1,699</dd></dl>"#;
        assert_eq!(run(html).unwrap(), 1.929);
    }

    #[test]
    fn test_label_without_sibling() {
        let html = r#"<dl><dt>Pompprijs</dt></dl>"#;
        assert!(matches!(run(html), Err(ScraperError::ValueNotFound(_))));
    }

    #[test]
    fn test_sibling_of_wrong_kind() {
        let html = r#"<dl><dt>Pompprijs</dt><dt>Adviesprijs</dt><dd>€ 2,159</dd></dl>"#;
        assert!(matches!(run(html), Err(ScraperError::ValueNotFound(_))));
    }

    #[test]
    fn test_label_absent() {
        let html = r#"<dl><dt>Adviesprijs</dt><dd>€ 2,159</dd></dl>"#;
        assert!(matches!(run(html), Err(ScraperError::LabelNotFound(_))));
    }

    #[test]
    fn test_unparseable_value() {
        let html = r#"<dl><dt>Pompprijs</dt><dd>onbekend</dd></dl>"#;
        assert!(matches!(run(html), Err(ScraperError::InvalidPriceFormat(_))));
    }
}
