use crate::error::{Result, ScraperError};
use once_cell::sync::Lazy;
use regex::Regex;

/// Everything that can't be part of a number: currency symbols, whitespace, labels
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.,]").unwrap());

/// Convert price text like `"€ 1,929"` or `"1.929"` into a number.
///
/// The last `.` or `,` is taken as the decimal point; any earlier separator is
/// treated as a thousands separator and dropped. Thousands groups must be three
/// digits wide, so `"1.2.3"` is rejected.
pub fn normalize_price(raw: &str) -> Result<f64> {
    let cleaned = NON_NUMERIC.replace_all(raw, "");

    to_decimal_string(&cleaned)
        .and_then(|decimal| decimal.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .ok_or_else(|| ScraperError::InvalidPriceFormat(raw.trim().to_string()))
}

/// Join a price rendered as split fragments (`"1"`, `"92"`, `"9"`) into one value.
///
/// `whole` is the integer part; every digit of `fragments`, in order, becomes
/// part of the fraction.
pub fn normalize_fragments(whole: &str, fragments: &[&str]) -> Result<f64> {
    let whole_digits = NON_NUMERIC.replace_all(whole, "");
    let whole_digits = whole_digits.trim_end_matches(['.', ',']);

    let fraction: String = fragments
        .iter()
        .flat_map(|fragment| fragment.chars().filter(char::is_ascii_digit))
        .collect();

    if whole_digits.is_empty() {
        return Err(ScraperError::InvalidPriceFormat(format!(
            "{}{}",
            whole.trim(),
            fragments.concat()
        )));
    }
    if fraction.is_empty() {
        return normalize_price(whole_digits);
    }

    normalize_price(&format!("{whole_digits}.{fraction}"))
}

fn to_decimal_string(cleaned: &str) -> Option<String> {
    let Some(idx) = cleaned.rfind(['.', ',']) else {
        return Some(cleaned.to_string());
    };

    let mut groups = cleaned[..idx].split(['.', ',']);
    let mut integer = groups.next().unwrap_or_default().to_string();
    for group in groups {
        if integer.is_empty() || group.len() != 3 {
            return None;
        }
        integer.push_str(group);
    }
    Some(format!("{}.{}", integer, &cleaned[idx + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_decimal_with_currency() {
        assert_eq!(normalize_price("€ 1,929").unwrap(), 1.929);
    }

    #[test]
    fn test_period_decimal() {
        assert_eq!(normalize_price("1.929").unwrap(), 1.929);
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(normalize_price("€ 1.234,56").unwrap(), 1234.56);
        assert_eq!(normalize_price("1,234.56").unwrap(), 1234.56);
        assert_eq!(normalize_price("1.234.567,8").unwrap(), 1234567.8);
    }

    #[test]
    fn test_misplaced_separators_fail() {
        for raw in ["1.2.3", "1,23.4", "1.2345,6", ",123.4"] {
            assert!(
                matches!(normalize_price(raw), Err(ScraperError::InvalidPriceFormat(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_decoration_is_ignored() {
        assert_eq!(normalize_price("  € 2,099 per liter\n").unwrap(), 2.099);
        assert_eq!(normalize_price("2").unwrap(), 2.0);
    }

    #[test]
    fn test_non_numeric_fails() {
        assert!(matches!(
            normalize_price("abc"),
            Err(ScraperError::InvalidPriceFormat(_))
        ));
        assert!(matches!(
            normalize_price(""),
            Err(ScraperError::InvalidPriceFormat(_))
        ));
        assert!(matches!(
            normalize_price("€ ,"),
            Err(ScraperError::InvalidPriceFormat(_))
        ));
    }

    #[test]
    fn test_fragments_concatenate_in_order() {
        assert_eq!(normalize_fragments("1", &["92", "9"]).unwrap(), 1.929);
    }

    #[test]
    fn test_fragments_with_decorated_whole_part() {
        assert_eq!(normalize_fragments("€ 1,", &["92", "9"]).unwrap(), 1.929);
        assert_eq!(normalize_fragments("2", &[]).unwrap(), 2.0);
    }

    #[test]
    fn test_fragments_without_whole_part_fail() {
        assert!(matches!(
            normalize_fragments(" ", &["92", "9"]),
            Err(ScraperError::InvalidPriceFormat(_))
        ));
    }
}
