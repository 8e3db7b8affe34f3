use crate::constants::{
    DEFAULT_LABEL_MARKER, DEFAULT_LABEL_SELECTOR, DEFAULT_PRICE_ATTRIBUTE, DEFAULT_VALUE_TAG, E10,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One fuel-pricing source and the rule used to scrape it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Grade key under which prices are stored in the document
    #[serde(default = "default_fuel")]
    pub fuel: String,
    #[serde(flatten)]
    pub rule: ExtractionRule,
}

/// Site-specific parsing strategy, selected by the `type` field in configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractionRule {
    /// Highest numeric attribute value among all elements matching `selector`
    SelectorMax {
        selector: String,
        #[serde(default = "default_price_attribute")]
        attribute: String,
    },
    /// Text of the element right after the first label containing `marker`
    LabelValue {
        #[serde(default = "default_label_selector")]
        label_selector: String,
        #[serde(default = "default_label_marker")]
        marker: String,
        #[serde(default = "default_value_tag")]
        value_tag: String,
    },
    /// Whole part as the container's own text, fractional digits from its first two children
    Fragments { selector: String },
}

impl ExtractionRule {
    pub fn type_name(&self) -> &'static str {
        match self {
            ExtractionRule::SelectorMax { .. } => "selector_max",
            ExtractionRule::LabelValue { .. } => "label_value",
            ExtractionRule::Fragments { .. } => "fragments",
        }
    }
}

fn default_fuel() -> String {
    E10.to_string()
}

fn default_price_attribute() -> String {
    DEFAULT_PRICE_ATTRIBUTE.to_string()
}

fn default_label_selector() -> String {
    DEFAULT_LABEL_SELECTOR.to_string()
}

fn default_label_marker() -> String {
    DEFAULT_LABEL_MARKER.to_string()
}

fn default_value_tag() -> String {
    DEFAULT_VALUE_TAG.to_string()
}

/// A single daily price sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Persisted history of one station, one ordered series per fuel grade
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StationHistory {
    pub name: String,
    #[serde(default)]
    pub fuel: BTreeMap<String, Vec<PricePoint>>,
}

impl StationHistory {
    pub fn new(name: impl Into<String>, grade: &str) -> Self {
        let mut fuel = BTreeMap::new();
        fuel.insert(grade.to_string(), Vec::new());
        Self {
            name: name.into(),
            fuel,
        }
    }

    /// Points recorded for `grade`, empty if the grade was never tracked
    pub fn points(&self, grade: &str) -> &[PricePoint] {
        self.fuel.get(grade).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn points_mut(&mut self, grade: &str) -> &mut Vec<PricePoint> {
        self.fuel.entry(grade.to_string()).or_default()
    }
}

/// The whole persisted JSON document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceDocument {
    pub last_updated: Option<NaiveDate>,
    #[serde(default)]
    pub stations: BTreeMap<String, StationHistory>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_json_shape() {
        let mut doc = PriceDocument::default();
        let mut history = StationHistory::new("TinQ", E10);
        history.points_mut(E10).push(PricePoint {
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            price: 1.929,
        });
        doc.stations.insert("tinq".to_string(), history);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "lastUpdated": null,
                "stations": {
                    "tinq": {
                        "name": "TinQ",
                        "fuel": { "e10": [ { "date": "2026-01-05", "price": 1.929 } ] }
                    }
                }
            })
        );
    }

    #[test]
    fn test_station_rule_from_toml() {
        let station: Station = toml::from_str(
            r#"
            id = "tango"
            name = "Tango"
            url = "https://example.com/tango"
            type = "label_value"
            "#,
        )
        .unwrap();

        assert_eq!(station.fuel, E10);
        assert_eq!(
            station.rule,
            ExtractionRule::LabelValue {
                label_selector: "dt".to_string(),
                marker: "Pompprijs".to_string(),
                value_tag: "dd".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_grade_is_empty() {
        let history = StationHistory::new("Tango", E10);
        assert!(history.points("diesel").is_empty());
    }
}
