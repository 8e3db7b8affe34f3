use crate::constants::*;
use crate::error::{Result, ScraperError};
use crate::types::{ExtractionRule, Station};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Retention cap per station series; absent means keep everything
    #[serde(default)]
    pub max_entries: Option<usize>,
    #[serde(default = "builtin_stations")]
    pub stations: Vec<Station>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
            max_entries: None,
            stations: builtin_stations(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to built-in defaults when no
    /// path was given and `config.toml` doesn't exist. Environment overrides
    /// (`FUEL_DATA_FILE`, `FUEL_MAX_ENTRIES`) are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    info!("No {} found, using built-in stations", DEFAULT_CONFIG_PATH);
                    Self::default()
                }
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        debug!("Loaded {} stations from {}", config.stations.len(), path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(data_file) = std::env::var(ENV_DATA_FILE) {
            if !data_file.trim().is_empty() {
                self.data_file = PathBuf::from(data_file.trim());
            }
        }
        if let Ok(max) = std::env::var(ENV_MAX_ENTRIES) {
            let max = max.trim();
            if !max.is_empty() {
                let parsed = max.parse::<usize>().map_err(|e| {
                    ScraperError::Config(format!(
                        "{ENV_MAX_ENTRIES} must be a positive integer: {e}"
                    ))
                })?;
                self.max_entries = Some(parsed);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.stations.is_empty() {
            return Err(ScraperError::Config("No stations configured".into()));
        }
        if self.timeout_seconds == 0 {
            return Err(ScraperError::Config("timeout_seconds must be greater than 0".into()));
        }
        if self.max_entries == Some(0) {
            return Err(ScraperError::Config("max_entries must be greater than 0".into()));
        }

        let mut seen = HashSet::new();
        for station in &self.stations {
            if station.id.trim().is_empty() {
                return Err(ScraperError::Config(format!(
                    "Station '{}' has an empty id",
                    station.name
                )));
            }
            if !seen.insert(station.id.as_str()) {
                return Err(ScraperError::Config(format!(
                    "Duplicate station id '{}'",
                    station.id
                )));
            }
            if station.url.trim().is_empty() {
                return Err(ScraperError::Config(format!("Station '{}' has no url", station.id)));
            }
            let selector = match &station.rule {
                ExtractionRule::SelectorMax { selector, .. } => selector,
                ExtractionRule::LabelValue { label_selector, .. } => label_selector,
                ExtractionRule::Fragments { selector } => selector,
            };
            if selector.trim().is_empty() {
                return Err(ScraperError::Config(format!(
                    "Station '{}' has an empty selector",
                    station.id
                )));
            }
        }
        Ok(())
    }

    /// Stations to run: all of them, or the comma-separated subset in `filter`
    pub fn select_stations(&self, filter: Option<&str>) -> Result<Vec<Station>> {
        let Some(filter) = filter else {
            return Ok(self.stations.clone());
        };

        filter
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                self.stations
                    .iter()
                    .find(|station| station.id == id)
                    .cloned()
                    .ok_or_else(|| ScraperError::Config(format!("Unknown station '{id}'")))
            })
            .collect()
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn builtin_stations() -> Vec<Station> {
    vec![
        Station {
            id: TINQ_WEESP_ID.to_string(),
            name: TINQ_WEESP_NAME.to_string(),
            url: TINQ_WEESP_URL.to_string(),
            fuel: E10.to_string(),
            rule: ExtractionRule::SelectorMax {
                selector: TINQ_PRICE_SELECTOR.to_string(),
                attribute: DEFAULT_PRICE_ATTRIBUTE.to_string(),
            },
        },
        Station {
            id: TANGO_WEESP_ID.to_string(),
            name: TANGO_WEESP_NAME.to_string(),
            url: TANGO_WEESP_URL.to_string(),
            fuel: E10.to_string(),
            rule: ExtractionRule::LabelValue {
                label_selector: DEFAULT_LABEL_SELECTOR.to_string(),
                marker: DEFAULT_LABEL_MARKER.to_string(),
                value_tag: DEFAULT_VALUE_TAG.to_string(),
            },
        },
    ]
}
