use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("No price found: {0}")]
    NoPriceFound(String),

    #[error("Label containing '{0}' not found")]
    LabelNotFound(String),

    #[error("No value element next to label '{0}'")]
    ValueNotFound(String),

    #[error("Invalid price format: '{0}'")]
    InvalidPriceFormat(String),

    #[error("Invalid CSS selector '{0}'")]
    InvalidSelector(String),

    #[error("Corrupt price document at {path}: {source}")]
    CorruptDocument {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("A price for {date} is already recorded")]
    DuplicateEntry { date: NaiveDate },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScraperError {
    /// Short, stable label for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ScraperError::Http(_) | ScraperError::Fetch { .. } => "fetch",
            ScraperError::NoPriceFound(_) => "no_price_found",
            ScraperError::LabelNotFound(_) => "label_not_found",
            ScraperError::ValueNotFound(_) => "value_not_found",
            ScraperError::InvalidPriceFormat(_) => "invalid_price_format",
            ScraperError::InvalidSelector(_) => "invalid_selector",
            ScraperError::CorruptDocument { .. } => "corrupt_document",
            ScraperError::DuplicateEntry { .. } => "duplicate_entry",
            ScraperError::Json(_) => "json",
            ScraperError::Toml(_) => "toml",
            ScraperError::Io(_) => "io",
            ScraperError::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
