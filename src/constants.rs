//! Default locations and parameters shared across the crate

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_DATA_FILE: &str = "prices.json";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/124.0 Safari/537.36"
);

/// Fuel grade tracked by the built-in stations
pub const E10: &str = "e10";

/// Attribute carrying the machine-readable price on selector-max pages
pub const DEFAULT_PRICE_ATTRIBUTE: &str = "content";

// Label-adjacent-value defaults (definition lists: <dt>Pompprijs</dt><dd>€ 1,929</dd>)
pub const DEFAULT_LABEL_SELECTOR: &str = "dt";
pub const DEFAULT_LABEL_MARKER: &str = "Pompprijs";
pub const DEFAULT_VALUE_TAG: &str = "dd";

// Built-in stations
pub const TINQ_WEESP_ID: &str = "tinq_weesp_hogeweyselaan";
pub const TINQ_WEESP_NAME: &str = "TinQ Weesp – Hogeweyselaan";
pub const TINQ_WEESP_URL: &str = "https://www.tinq.nl/tankstations/weesp-hogeweyselaan";
pub const TINQ_PRICE_SELECTOR: &str = ".field--name-field-prices-price-pump";

pub const TANGO_WEESP_ID: &str = "tango_weesp_hogeweyselaan";
pub const TANGO_WEESP_NAME: &str = "Tango Weesp – Hogeweyselaan";
pub const TANGO_WEESP_URL: &str = "https://www.tango.nl/stations/tango-weesp";

// Environment overrides
pub const ENV_DATA_FILE: &str = "FUEL_DATA_FILE";
pub const ENV_MAX_ENTRIES: &str = "FUEL_MAX_ENTRIES";
pub const ENV_PUSHGATEWAY_URL: &str = "FUEL_PUSHGATEWAY_URL";
