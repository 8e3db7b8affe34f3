//! Run metrics for the fetch job.
//!
//! Counters are recorded through the `metrics` facade and are no-ops unless a
//! recorder is installed. Since each run is a short-lived process, the
//! Prometheus snapshot is pushed to a Pushgateway at the end instead of being
//! scraped.

use crate::constants::ENV_PUSHGATEWAY_URL;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const STATIONS_APPENDED: &str = "fuel_stations_appended_total";
pub const STATIONS_SKIPPED: &str = "fuel_stations_skipped_total";
pub const STATIONS_FAILED: &str = "fuel_stations_failed_total";
pub const FETCH_DURATION: &str = "fuel_fetch_duration_seconds";
pub const PAYLOAD_BYTES: &str = "fuel_payload_bytes";
pub const LAST_PRICE: &str = "fuel_last_price";

/// Install the Prometheus recorder when a Pushgateway is configured.
///
/// Idempotent; returns whether a recorder is active.
pub fn init_metrics() -> bool {
    if HANDLE.get().is_some() {
        return true;
    }
    let configured = std::env::var(ENV_PUSHGATEWAY_URL)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false);
    if !configured {
        return false;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
            info!("Prometheus recorder installed");
            true
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            false
        }
    }
}

pub struct FetchMetrics;

impl FetchMetrics {
    pub fn record_appended(station_id: &str, price: f64) {
        ::metrics::counter!(STATIONS_APPENDED, "station" => station_id.to_string()).increment(1);
        ::metrics::gauge!(LAST_PRICE, "station" => station_id.to_string()).set(price);
    }

    pub fn record_skipped(station_id: &str) {
        ::metrics::counter!(STATIONS_SKIPPED, "station" => station_id.to_string()).increment(1);
    }

    pub fn record_failed(station_id: &str, error_kind: &'static str) {
        ::metrics::counter!(
            STATIONS_FAILED,
            "station" => station_id.to_string(),
            "error_type" => error_kind
        )
        .increment(1);
    }

    pub fn record_fetch(duration_secs: f64, payload_bytes: usize) {
        ::metrics::histogram!(FETCH_DURATION).record(duration_secs);
        ::metrics::histogram!(PAYLOAD_BYTES).record(payload_bytes as f64);
    }
}

/// Push the current snapshot to the Pushgateway, if one is configured.
/// Failures are logged and otherwise ignored.
pub async fn push_metrics(instance: &str) {
    let Some(handle) = HANDLE.get() else {
        return;
    };
    let base = match std::env::var(ENV_PUSHGATEWAY_URL) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return,
    };
    let push_url = format!(
        "{}/metrics/job/fuel_price_scraper/instance/{}",
        base.trim_end_matches('/'),
        instance
    );

    let result = reqwest::Client::new()
        .post(&push_url)
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(handle.render())
        .send()
        .await;

    match result {
        Ok(r) if r.status().is_success() => {
            info!("Pushed metrics to Pushgateway for instance={}", instance);
        }
        Ok(r) => {
            warn!("Pushgateway push responded with status {}", r.status().as_u16());
        }
        Err(e) => {
            warn!("Failed to push metrics to Pushgateway: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        FetchMetrics::record_appended("tinq", 1.929);
        FetchMetrics::record_skipped("tinq");
        FetchMetrics::record_failed("tango", "fetch");
        FetchMetrics::record_fetch(0.2, 1024);
    }

    #[test]
    fn test_metric_names_are_prefixed() {
        for name in [
            STATIONS_APPENDED,
            STATIONS_SKIPPED,
            STATIONS_FAILED,
            FETCH_DURATION,
            PAYLOAD_BYTES,
            LAST_PRICE,
        ] {
            assert!(name.starts_with("fuel_"));
        }
    }
}
