use crate::app::ports::HttpClientPort;
use crate::error::{Result, ScraperError};
use crate::metrics::FetchMetrics;
use crate::parser;
use crate::storage::{self, PriceHistoryStore};
use crate::types::{PriceDocument, Station};
use chrono::NaiveDate;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// What happened to one station during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StationOutcome {
    Appended { price: f64 },
    AlreadyRecorded,
    Failed { kind: &'static str, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StationReport {
    pub station_id: String,
    pub station_name: String,
    pub outcome: StationOutcome,
}

/// Result of a complete run over the configured stations
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub date: NaiveDate,
    pub stations: Vec<StationReport>,
    /// Points dropped by the retention cap
    pub trimmed: usize,
}

impl RunReport {
    pub fn appended_count(&self) -> usize {
        self.count(|o| matches!(o, StationOutcome::Appended { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, StationOutcome::AlreadyRecorded))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, StationOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    fn count(&self, pred: impl Fn(&StationOutcome) -> bool) -> usize {
        self.stations.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// Fetches, extracts and records one price per station, in order.
///
/// A failing station is reported and skipped; it never stops the others.
pub struct FetchRunner<'a> {
    http: &'a dyn HttpClientPort,
    max_entries: Option<usize>,
}

impl<'a> FetchRunner<'a> {
    pub fn new(http: &'a dyn HttpClientPort, max_entries: Option<usize>) -> Self {
        Self { http, max_entries }
    }

    pub async fn run(
        &self,
        document: &mut PriceDocument,
        stations: &[Station],
        today: NaiveDate,
    ) -> RunReport {
        let run_id = Uuid::new_v4();
        info!("Starting run {} for {} with {} stations", run_id, today, stations.len());

        let mut reports = Vec::with_capacity(stations.len());
        let mut trimmed = 0;

        for station in stations {
            let span = info_span!("station", id = %station.id, run_id = %run_id);
            let (outcome, dropped) = self
                .run_station(document, station, today)
                .instrument(span)
                .await;
            trimmed += dropped;
            reports.push(StationReport {
                station_id: station.id.clone(),
                station_name: station.name.clone(),
                outcome,
            });
        }

        let report = RunReport {
            run_id,
            date: today,
            stations: reports,
            trimmed,
        };
        info!(
            "Run {} finished: {} appended, {} already recorded, {} failed",
            run_id,
            report.appended_count(),
            report.skipped_count(),
            report.failed_count()
        );
        report
    }

    async fn run_station(
        &self,
        document: &mut PriceDocument,
        station: &Station,
        today: NaiveDate,
    ) -> (StationOutcome, usize) {
        let history = storage::ensure_station(document, station);
        if storage::has_entry_for_date(history.points(&station.fuel), today) {
            info!("{}: price for {} already recorded, skipping", station.name, today);
            FetchMetrics::record_skipped(&station.id);
            return (StationOutcome::AlreadyRecorded, 0);
        }

        info!("{}: fetching {}", station.name, station.url);
        let price = match self.fetch_price(station).await {
            Ok(price) => price,
            Err(e) => return (self.failed(station, e), 0),
        };

        let points = storage::ensure_station(document, station).points_mut(&station.fuel);
        if let Err(e) = storage::append(points, today, price) {
            return (self.failed(station, e), 0);
        }
        let dropped = storage::trim(points, self.max_entries);
        if dropped > 0 {
            debug!("{}: retention dropped {} old points", station.name, dropped);
        }

        info!("{}: {} price €{}", station.name, station.fuel.to_uppercase(), price);
        FetchMetrics::record_appended(&station.id, price);
        (StationOutcome::Appended { price }, dropped)
    }

    async fn fetch_price(&self, station: &Station) -> Result<f64> {
        let started = Instant::now();
        let page = self.http.get(&station.url).await?;
        FetchMetrics::record_fetch(started.elapsed().as_secs_f64(), page.body.len());

        if !page.is_success() {
            return Err(ScraperError::Fetch {
                url: station.url.clone(),
                message: format!("HTTP status {}", page.status),
            });
        }
        debug!("Received {} bytes ({})", page.body.len(), page.content_type);

        parser::extract(&page.body, &station.rule)
    }

    fn failed(&self, station: &Station, e: ScraperError) -> StationOutcome {
        error!("{}: {}", station.name, e);
        FetchMetrics::record_failed(&station.id, e.kind());
        StationOutcome::Failed {
            kind: e.kind(),
            error: e.to_string(),
        }
    }
}

/// Load the document, run every station, save once.
///
/// Only a corrupt or unreadable document (or a failed save) is an error here;
/// per-station failures end up in the report.
pub async fn run_once(
    store: &PriceHistoryStore,
    stations: &[Station],
    http: &dyn HttpClientPort,
    max_entries: Option<usize>,
    today: NaiveDate,
) -> Result<RunReport> {
    let mut document = store.load()?;

    let report = FetchRunner::new(http, max_entries)
        .run(&mut document, stations, today)
        .await;
    if report.has_failures() {
        warn!(
            "{} of {} stations failed; saving the rest",
            report.failed_count(),
            report.stations.len()
        );
    }

    store.save(&mut document, today)?;
    Ok(report)
}
