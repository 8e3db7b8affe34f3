//! Calendar bucketing of price histories for charting.
//!
//! A view is a granularity plus an anchor date. Every station's series is laid
//! out on the same dense date axis, with `None` where a station has no sample,
//! so the series line up point for point.

use crate::app::ports::HttpClientPort;
use crate::error::{Result, ScraperError};
use crate::storage::PriceHistoryStore;
use crate::types::{PriceDocument, PricePoint};
use chrono::{Datelike, Duration, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    #[default]
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    /// First day of the bucket containing `anchor` (weeks start on Monday).
    /// `None` only at the edge of the representable calendar.
    pub fn bucket_start(self, anchor: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Day => Some(anchor),
            Granularity::Week => {
                let offset = anchor.weekday().num_days_from_monday() as i64;
                anchor.checked_sub_signed(Duration::days(offset))
            }
            Granularity::Month => anchor.with_day(1),
            Granularity::Quarter => {
                let month = (anchor.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(anchor.year(), month, 1)
            }
            Granularity::Year => NaiveDate::from_ymd_opt(anchor.year(), 1, 1),
        }
    }

    /// First day of the following bucket
    pub fn bucket_end(self, anchor: NaiveDate) -> Option<NaiveDate> {
        self.shift(self.bucket_start(anchor)?, 1)
    }

    /// Move `anchor` by `steps` buckets. Month-based steps clamp to the last
    /// day of the target month. `None` when the result leaves chrono's range.
    pub fn shift(self, anchor: NaiveDate, steps: i32) -> Option<NaiveDate> {
        match self {
            Granularity::Day => anchor.checked_add_signed(Duration::days(steps as i64)),
            Granularity::Week => anchor.checked_add_signed(Duration::days(7 * steps as i64)),
            Granularity::Month => add_months(anchor, steps),
            Granularity::Quarter => add_months(anchor, steps.checked_mul(3)?),
            Granularity::Year => add_months(anchor, steps.checked_mul(12)?),
        }
    }

    /// Human-readable bucket name, e.g. `2026-W14`, `2026-04`, `2026-Q2`
    pub fn label(self, anchor: NaiveDate) -> String {
        match self {
            Granularity::Day => anchor.format("%Y-%m-%d").to_string(),
            Granularity::Week => {
                let iso = anchor.iso_week();
                format!("{}-W{:02}", iso.year(), iso.week())
            }
            Granularity::Month => anchor.format("%Y-%m").to_string(),
            Granularity::Quarter => format!("{}-Q{}", anchor.year(), anchor.month0() / 3 + 1),
            Granularity::Year => anchor.year().to_string(),
        }
    }
}

fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

/// Dates shown for a view.
///
/// `Day` shows the anchor with its neighbours (three dates) for trend context;
/// every other granularity shows each calendar day of the bucket. `None` when
/// the bucket runs past the representable calendar.
pub fn visible_dates(granularity: Granularity, anchor: NaiveDate) -> Option<Vec<NaiveDate>> {
    if granularity == Granularity::Day {
        return Some(vec![anchor.pred_opt()?, anchor, anchor.succ_opt()?]);
    }

    let start = granularity.bucket_start(anchor)?;
    let end = granularity.bucket_end(anchor)?;
    Some(start.iter_days().take_while(|date| *date < end).collect())
}

fn out_of_range() -> ScraperError {
    ScraperError::Config("anchor out of range".to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSeries {
    pub station_id: String,
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub granularity: Granularity,
    pub anchor: NaiveDate,
    pub label: String,
    pub dates: Vec<NaiveDate>,
    pub series: Vec<StationSeries>,
}

/// Align every station's `grade` series on the view's date axis
pub fn build_view(
    document: &PriceDocument,
    grade: &str,
    granularity: Granularity,
    anchor: NaiveDate,
) -> Result<SeriesView> {
    let dates = visible_dates(granularity, anchor).ok_or_else(out_of_range)?;

    let series = document
        .stations
        .iter()
        .map(|(id, history)| {
            let by_date: HashMap<NaiveDate, f64> = history
                .points(grade)
                .iter()
                .map(|point| (point.date, point.price))
                .collect();
            StationSeries {
                station_id: id.clone(),
                name: history.name.clone(),
                values: dates.iter().map(|date| by_date.get(date).copied()).collect(),
            }
        })
        .collect();

    Ok(SeriesView {
        granularity,
        anchor,
        label: granularity.label(anchor),
        dates,
        series,
    })
}

impl fmt::Display for SeriesView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:?} {}", self.granularity, self.label)?;
        write!(f, "{:<12}", "date")?;
        for series in &self.series {
            write!(f, " {:>28}", series.name)?;
        }
        writeln!(f)?;

        for (idx, date) in self.dates.iter().enumerate() {
            write!(f, "{:<12}", date.format("%Y-%m-%d").to_string())?;
            for series in &self.series {
                match series.values[idx] {
                    Some(price) => write!(f, " {:>28.3}", price)?,
                    None => write!(f, " {:>28}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Current view selection, updated in place by navigation
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub granularity: Granularity,
    pub anchor: NaiveDate,
    pub grade: String,
}

impl ViewState {
    pub fn new(granularity: Granularity, anchor: NaiveDate, grade: impl Into<String>) -> Self {
        Self {
            granularity,
            anchor,
            grade: grade.into(),
        }
    }

    pub fn previous(&mut self) -> Result<()> {
        self.navigate(-1)
    }

    pub fn next(&mut self) -> Result<()> {
        self.navigate(1)
    }

    /// Move by `steps` buckets; negative goes back in time. The anchor is left
    /// unchanged when the target is out of range.
    pub fn navigate(&mut self, steps: i32) -> Result<()> {
        self.anchor = self
            .granularity
            .shift(self.anchor, steps)
            .ok_or_else(out_of_range)?;
        Ok(())
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.granularity = granularity;
    }

    pub fn render(&self, document: &PriceDocument) -> Result<SeriesView> {
        build_view(document, &self.grade, self.granularity, self.anchor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub station_id: String,
    pub name: String,
    pub days: usize,
    pub latest: Option<PricePoint>,
}

/// Days recorded and latest point per station
pub fn summarize(document: &PriceDocument, grade: &str) -> Vec<StationSummary> {
    document
        .stations
        .iter()
        .map(|(id, history)| {
            let points = history.points(grade);
            StationSummary {
                station_id: id.clone(),
                name: history.name.clone(),
                days: points.len(),
                latest: points.last().copied(),
            }
        })
        .collect()
}

/// Load a document from a local path or an `http(s)://` URL.
///
/// A non-success HTTP response is returned as a `Fetch` error. Unlike a fetch
/// run, a view has nothing to show for a missing local file, so that is an
/// error as well.
pub async fn load_document(source: &str, http: &dyn HttpClientPort) -> Result<PriceDocument> {
    if !(source.starts_with("http://") || source.starts_with("https://")) {
        let store = PriceHistoryStore::new(source);
        if !store.path().exists() {
            return Err(ScraperError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("price document not found: {}", source),
            )));
        }
        return store.load();
    }

    info!("Loading price document from {}", source);
    let response = http.get(source).await?;
    if !response.is_success() {
        return Err(ScraperError::Fetch {
            url: source.to_string(),
            message: format!("could not load price document (HTTP status {})", response.status),
        });
    }
    debug!("Received {} bytes of price document", response.body.len());

    serde_json::from_str(&response.body).map_err(|source_err| ScraperError::CorruptDocument {
        path: source.to_string(),
        source: source_err,
    })
}
