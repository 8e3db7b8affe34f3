use crate::error::{Result, ScraperError};
use crate::types::{PriceDocument, PricePoint, Station, StationHistory};
use chrono::NaiveDate;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// JSON file holding the price history of every station
pub struct PriceHistoryStore {
    path: PathBuf,
}

impl PriceHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, or an empty one if the file doesn't exist yet
    pub fn load(&self) -> Result<PriceDocument> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No price document at {}, starting empty", self.path.display());
                return Ok(PriceDocument::default());
            }
            Err(e) => return Err(e.into()),
        };

        let document: PriceDocument =
            serde_json::from_str(&content).map_err(|source| ScraperError::CorruptDocument {
                path: self.path.display().to_string(),
                source,
            })?;
        debug!(
            "Loaded price document with {} stations from {}",
            document.stations.len(),
            self.path.display()
        );
        Ok(document)
    }

    /// Stamp `last_updated` with `today` and replace the file in one rename.
    ///
    /// The stamp is written on every save, whether or not any series changed:
    /// it records when the document was last checked.
    pub fn save(&self, document: &mut PriceDocument, today: NaiveDate) -> Result<()> {
        document.last_updated = Some(today);
        let mut payload = serde_json::to_string_pretty(document)?;
        payload.push('\n');

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Write next to the target so the rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(payload.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        info!("Saved price document to {}", self.path.display());
        Ok(())
    }
}

/// History entry for `station`, created with the station's name if missing
pub fn ensure_station<'a>(
    document: &'a mut PriceDocument,
    station: &Station,
) -> &'a mut StationHistory {
    let history = document
        .stations
        .entry(station.id.clone())
        .or_insert_with(|| StationHistory::new(station.name.clone(), &station.fuel));
    history.points_mut(&station.fuel);
    history
}

pub fn has_entry_for_date(points: &[PricePoint], date: NaiveDate) -> bool {
    points.iter().any(|point| point.date == date)
}

/// Record `price` for `date`, keeping the series sorted by date.
///
/// Fails with `DuplicateEntry` if the date is already present.
pub fn append(points: &mut Vec<PricePoint>, date: NaiveDate, price: f64) -> Result<()> {
    if has_entry_for_date(points, date) {
        return Err(ScraperError::DuplicateEntry { date });
    }
    let position = points.partition_point(|point| point.date < date);
    points.insert(position, PricePoint { date, price });
    Ok(())
}

/// Keep only the newest `max_entries` points. `None` keeps everything.
///
/// Returns how many points were dropped.
pub fn trim(points: &mut Vec<PricePoint>, max_entries: Option<usize>) -> usize {
    match max_entries {
        Some(max) if points.len() > max => {
            let excess = points.len() - max;
            points.drain(..excess);
            excess
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtractionRule;
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn station() -> Station {
        Station {
            id: "tinq".to_string(),
            name: "TinQ Weesp".to_string(),
            url: "https://example.com/tinq".to_string(),
            fuel: "e10".to_string(),
            rule: ExtractionRule::Fragments {
                selector: ".price".to_string(),
            },
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = PriceHistoryStore::new(dir.path().join("prices.json"));
        let doc = store.load().unwrap();
        assert!(doc.stations.is_empty());
        assert_eq!(doc.last_updated, None);
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.json");
        fs::write(&path, "{ not json").unwrap();
        let store = PriceHistoryStore::new(&path);
        assert!(matches!(store.load(), Err(ScraperError::CorruptDocument { .. })));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = PriceHistoryStore::new(dir.path().join("data").join("prices.json"));

        let mut doc = PriceDocument::default();
        let history = ensure_station(&mut doc, &station());
        append(history.points_mut("e10"), day(1), 1.929).unwrap();
        store.save(&mut doc, day(2)).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.last_updated, Some(day(2)));
        assert_eq!(loaded, doc);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"lastUpdated\": \"2026-03-02\""));
    }

    #[test]
    fn test_save_stamps_even_without_changes() {
        let dir = tempdir().unwrap();
        let store = PriceHistoryStore::new(dir.path().join("prices.json"));
        let mut doc = PriceDocument::default();
        store.save(&mut doc, day(9)).unwrap();
        assert_eq!(store.load().unwrap().last_updated, Some(day(9)));
    }

    #[test]
    fn test_ensure_station_is_idempotent() {
        let mut doc = PriceDocument::default();
        append(ensure_station(&mut doc, &station()).points_mut("e10"), day(1), 1.9).unwrap();

        let mut renamed = station();
        renamed.name = "Renamed".to_string();
        let history = ensure_station(&mut doc, &renamed);

        assert_eq!(history.name, "TinQ Weesp");
        assert_eq!(history.points("e10").len(), 1);
        assert_eq!(doc.stations.len(), 1);
    }

    #[test]
    fn test_append_rejects_duplicate_date() {
        let mut points = Vec::new();
        append(&mut points, day(1), 1.9).unwrap();
        assert!(has_entry_for_date(&points, day(1)));
        assert!(!has_entry_for_date(&points, day(2)));

        assert!(matches!(
            append(&mut points, day(1), 2.0),
            Err(ScraperError::DuplicateEntry { .. })
        ));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].price, 1.9);
    }

    #[test]
    fn test_append_keeps_date_order() {
        let mut points = Vec::new();
        append(&mut points, day(3), 1.3).unwrap();
        append(&mut points, day(1), 1.1).unwrap();
        append(&mut points, day(2), 1.2).unwrap();
        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn test_retention_keeps_most_recent() {
        let mut points = Vec::new();
        for d in 1..=5 {
            append(&mut points, day(d), d as f64).unwrap();
        }
        append(&mut points, day(6), 6.0).unwrap();

        assert_eq!(trim(&mut points, Some(3)), 3);
        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(4), day(5), day(6)]);
    }

    #[test]
    fn test_unlimited_retention() {
        let mut points = Vec::new();
        for d in 1..=5 {
            append(&mut points, day(d), 1.0).unwrap();
        }
        assert_eq!(trim(&mut points, None), 0);
        assert_eq!(points.len(), 5);
    }
}
