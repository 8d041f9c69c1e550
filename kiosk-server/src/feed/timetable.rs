//! Planned timetables loaded from disk.
//!
//! Loads per-stop timetables from JSON files and serves them as the plan
//! feed. Files are read once at startup (and on `reload`); validation
//! happens per request so data issues are reported alongside each answer.
//!
//! A timetable covers a whole day, so departures that have already left
//! are dropped on every request. They are kept for one matching window
//! past their scheduled time so a late live departure can still claim
//! its planned entry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::domain::{ParsedFeed, StopId};
use crate::reconcile::DEFAULT_TOLERANCE_SECS;

use super::convert::convert_plan;
use super::error::FeedError;
use super::types::PlanTimetable;

/// Timetables keyed by stop.
#[derive(Clone)]
pub struct Timetable {
    dir: PathBuf,
    stops: Arc<RwLock<HashMap<StopId, PlanTimetable>>>,
    /// How long after its scheduled time a departure is still served
    grace: Duration,
}

impl Timetable {
    /// Load every timetable in a directory.
    ///
    /// Expects files named `{stopId}.json` in the `/plan/{stopId}` shape.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let dir = dir.as_ref().to_path_buf();
        let stops = read_dir(&dir)?;

        Ok(Self {
            dir,
            stops: Arc::new(RwLock::new(stops)),
            grace: Duration::seconds(DEFAULT_TOLERANCE_SECS),
        })
    }

    /// Validated planned departures for a stop that have not yet left.
    ///
    /// Departures scheduled more than the grace window before `now` are
    /// omitted.
    pub async fn get(&self, stop_id: &StopId, now: DateTime<Utc>) -> Result<ParsedFeed, FeedError> {
        let stops = self.stops.read().await;
        let timetable = stops
            .get(stop_id)
            .ok_or_else(|| FeedError::StopNotFound(stop_id.to_string()))?;

        let mut feed = convert_plan(timetable, stop_id)?;
        if let Some(cutoff) = now.checked_sub_signed(self.grace) {
            feed.departures.retain(|d| d.scheduled() >= cutoff);
        }

        Ok(feed)
    }

    /// Stops with a timetable, sorted.
    pub async fn available_stops(&self) -> Vec<StopId> {
        let stops = self.stops.read().await;
        let mut ids: Vec<_> = stops.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Re-read the directory, replacing all timetables.
    ///
    /// On error the previously loaded timetables stay in place.
    pub async fn reload(&self) -> Result<usize, FeedError> {
        let fresh = read_dir(&self.dir)?;
        let count = fresh.len();
        *self.stops.write().await = fresh;
        Ok(count)
    }
}

fn read_dir(dir: &Path) -> Result<HashMap<StopId, PlanTimetable>, FeedError> {
    let entries = std::fs::read_dir(dir).map_err(|e| FeedError::Io {
        message: format!("failed to read timetable directory {}: {e}", dir.display()),
    })?;

    let mut stops = HashMap::new();

    for entry in entries {
        let entry = entry.map_err(|e| FeedError::Io {
            message: format!("failed to read directory entry: {e}"),
        })?;

        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| FeedError::Io {
                message: format!("invalid filename: {}", path.display()),
            })?;

        let stop_id = StopId::parse(stem).map_err(|e| FeedError::Io {
            message: format!("{}: {e}", path.display()),
        })?;

        let json = std::fs::read_to_string(&path).map_err(|e| FeedError::Io {
            message: format!("failed to read {}: {e}", path.display()),
        })?;

        let timetable: PlanTimetable = serde_json::from_str(&json).map_err(|e| FeedError::Json {
            message: format!("{}: {e}", path.display()),
            body: None,
        })?;

        if timetable.stop_id != stop_id.as_str() {
            return Err(FeedError::Io {
                message: format!(
                    "{} declares stop {:?}, expected {}",
                    path.display(),
                    timetable.stop_id,
                    stop_id
                ),
            });
        }

        stops.insert(stop_id, timetable);
    }

    if stops.is_empty() {
        return Err(FeedError::Io {
            message: format!("no timetable files found in {}", dir.display()),
        });
    }

    Ok(stops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, h, m, 0).unwrap()
    }

    const TIMETABLE_1234: &str = r#"{
        "stopId": "1234",
        "generatedAt": "2026-10-19T04:00:00Z",
        "departures": [
            {"routeShortName": "70", "headsign": "Letisko", "scheduled": "2026-10-19T10:02:00Z"},
            {"routeShortName": "61", "headsign": "Hlavná stanica", "scheduled": "not-a-time"},
            {"routeShortName": "21", "headsign": "Dolné hony", "scheduled": "2026-10-19T10:25:00Z"}
        ]
    }"#;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[tokio::test]
    async fn loads_and_serves_stop() {
        let dir = tempdir().unwrap();
        write(dir.path(), "1234.json", TIMETABLE_1234);
        write(dir.path(), "README.txt", "ignored");

        let timetable = Timetable::load(dir.path()).unwrap();
        let stop = StopId::parse("1234").unwrap();

        assert_eq!(timetable.available_stops().await, vec![stop.clone()]);

        let feed = timetable.get(&stop, at(10, 0)).await.unwrap();
        assert_eq!(feed.departures.len(), 2);
        assert_eq!(feed.issues.len(), 1);
        assert_eq!(feed.issues[0].index, 1);
    }

    #[tokio::test]
    async fn unknown_stop_is_not_found() {
        let dir = tempdir().unwrap();
        write(dir.path(), "1234.json", TIMETABLE_1234);

        let timetable = Timetable::load(dir.path()).unwrap();
        let err = timetable
            .get(&StopId::parse("9999").unwrap(), at(10, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::StopNotFound(s) if s == "9999"));
    }

    #[tokio::test]
    async fn departed_entries_are_dropped_after_grace_window() {
        let dir = tempdir().unwrap();
        write(dir.path(), "1234.json", TIMETABLE_1234);
        let timetable = Timetable::load(dir.path()).unwrap();
        let stop = StopId::parse("1234").unwrap();

        // 10:02 left exactly three minutes ago: still matchable
        let feed = timetable.get(&stop, at(10, 5)).await.unwrap();
        let routes: Vec<_> = feed.departures.iter().map(|d| d.route_short_name()).collect();
        assert_eq!(routes, vec!["70", "21"]);

        let feed = timetable.get(&stop, at(10, 6)).await.unwrap();
        let routes: Vec<_> = feed.departures.iter().map(|d| d.route_short_name()).collect();
        assert_eq!(routes, vec!["21"]);

        // Issues are still reported for the whole file
        assert_eq!(feed.issues.len(), 1);

        let feed = timetable.get(&stop, at(11, 0)).await.unwrap();
        assert!(feed.departures.is_empty());
    }

    #[tokio::test]
    async fn bundled_sample_timetable() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/data/timetables");
        let timetable = Timetable::load(dir).unwrap();
        let stop = StopId::parse("1234").unwrap();

        // Hours after the first trip of the day, only later trips remain
        let feed = timetable.get(&stop, at(5, 30)).await.unwrap();
        assert!(feed.issues.is_empty());
        let first = &feed.departures[0];
        assert_eq!(first.route_short_name(), "39");
        assert_eq!(first.scheduled(), at(5, 31));
        assert_eq!(feed.departures.len(), 3);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Timetable::load(dir.path()),
            Err(FeedError::Io { .. })
        ));
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(Timetable::load("/definitely/not/here").is_err());
    }

    #[test]
    fn mismatched_stop_id_is_an_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), "5678.json", TIMETABLE_1234);
        assert!(Timetable::load(dir.path()).is_err());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), "1234.json", "{ not json");
        assert!(matches!(
            Timetable::load(dir.path()),
            Err(FeedError::Json { .. })
        ));
    }

    #[tokio::test]
    async fn reload_picks_up_new_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "1234.json", TIMETABLE_1234);
        let timetable = Timetable::load(dir.path()).unwrap();

        write(
            dir.path(),
            "5678.json",
            r#"{"stopId": "5678", "generatedAt": "2026-10-19T04:00:00Z", "departures": []}"#,
        );

        assert_eq!(timetable.reload().await.unwrap(), 2);
        assert_eq!(timetable.available_stops().await.len(), 2);
    }
}
