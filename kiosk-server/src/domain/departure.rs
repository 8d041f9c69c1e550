//! Departure records and per-stop payloads.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use super::stop::StopId;
use super::time::abs_diff;

/// Where a departure record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Real-time feed, possibly delay-adjusted.
    Live,
    /// Static, pre-published timetable.
    Plan,
}

impl Source {
    /// Wire representation (`"LIVE"` / `"PLAN"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Live => "LIVE",
            Source::Plan => "PLAN",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled or live departure from a stop.
///
/// Delay information only exists on live records. The fields are private
/// and the two constructors are the only way in, so a planned departure
/// can never carry a delay or an adjusted time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    route_short_name: String,
    headsign: String,
    scheduled: DateTime<Utc>,
    delay_secs: Option<i64>,
    adjusted: Option<DateTime<Utc>>,
    source: Source,
}

impl Departure {
    /// A departure from the static timetable.
    pub fn planned(
        route_short_name: impl Into<String>,
        headsign: impl Into<String>,
        scheduled: DateTime<Utc>,
    ) -> Self {
        Self {
            route_short_name: route_short_name.into(),
            headsign: headsign.into(),
            scheduled,
            delay_secs: None,
            adjusted: None,
            source: Source::Plan,
        }
    }

    /// A departure from the real-time feed.
    pub fn live(
        route_short_name: impl Into<String>,
        headsign: impl Into<String>,
        scheduled: DateTime<Utc>,
        delay_secs: Option<i64>,
        adjusted: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            route_short_name: route_short_name.into(),
            headsign: headsign.into(),
            scheduled,
            delay_secs,
            adjusted,
            source: Source::Live,
        }
    }

    /// Route label, e.g. "70".
    pub fn route_short_name(&self) -> &str {
        &self.route_short_name
    }

    /// Destination / direction label.
    pub fn headsign(&self) -> &str {
        &self.headsign
    }

    /// Planned departure instant.
    pub fn scheduled(&self) -> DateTime<Utc> {
        self.scheduled
    }

    /// Deviation from the schedule in seconds (positive = late).
    pub fn delay_secs(&self) -> Option<i64> {
        self.delay_secs
    }

    /// Delay-adjusted departure instant, live records only.
    pub fn adjusted(&self) -> Option<DateTime<Utc>> {
        self.adjusted
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn is_live(&self) -> bool {
        self.source == Source::Live
    }

    /// The instant used for ordering and display: adjusted if known,
    /// otherwise scheduled.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.adjusted.unwrap_or(self.scheduled)
    }

    /// Whether two records plausibly describe the same physical trip:
    /// same route, same headsign, and scheduled times no further apart
    /// than `tolerance` (inclusive).
    pub fn same_trip(&self, other: &Departure, tolerance: Duration) -> bool {
        self.route_short_name == other.route_short_name
            && self.headsign == other.headsign
            && abs_diff(self.scheduled, other.scheduled) <= tolerance
    }
}

/// A data-quality problem found while reading a feed.
///
/// The offending entry is dropped; the rest of the feed stays usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataIssue {
    /// Feed the entry came from.
    pub source: Source,
    /// Position of the entry in the upstream list.
    pub index: usize,
    /// Field that failed validation.
    pub field: &'static str,
    /// The rejected raw value.
    pub value: String,
    /// Human-readable reason.
    pub reason: String,
}

impl fmt::Display for DataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} departure #{}: bad {} {:?} ({})",
            self.source, self.index, self.field, self.value, self.reason
        )
    }
}

/// Departures read from one upstream feed for one stop, after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub stop_id: StopId,
    /// When the upstream produced this data.
    pub as_of: DateTime<Utc>,
    pub departures: Vec<Departure>,
    /// Entries that were rejected during validation.
    pub issues: Vec<DataIssue>,
}

impl ParsedFeed {
    /// A feed with no departures, stamped at `as_of`.
    pub fn empty(stop_id: StopId, as_of: DateTime<Utc>) -> Self {
        Self {
            stop_id,
            as_of,
            departures: Vec::new(),
            issues: Vec::new(),
        }
    }
}

/// How complete the inputs to a merged payload were.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Both feeds were available.
    Complete,
    /// One feed failed and the payload was built from the other only.
    Degraded { missing: Source, reason: String },
}

/// The merged departure list for one stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeparturesPayload {
    pub stop_id: StopId,
    pub updated_at: DateTime<Utc>,
    /// Sorted by effective time, soonest first.
    pub departures: Vec<Departure>,
    /// Entries dropped from either feed.
    pub issues: Vec<DataIssue>,
    pub freshness: Freshness,
}

impl DeparturesPayload {
    /// Mark this payload as built without one of its feeds.
    pub fn degraded(mut self, missing: Source, reason: impl Into<String>) -> Self {
        self.freshness = Freshness::Degraded {
            missing,
            reason: reason.into(),
        };
        self
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.freshness, Freshness::Degraded { .. })
    }

    /// Human-readable notice for degraded payloads.
    pub fn notice(&self) -> Option<String> {
        match &self.freshness {
            Freshness::Complete => None,
            Freshness::Degraded { missing, reason } => Some(format!(
                "{missing} departures unavailable ({reason}); showing {} data only",
                match missing {
                    Source::Live => Source::Plan,
                    Source::Plan => Source::Live,
                }
            )),
        }
    }
}
