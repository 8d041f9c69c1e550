//! Feed wire DTOs.
//!
//! These types map directly to the JSON exchanged with the upstream feeds
//! and served on `/online/{stopId}` and `/plan/{stopId}`. Timestamps stay
//! as strings here; `convert` is where they get validated.

use serde::{Deserialize, Serialize};

/// A departure as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureDto {
    /// Route label, e.g. "70".
    pub route_short_name: String,

    /// Destination / direction label.
    pub headsign: String,

    /// Planned departure (ISO-8601 with offset).
    pub scheduled: String,

    /// Deviation in seconds (positive = late). Live only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_sec: Option<i64>,

    /// Delay-adjusted departure (ISO-8601 with offset). Live only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted: Option<String>,

    /// `"LIVE"` or `"PLAN"`. Informational: the feed a record arrives
    /// on decides its source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A data-quality report entry on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataIssueDto {
    pub source: String,
    pub index: usize,
    pub field: String,
    pub value: String,
    pub reason: String,
}

/// Live departures for one stop (`GetOnlineStopTime`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineStopTimes {
    pub stop_id: String,

    /// When the upstream produced this snapshot.
    pub updated_at: String,

    #[serde(default)]
    pub departures: Vec<DepartureDto>,

    /// Entries we dropped while validating (our own responses only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_issues: Vec<DataIssueDto>,
}

/// Planned departures for one stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTimetable {
    pub stop_id: String,

    /// When the timetable was generated.
    pub generated_at: String,

    #[serde(default)]
    pub departures: Vec<DepartureDto>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_issues: Vec<DataIssueDto>,
}
