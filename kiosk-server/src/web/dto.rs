//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{DeparturesPayload, format_timestamp};
use crate::feed::{DataIssueDto, DepartureDto};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub server_time: String,
}

/// Merged departures for a stop.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeparturesResponse {
    pub stop_id: String,

    /// When the merge was computed
    pub updated_at: String,

    /// Soonest first
    pub departures: Vec<DepartureDto>,

    /// Entries dropped because they could not be parsed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_issues: Vec<DataIssueDto>,

    /// True when one of the feeds was unavailable
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,

    /// Explanation for degraded responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl DeparturesResponse {
    /// Create from a merged payload.
    pub fn from_payload(payload: &DeparturesPayload) -> Self {
        Self {
            stop_id: payload.stop_id.as_str().to_string(),
            updated_at: format_timestamp(payload.updated_at),
            departures: payload
                .departures
                .iter()
                .map(DepartureDto::from_departure)
                .collect(),
            data_issues: payload.issues.iter().map(DataIssueDto::from_issue).collect(),
            degraded: payload.is_degraded(),
            notice: payload.notice(),
        }
    }
}

/// Query for the kiosk page.
#[derive(Debug, Deserialize)]
pub struct KioskQuery {
    /// Stop to show
    pub stop: Option<String>,

    /// Display name of the stop
    pub name: Option<String>,

    /// Optional route description ("via") line
    pub via: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Machine-readable error kind
    pub kind: String,
}
