//! Conversion between feed DTOs and domain types.
//!
//! Inbound, every departure is validated on its own. An entry with an
//! unparsable `scheduled` or `adjusted` value is dropped and recorded as a
//! `DataIssue`; the rest of the feed is still returned. Only problems with
//! the feed envelope itself (wrong stop, bad snapshot time) fail the whole
//! conversion.

use crate::domain::{
    DataIssue, Departure, ParsedFeed, Source, StopId, add_seconds, format_timestamp,
    parse_timestamp,
};

use super::types::{DataIssueDto, DepartureDto, OnlineStopTimes, PlanTimetable};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// The feed answered for a different stop than the one asked for
    #[error("feed is for stop {got:?}, expected {expected}")]
    StopMismatch { expected: StopId, got: String },

    /// The feed's own snapshot time is unparsable
    #[error("invalid {field}: {value:?}")]
    InvalidSnapshotTime { field: &'static str, value: String },
}

/// Convert a live feed response.
pub fn convert_online(
    dto: &OnlineStopTimes,
    stop_id: &StopId,
) -> Result<ParsedFeed, ConversionError> {
    check_stop(&dto.stop_id, stop_id)?;
    let as_of = parse_timestamp(&dto.updated_at).map_err(|_| {
        ConversionError::InvalidSnapshotTime {
            field: "updatedAt",
            value: dto.updated_at.clone(),
        }
    })?;

    let (departures, issues) = convert_departures(&dto.departures, Source::Live);

    Ok(ParsedFeed {
        stop_id: stop_id.clone(),
        as_of,
        departures,
        issues,
    })
}

/// Convert a planned timetable.
pub fn convert_plan(dto: &PlanTimetable, stop_id: &StopId) -> Result<ParsedFeed, ConversionError> {
    check_stop(&dto.stop_id, stop_id)?;
    let as_of = parse_timestamp(&dto.generated_at).map_err(|_| {
        ConversionError::InvalidSnapshotTime {
            field: "generatedAt",
            value: dto.generated_at.clone(),
        }
    })?;

    let (departures, issues) = convert_departures(&dto.departures, Source::Plan);

    Ok(ParsedFeed {
        stop_id: stop_id.clone(),
        as_of,
        departures,
        issues,
    })
}

fn check_stop(got: &str, expected: &StopId) -> Result<(), ConversionError> {
    if got == expected.as_str() {
        Ok(())
    } else {
        Err(ConversionError::StopMismatch {
            expected: expected.clone(),
            got: got.to_string(),
        })
    }
}

/// Validate a list of wire departures as coming from `source`.
///
/// Returns the usable departures in their original order, plus one issue
/// per rejected entry.
pub fn convert_departures(
    dtos: &[DepartureDto],
    source: Source,
) -> (Vec<Departure>, Vec<DataIssue>) {
    let mut departures = Vec::with_capacity(dtos.len());
    let mut issues = Vec::new();

    for (index, dto) in dtos.iter().enumerate() {
        match convert_departure(dto, source) {
            Ok(d) => departures.push(d),
            Err((field, value, reason)) => issues.push(DataIssue {
                source,
                index,
                field,
                value,
                reason,
            }),
        }
    }

    (departures, issues)
}

type Rejection = (&'static str, String, String);

fn convert_departure(dto: &DepartureDto, source: Source) -> Result<Departure, Rejection> {
    let scheduled = parse_timestamp(&dto.scheduled)
        .map_err(|e| ("scheduled", dto.scheduled.clone(), e.reason().to_string()))?;

    if source == Source::Plan {
        if dto.delay_sec.is_some() || dto.adjusted.is_some() {
            tracing::debug!(
                route = %dto.route_short_name,
                "ignoring delay fields on planned departure"
            );
        }
        return Ok(Departure::planned(
            dto.route_short_name.clone(),
            dto.headsign.clone(),
            scheduled,
        ));
    }

    // The upstream's adjusted time wins; derive it from the delay otherwise.
    let adjusted = match (&dto.adjusted, dto.delay_sec) {
        (Some(raw), _) => Some(
            parse_timestamp(raw).map_err(|e| ("adjusted", raw.clone(), e.reason().to_string()))?,
        ),
        (None, Some(delay)) => Some(add_seconds(scheduled, delay).ok_or_else(|| {
            (
                "delaySec",
                delay.to_string(),
                "delay out of range".to_string(),
            )
        })?),
        (None, None) => None,
    };

    Ok(Departure::live(
        dto.route_short_name.clone(),
        dto.headsign.clone(),
        scheduled,
        dto.delay_sec,
        adjusted,
    ))
}

impl DepartureDto {
    /// Create from a domain departure.
    pub fn from_departure(d: &Departure) -> Self {
        Self {
            route_short_name: d.route_short_name().to_string(),
            headsign: d.headsign().to_string(),
            scheduled: format_timestamp(d.scheduled()),
            delay_sec: d.delay_secs(),
            adjusted: d.adjusted().map(format_timestamp),
            source: Some(d.source().as_str().to_string()),
        }
    }
}

impl DataIssueDto {
    /// Create from a domain data issue.
    pub fn from_issue(issue: &DataIssue) -> Self {
        Self {
            source: issue.source.as_str().to_string(),
            index: issue.index,
            field: issue.field.to_string(),
            value: issue.value.clone(),
            reason: issue.reason.clone(),
        }
    }
}

impl OnlineStopTimes {
    /// Create from a validated live feed.
    pub fn from_feed(feed: &ParsedFeed) -> Self {
        Self {
            stop_id: feed.stop_id.as_str().to_string(),
            updated_at: format_timestamp(feed.as_of),
            departures: feed
                .departures
                .iter()
                .map(DepartureDto::from_departure)
                .collect(),
            data_issues: feed.issues.iter().map(DataIssueDto::from_issue).collect(),
        }
    }
}

impl PlanTimetable {
    /// Create from a validated timetable.
    pub fn from_feed(feed: &ParsedFeed) -> Self {
        Self {
            stop_id: feed.stop_id.as_str().to_string(),
            generated_at: format_timestamp(feed.as_of),
            departures: feed
                .departures
                .iter()
                .map(DepartureDto::from_departure)
                .collect(),
            data_issues: feed.issues.iter().map(DataIssueDto::from_issue).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, h, m, 0).unwrap()
    }

    fn stop() -> StopId {
        StopId::parse("1234").unwrap()
    }

    fn dto(route: &str, scheduled: &str) -> DepartureDto {
        DepartureDto {
            route_short_name: route.into(),
            headsign: "Letisko".into(),
            scheduled: scheduled.into(),
            delay_sec: None,
            adjusted: None,
            source: None,
        }
    }

    fn plan_payload(departures: Vec<DepartureDto>) -> PlanTimetable {
        PlanTimetable {
            stop_id: "1234".into(),
            generated_at: "2026-10-19T10:00:00Z".into(),
            departures,
            data_issues: vec![],
        }
    }

    #[test]
    fn live_entry_keeps_upstream_adjusted() {
        let mut d = dto("70", "2026-10-19T10:02:00.000Z");
        d.delay_sec = Some(180);
        d.adjusted = Some("2026-10-19T10:05:00.000Z".into());

        let (deps, issues) = convert_departures(&[d], Source::Live);

        assert!(issues.is_empty());
        assert_eq!(deps[0].source(), Source::Live);
        assert_eq!(deps[0].delay_secs(), Some(180));
        assert_eq!(deps[0].adjusted(), Some(at(10, 5)));
    }

    #[test]
    fn live_entry_derives_adjusted_from_delay() {
        let mut d = dto("61", "2026-10-19T10:09:00Z");
        d.delay_sec = Some(-60);

        let (deps, _) = convert_departures(&[d], Source::Live);

        assert_eq!(deps[0].adjusted(), Some(at(10, 8)));
        assert_eq!(deps[0].effective_time(), at(10, 8));
    }

    #[test]
    fn live_entry_without_delay_is_on_time() {
        let (deps, _) = convert_departures(&[dto("39", "2026-10-19T10:18:00Z")], Source::Live);
        assert_eq!(deps[0].adjusted(), None);
        assert_eq!(deps[0].effective_time(), at(10, 18));
    }

    #[test]
    fn plan_entry_drops_delay_fields() {
        let mut d = dto("70", "2026-10-19T10:02:00Z");
        d.delay_sec = Some(120);
        d.adjusted = Some("2026-10-19T10:04:00Z".into());
        d.source = Some("LIVE".into());

        let (deps, issues) = convert_departures(&[d], Source::Plan);

        assert!(issues.is_empty());
        assert_eq!(deps[0].source(), Source::Plan);
        assert_eq!(deps[0].delay_secs(), None);
        assert_eq!(deps[0].adjusted(), None);
    }

    #[test]
    fn malformed_scheduled_is_reported_and_dropped() {
        let payload = plan_payload(vec![
            dto("70", "2026-10-19T10:02:00Z"),
            dto("61", "half past ten"),
            dto("39", "2026-10-19T10:18:00Z"),
        ]);

        let feed = convert_plan(&payload, &stop()).unwrap();

        assert_eq!(feed.departures.len(), 2);
        assert_eq!(feed.issues.len(), 1);
        let issue = &feed.issues[0];
        assert_eq!(issue.source, Source::Plan);
        assert_eq!(issue.index, 1);
        assert_eq!(issue.field, "scheduled");
        assert_eq!(issue.value, "half past ten");
    }

    #[test]
    fn malformed_adjusted_is_reported_and_dropped() {
        let mut bad = dto("70", "2026-10-19T10:02:00Z");
        bad.adjusted = Some("NaN".into());

        let (deps, issues) =
            convert_departures(&[bad, dto("61", "2026-10-19T10:09:00Z")], Source::Live);

        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].route_short_name(), "61");
        assert_eq!(issues[0].field, "adjusted");
        assert_eq!(issues[0].index, 0);
    }

    #[test]
    fn absurd_delay_is_reported() {
        let mut bad = dto("70", "2026-10-19T10:02:00Z");
        bad.delay_sec = Some(i64::MAX);

        let (deps, issues) = convert_departures(&[bad], Source::Live);

        assert!(deps.is_empty());
        assert_eq!(issues[0].field, "delaySec");
    }

    #[test]
    fn stop_mismatch_fails_whole_feed() {
        let mut payload = plan_payload(vec![]);
        payload.stop_id = "9999".into();

        let err = convert_plan(&payload, &stop()).unwrap_err();
        assert!(matches!(err, ConversionError::StopMismatch { .. }));
    }

    #[test]
    fn bad_snapshot_time_fails_whole_feed() {
        let payload = OnlineStopTimes {
            stop_id: "1234".into(),
            updated_at: "yesterday".into(),
            departures: vec![],
            data_issues: vec![],
        };

        let err = convert_online(&payload, &stop()).unwrap_err();
        assert_eq!(
            err,
            ConversionError::InvalidSnapshotTime {
                field: "updatedAt",
                value: "yesterday".into()
            }
        );
    }

    #[test]
    fn feed_back_to_wire() {
        let payload = OnlineStopTimes {
            stop_id: "1234".into(),
            updated_at: "2026-10-19T12:00:00+02:00".into(),
            departures: vec![{
                let mut d = dto("70", "2026-10-19T12:02:00+02:00");
                d.delay_sec = Some(180);
                d
            }],
            data_issues: vec![],
        };

        let feed = convert_online(&payload, &stop()).unwrap();
        let wire = OnlineStopTimes::from_feed(&feed);

        assert_eq!(wire.updated_at, "2026-10-19T10:00:00.000Z");
        assert_eq!(wire.departures[0].scheduled, "2026-10-19T10:02:00.000Z");
        assert_eq!(
            wire.departures[0].adjusted.as_deref(),
            Some("2026-10-19T10:05:00.000Z")
        );
        assert_eq!(wire.departures[0].source.as_deref(), Some("LIVE"));
    }
}
