//! Mock feeds for running without upstream access.
//!
//! Generates departures relative to the current time so the kiosk always
//! has something upcoming to show. The live and planned lists describe the
//! same small set of trips, so the merged view exercises matching, delays
//! and a plan-only trip.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{ParsedFeed, Source, StopId, add_seconds, format_timestamp};

use super::convert::{convert_online, convert_plan};
use super::error::FeedError;
use super::types::{DepartureDto, OnlineStopTimes, PlanTimetable};

/// A mock trip: minutes from now, route, headsign, live delay in seconds.
///
/// `None` delay means the trip only exists in the timetable.
type MockTrip = (i64, &'static str, &'static str, Option<i64>);

const TRIPS: &[MockTrip] = &[
    (2, "70", "Letisko", Some(180)),
    (9, "61", "Hlavná stanica", Some(-60)),
    (18, "39", "Patrónka", Some(0)),
    (25, "21", "Dolné hony", None),
];

/// Mock source serving both feeds for any stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockFeed;

impl MockFeed {
    pub fn new() -> Self {
        Self
    }

    /// Live departures as the upstream would send them.
    pub fn online_stop_times(&self, stop_id: &StopId, now: DateTime<Utc>) -> OnlineStopTimes {
        let departures = TRIPS
            .iter()
            .filter_map(|&(mins, route, headsign, delay)| {
                let delay = delay?;
                let scheduled = now + Duration::minutes(mins);
                let adjusted = add_seconds(scheduled, delay).unwrap_or(scheduled);
                Some(DepartureDto {
                    route_short_name: route.to_string(),
                    headsign: headsign.to_string(),
                    scheduled: format_timestamp(scheduled),
                    delay_sec: Some(delay),
                    adjusted: Some(format_timestamp(adjusted)),
                    source: Some(Source::Live.as_str().to_string()),
                })
            })
            .collect();

        OnlineStopTimes {
            stop_id: stop_id.as_str().to_string(),
            updated_at: format_timestamp(now),
            departures,
            data_issues: Vec::new(),
        }
    }

    /// Planned departures as a timetable file would contain them.
    pub fn plan_timetable(&self, stop_id: &StopId, now: DateTime<Utc>) -> PlanTimetable {
        let departures = TRIPS
            .iter()
            .map(|&(mins, route, headsign, _)| DepartureDto {
                route_short_name: route.to_string(),
                headsign: headsign.to_string(),
                scheduled: format_timestamp(now + Duration::minutes(mins)),
                delay_sec: None,
                adjusted: None,
                source: Some(Source::Plan.as_str().to_string()),
            })
            .collect();

        PlanTimetable {
            stop_id: stop_id.as_str().to_string(),
            generated_at: format_timestamp(now),
            departures,
            data_issues: Vec::new(),
        }
    }

    /// Validated live feed.
    pub fn live(&self, stop_id: &StopId, now: DateTime<Utc>) -> Result<ParsedFeed, FeedError> {
        Ok(convert_online(&self.online_stop_times(stop_id, now), stop_id)?)
    }

    /// Validated planned feed.
    pub fn plan(&self, stop_id: &StopId, now: DateTime<Utc>) -> Result<ParsedFeed, FeedError> {
        Ok(convert_plan(&self.plan_timetable(stop_id, now), stop_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap()
    }

    fn stop() -> StopId {
        StopId::parse("1234").unwrap()
    }

    #[test]
    fn live_feed_has_three_delayed_trips() {
        let feed = MockFeed::new().live(&stop(), now()).unwrap();

        assert!(feed.issues.is_empty());
        assert_eq!(feed.as_of, now());
        let routes: Vec<_> = feed
            .departures
            .iter()
            .map(|d| d.route_short_name())
            .collect();
        assert_eq!(routes, vec!["70", "61", "39"]);
        assert_eq!(
            feed.departures[0].adjusted(),
            Some(now() + Duration::minutes(5))
        );
        assert_eq!(
            feed.departures[1].adjusted(),
            Some(now() + Duration::minutes(8))
        );
    }

    #[test]
    fn plan_feed_has_four_trips_without_delays() {
        let feed = MockFeed::new().plan(&stop(), now()).unwrap();

        assert_eq!(feed.departures.len(), 4);
        assert!(feed.departures.iter().all(|d| !d.is_live()));
        assert_eq!(feed.departures[3].headsign(), "Dolné hony");
    }

    #[test]
    fn answers_for_the_requested_stop() {
        let other = StopId::parse("sk:42").unwrap();
        let raw = MockFeed::new().online_stop_times(&other, now());
        assert_eq!(raw.stop_id, "sk:42");
    }
}
