//! Upstream departure feeds.
//!
//! Two feeds describe departures at a stop:
//! - the **live** feed from the operator's real-time system, with delays
//! - the **plan** feed, the static timetable
//!
//! Each can be backed by a real source or by `MockFeed`. Whatever the
//! backing, a fetch either fails as a whole with a `FeedError` or returns
//! a validated `ParsedFeed` whose malformed entries have been set aside
//! as data issues.

mod client;
mod convert;
mod error;
mod mock;
mod timetable;
mod types;

use chrono::{DateTime, Utc};

use crate::domain::{ParsedFeed, StopId};

pub use client::{LiveClient, LiveClientConfig};
pub use convert::{ConversionError, convert_departures, convert_online, convert_plan};
pub use error::FeedError;
pub use mock::MockFeed;
pub use timetable::Timetable;
pub use types::{DataIssueDto, DepartureDto, OnlineStopTimes, PlanTimetable};

/// Where live departures come from.
#[derive(Clone)]
pub enum LiveSource {
    Http(LiveClient),
    Mock(MockFeed),
}

impl LiveSource {
    /// Fetch validated live departures for a stop.
    ///
    /// `now` only matters for the mock, which builds departures around it.
    pub async fn fetch(
        &self,
        stop_id: &StopId,
        now: DateTime<Utc>,
    ) -> Result<ParsedFeed, FeedError> {
        match self {
            LiveSource::Http(client) => client.get_online_stop_time(stop_id).await,
            LiveSource::Mock(mock) => mock.live(stop_id, now),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            LiveSource::Http(_) => "http",
            LiveSource::Mock(_) => "mock",
        }
    }
}

/// Where planned departures come from.
#[derive(Clone)]
pub enum PlanSource {
    Timetable(Timetable),
    Mock(MockFeed),
}

impl PlanSource {
    /// Fetch validated planned departures for a stop.
    ///
    /// Timetable departures that left before `now` (less the matching
    /// window) are left out; the mock builds departures around `now`.
    pub async fn fetch(
        &self,
        stop_id: &StopId,
        now: DateTime<Utc>,
    ) -> Result<ParsedFeed, FeedError> {
        match self {
            PlanSource::Timetable(timetable) => timetable.get(stop_id, now).await,
            PlanSource::Mock(mock) => mock.plan(stop_id, now),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            PlanSource::Timetable(_) => "timetable",
            PlanSource::Mock(_) => "mock",
        }
    }
}
