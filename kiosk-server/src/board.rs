//! What the kiosk screen shows.
//!
//! Turns a merged payload (or the failure to get one) into the countdown
//! and clock values the display needs. The three "nothing to show" cases
//! stay distinct so the screen never passes off an error or an empty
//! timetable as current data.

use chrono::{DateTime, Local, Utc};

use crate::domain::{Departure, DeparturesPayload};
use crate::reconcile::next_departure;

/// A departure leaving within this many seconds is shown as arriving.
pub const ARRIVING_WITHIN_SECS: i64 = 30;

/// Live departures later than this many seconds are flagged as late.
pub const LATE_AFTER_SECS: i64 = 60;

/// Whole minutes until `t`, rounded down. Negative once `t` has passed.
pub fn minutes_left(t: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    t.signed_duration_since(now)
        .num_milliseconds()
        .div_euclid(60_000)
}

/// Whether a departure at `t` is close enough to show as arriving.
pub fn is_arriving(t: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    t.signed_duration_since(now).num_milliseconds() <= ARRIVING_WITHIN_SECS * 1000
}

/// Whether a departure is running noticeably late.
pub fn is_late(d: &Departure) -> bool {
    d.is_live() && d.delay_secs().unwrap_or(0) > LATE_AFTER_SECS
}

/// `HH:MM` in the host's local time.
pub fn format_hm(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%H:%M").to_string()
}

/// What to put on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardStatus<'a> {
    /// Nothing has been loaded yet.
    NoDataYet,
    /// Fetching departures failed.
    FetchFailed(String),
    /// Data is current, but nothing is scheduled.
    NoDepartures,
    /// The next departure to announce.
    Next(&'a Departure),
}

impl<'a> BoardStatus<'a> {
    /// Classify the latest load attempt.
    ///
    /// `None` means no attempt has completed yet.
    pub fn from_load<E: std::fmt::Display>(
        load: Option<&'a Result<DeparturesPayload, E>>,
    ) -> Self {
        match load {
            None => BoardStatus::NoDataYet,
            Some(Err(e)) => BoardStatus::FetchFailed(e.to_string()),
            Some(Ok(payload)) => match next_departure(payload) {
                Some(d) => BoardStatus::Next(d),
                None => BoardStatus::NoDepartures,
            },
        }
    }

    /// Headline text for statuses without a departure.
    pub fn message(&self) -> Option<String> {
        match self {
            BoardStatus::NoDataYet => Some("Načítavam odchody…".to_string()),
            BoardStatus::FetchFailed(e) => Some(format!("Chyba: {e}")),
            BoardStatus::NoDepartures => Some("Žiadne plánované odchody".to_string()),
            BoardStatus::Next(_) => None,
        }
    }
}

/// Countdown text for a departure: "prichádza" when arriving, else minutes.
pub fn countdown_text(d: &Departure, now: DateTime<Utc>) -> String {
    let t = d.effective_time();
    if is_arriving(t, now) {
        "prichádza".to_string()
    } else {
        format!("{} min", minutes_left(t, now))
    }
}
