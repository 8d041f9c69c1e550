//! Askama templates for the kiosk screen.

use askama::Template;
use chrono::{DateTime, Utc};

use crate::board::{BoardStatus, countdown_text, format_hm, is_late};
use crate::domain::{Departure, DeparturesPayload};

/// How many departures to list under the headline.
const UPCOMING_ROWS: usize = 5;

/// Seconds between page refreshes.
pub const REFRESH_SECS: u32 = 10;

/// The kiosk page.
#[derive(Template)]
#[template(path = "kiosk.html")]
pub struct KioskTemplate {
    pub stop_id: String,
    pub stop_name: String,
    pub via: Option<String>,
    pub refresh_secs: u32,
    /// "Aktualizované: HH:MM" line, or the error / empty message
    pub subtitle: String,
    pub notice: Option<String>,
    pub next: Option<DepartureView>,
    pub upcoming: Vec<DepartureView>,
}

/// Departure view model for templates.
#[derive(Debug, Clone)]
pub struct DepartureView {
    pub route: String,
    pub headsign: String,
    pub countdown: String,
    pub clock: String,
    pub is_live: bool,
    pub is_late: bool,
}

impl DepartureView {
    /// Create from a domain departure.
    pub fn from_departure(d: &Departure, now: DateTime<Utc>) -> Self {
        Self {
            route: d.route_short_name().to_string(),
            headsign: d.headsign().to_string(),
            countdown: countdown_text(d, now),
            clock: format_hm(d.effective_time()),
            is_live: d.is_live(),
            is_late: is_late(d),
        }
    }

    /// Badge text for the source.
    pub fn badge(&self) -> &'static str {
        if self.is_live { "LIVE" } else { "PLÁN" }
    }
}

impl KioskTemplate {
    /// Build the page from the outcome of loading departures.
    pub fn new<E: std::fmt::Display>(
        stop_id: String,
        stop_name: String,
        via: Option<String>,
        load: &Result<DeparturesPayload, E>,
        now: DateTime<Utc>,
    ) -> Self {
        let status = BoardStatus::from_load(Some(load));

        let subtitle = match (&status, load) {
            (BoardStatus::Next(_), Ok(payload)) => {
                format!("Aktualizované: {}", format_hm(payload.updated_at))
            }
            _ => status.message().unwrap_or_default(),
        };

        let next = match status {
            BoardStatus::Next(d) => Some(DepartureView::from_departure(d, now)),
            _ => None,
        };

        let (upcoming, notice) = match load {
            Ok(payload) => (
                payload
                    .departures
                    .iter()
                    .skip(1)
                    .take(UPCOMING_ROWS)
                    .map(|d| DepartureView::from_departure(d, now))
                    .collect(),
                payload.notice(),
            ),
            Err(_) => (Vec::new(), None),
        };

        Self {
            stop_id,
            stop_name,
            via,
            refresh_secs: REFRESH_SECS,
            subtitle,
            notice,
            next,
            upcoming,
        }
    }
}
