//! Domain types for the departure kiosk.
//!
//! Everything in here has already been validated: stop ids are well-formed
//! and every timestamp has been parsed. Feed data enters through
//! `crate::feed` and is only turned into these types once it checks out.

mod departure;
mod stop;
mod time;

pub use departure::{DataIssue, Departure, DeparturesPayload, Freshness, ParsedFeed, Source};
pub use stop::{InvalidStopId, StopId};
pub use time::{TimestampError, abs_diff, add_seconds, format_timestamp, parse_timestamp};
