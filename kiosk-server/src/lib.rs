//! Departure kiosk server.
//!
//! Answers "when does the next bus leave this stop?" by merging the
//! operator's live feed with the planned timetable, then serves the result
//! as JSON and as a self-refreshing kiosk page.

pub mod board;
pub mod cache;
pub mod config;
pub mod domain;
pub mod feed;
pub mod reconcile;
pub mod web;
