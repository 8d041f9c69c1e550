//! Web layer for the departure kiosk.
//!
//! Provides the JSON API for live, planned and merged departures, and the
//! server-rendered kiosk screen.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, cors_layer, create_router, fetch_departures};
pub use state::{AppState, Clock};
