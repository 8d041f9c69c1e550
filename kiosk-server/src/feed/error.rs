//! Feed error types.

use super::convert::ConversionError;

/// Errors from fetching or loading a departure feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON parse error: {message}{}", body_suffix(.body))]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Upstream returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Invalid credential
    #[error("unauthorized (check API_KEY)")]
    Unauthorized,

    /// Rate limited by the upstream
    #[error("rate limited by upstream")]
    RateLimited,

    /// No data for the requested stop
    #[error("no departures known for stop {0}")]
    StopNotFound(String),

    /// Reading timetable files failed
    #[error("timetable error: {message}")]
    Io { message: String },

    /// Payload parsed but is not usable as a whole
    #[error("invalid feed: {0}")]
    Conversion(#[from] ConversionError),

    /// Feature not configured or not available
    #[error("not configured: {0}")]
    NotConfigured(String),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .map(|b| format!(" (body: {b})"))
        .unwrap_or_default()
}
