//! Live departures HTTP client.
//!
//! Queries the operator's online stop-time endpoint. The upstream protocol
//! is not published yet, so the client expects the same JSON shape this
//! server exposes on `/online/{stopId}`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tokio::sync::Semaphore;

use crate::domain::{ParsedFeed, StopId};

use super::convert::convert_online;
use super::error::FeedError;
use super::types::OnlineStopTimes;

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How much of an unparsable body to keep for error messages.
const ERROR_BODY_CHARS: usize = 500;

/// Configuration for the live client.
#[derive(Debug, Clone)]
pub struct LiveClientConfig {
    /// Base URL of the upstream API
    pub base_url: String,
    /// Bearer credential
    pub api_key: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl LiveClientConfig {
    /// Create a new config for the given upstream.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Client for the live departures upstream.
///
/// Uses a semaphore to limit concurrent requests so a burst of kiosk polls
/// cannot hammer the operator's API.
#[derive(Debug, Clone)]
pub struct LiveClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl LiveClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LiveClientConfig) -> Result<Self, FeedError> {
        if config.base_url.is_empty() {
            return Err(FeedError::NotConfigured("live upstream base URL".into()));
        }

        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|_| FeedError::NotConfigured("API key is not a valid header".into()))?;
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Fetch the raw live departures for a stop.
    pub async fn get_online_stop_time_raw(
        &self,
        stop_id: &StopId,
    ) -> Result<OnlineStopTimes, FeedError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FeedError::NotConfigured("client is shutting down".into()))?;

        let url = format!("{}/GetOnlineStopTime", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("stopId", stop_id.as_str())])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(FeedError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimited);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FeedError::StopNotFound(stop_id.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| FeedError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(ERROR_BODY_CHARS).collect()),
        })
    }

    /// Fetch and validate live departures for a stop.
    pub async fn get_online_stop_time(&self, stop_id: &StopId) -> Result<ParsedFeed, FeedError> {
        let raw = self.get_online_stop_time_raw(stop_id).await?;
        Ok(convert_online(&raw, stop_id)?)
    }
}
