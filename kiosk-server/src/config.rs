//! Server configuration from the environment.
//!
//! All variables are read and validated once at startup; a bad value stops
//! the server instead of surfacing later as a failed request.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;

use crate::cache::CacheConfig;
use crate::feed::LiveClientConfig;

const DEFAULT_PORT: u16 = 8787;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LIVE_CACHE_TTL_SECS: u64 = 5;

/// Errors from reading the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason} (got {value:?})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("{var} must be set when {because} is set")]
    Missing {
        var: &'static str,
        because: &'static str,
    },
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to listen on
    pub bind_addr: SocketAddr,
    /// Allowed cross-origin caller
    pub cors_origin: HeaderValue,
    /// Live upstream; `None` serves mock live data
    pub live: Option<LiveClientConfig>,
    /// Timetable directory, such as the bundled `data/timetables`;
    /// `None` serves a mock plan
    pub timetable_dir: Option<PathBuf>,
    /// Answer from the remaining feed when one upstream fails
    pub degrade_to_plan: bool,
    /// Cache settings for live responses
    pub live_cache: CacheConfig,
    /// Static assets for the kiosk page
    pub static_dir: PathBuf,
}

impl Config {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: v.clone(),
                reason: "expected a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let ip: IpAddr = bind_raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: "BIND_ADDR",
            value: bind_raw.clone(),
            reason: "expected an IP address",
        })?;

        let cors_raw = get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        let cors_origin = HeaderValue::from_str(cors_raw.trim()).map_err(|_| ConfigError::Invalid {
            var: "CORS_ORIGIN",
            value: cors_raw.clone(),
            reason: "expected a valid origin header value",
        })?;

        let timeout_secs = parse_secs(
            get("UPSTREAM_TIMEOUT_SECS"),
            "UPSTREAM_TIMEOUT_SECS",
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "UPSTREAM_TIMEOUT_SECS",
                value: "0".into(),
                reason: "must be at least 1",
            });
        }

        let live = match get("API_BASE_URL") {
            Some(base_url) => {
                let base_url = base_url.trim().to_string();
                if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                    return Err(ConfigError::Invalid {
                        var: "API_BASE_URL",
                        value: base_url,
                        reason: "expected an http(s) URL",
                    });
                }
                let api_key = get("API_KEY").ok_or(ConfigError::Missing {
                    var: "API_KEY",
                    because: "API_BASE_URL",
                })?;
                Some(LiveClientConfig::new(base_url, api_key.trim()).with_timeout(timeout_secs))
            }
            None => None,
        };

        let degrade_to_plan = match get("KIOSK_DEGRADE_TO_PLAN") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid {
                var: "KIOSK_DEGRADE_TO_PLAN",
                value: v.clone(),
                reason: "expected true or false",
            })?,
            None => false,
        };

        let ttl_secs = parse_secs(
            get("LIVE_CACHE_TTL_SECS"),
            "LIVE_CACHE_TTL_SECS",
            DEFAULT_LIVE_CACHE_TTL_SECS,
        )?;

        Ok(Self {
            bind_addr: SocketAddr::new(ip, port),
            cors_origin,
            live,
            timetable_dir: get("TIMETABLE_DIR").map(PathBuf::from),
            degrade_to_plan,
            live_cache: CacheConfig {
                ttl: Duration::from_secs(ttl_secs),
                ..CacheConfig::default()
            },
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        })
    }
}

fn parse_secs(raw: Option<String>, var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match raw {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            value: v.clone(),
            reason: "expected a whole number of seconds",
        }),
        None => Ok(default),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
