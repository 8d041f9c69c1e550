//! HTTP route handlers.

use std::sync::Arc;

use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::domain::{DeparturesPayload, ParsedFeed, Source, StopId, format_timestamp};
use crate::feed::{FeedError, OnlineStopTimes, PlanTimetable};

use super::dto::*;
use super::state::AppState;
use super::templates::KioskTemplate;

const DEFAULT_KIOSK_STOP: &str = "1234";
const DEFAULT_KIOSK_NAME: &str = "Chorvátsky Grob – Čierna Voda";

/// Create the application router.
///
/// The JSON API is served both at the root and under `/api`.
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/online/:stop_id", get(online_stop_times))
        .route("/plan/:stop_id", get(plan_timetable))
        .route("/departures/:stop_id", get(departures));

    Router::new()
        .route("/", get(kiosk_page))
        .route("/kiosk", get(kiosk_page))
        .merge(api.clone())
        .nest("/api", api)
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// CORS policy allowing read-only calls from a single origin.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET])
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        server_time: format_timestamp(state.now()),
    })
}

fn parse_stop(raw: &str) -> Result<StopId, AppError> {
    StopId::parse(raw).map_err(|e| AppError::BadRequest {
        message: format!("Invalid stop id {raw:?}: {e}"),
    })
}

/// Live departures for a stop, in the upstream wire shape.
async fn online_stop_times(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Json<OnlineStopTimes>, AppError> {
    let stop_id = parse_stop(&stop_id)?;
    let feed = state
        .live
        .fetch(&stop_id, state.now())
        .await
        .map_err(|e| upstream_error(Source::Live, e))?;

    Ok(Json(OnlineStopTimes::from_feed(&feed)))
}

/// Planned departures for a stop.
async fn plan_timetable(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Json<PlanTimetable>, AppError> {
    let stop_id = parse_stop(&stop_id)?;
    let feed = state
        .plan
        .fetch(&stop_id, state.now())
        .await
        .map_err(|e| upstream_error(Source::Plan, e))?;

    Ok(Json(PlanTimetable::from_feed(&feed)))
}

/// Merged departures for a stop.
async fn departures(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Json<DeparturesResponse>, AppError> {
    let stop_id = parse_stop(&stop_id)?;
    let payload = fetch_departures(&state, &stop_id).await?;
    Ok(Json(DeparturesResponse::from_payload(&payload)))
}

/// Fetch both feeds concurrently and reconcile them.
///
/// Either feed failing fails the whole request, unless degrade mode is on
/// and the other feed succeeded. A degraded payload says which feed is
/// missing.
pub async fn fetch_departures(
    state: &AppState,
    stop_id: &StopId,
) -> Result<DeparturesPayload, AppError> {
    let now = state.now();
    let (live, plan) = tokio::join!(
        state.live.fetch(stop_id, now),
        state.plan.fetch(stop_id, now)
    );

    let reconcile = |live: ParsedFeed, plan: ParsedFeed| {
        state.reconciler.reconcile(stop_id, live, plan, now)
    };

    match (live, plan) {
        (Ok(live), Ok(plan)) => Ok(reconcile(Arc::unwrap_or_clone(live), plan)),
        (Err(e), Ok(plan)) if state.degrade_to_plan => {
            tracing::warn!(stop_id = %stop_id, error = %e, "live feed failed, serving plan only");
            let live = ParsedFeed::empty(stop_id.clone(), now);
            Ok(reconcile(live, plan).degraded(Source::Live, e.to_string()))
        }
        (Ok(live), Err(e)) if state.degrade_to_plan => {
            tracing::warn!(stop_id = %stop_id, error = %e, "plan feed failed, serving live only");
            let plan = ParsedFeed::empty(stop_id.clone(), now);
            let payload = reconcile(Arc::unwrap_or_clone(live), plan);
            Ok(payload.degraded(Source::Plan, e.to_string()))
        }
        (Err(e), _) => Err(upstream_error(Source::Live, e)),
        (_, Err(e)) => Err(upstream_error(Source::Plan, e)),
    }
}

/// Server-rendered kiosk screen.
async fn kiosk_page(
    State(state): State<AppState>,
    Query(query): Query<KioskQuery>,
) -> Result<Response, AppError> {
    let raw_stop = query
        .stop
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_KIOSK_STOP.to_string());
    let stop_id = parse_stop(&raw_stop)?;
    let stop_name = query
        .name
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_KIOSK_NAME.to_string());
    let via = query.via.filter(|s| !s.trim().is_empty());

    let load = fetch_departures(&state, &stop_id).await;
    let template = KioskTemplate::new(
        stop_id.to_string(),
        stop_name,
        via,
        &load,
        state.now(),
    );

    let html = template.render().map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })?;

    Ok(Html(html).into_response())
}

/// Map a feed failure to an HTTP error, naming the feed.
fn upstream_error(source: Source, e: FeedError) -> AppError {
    match e {
        FeedError::StopNotFound(stop) => AppError::NotFound {
            message: format!("No {source} departures for stop {stop}"),
        },
        FeedError::NotConfigured(_) => AppError::Internal {
            message: e.to_string(),
        },
        _ => AppError::UpstreamUnavailable {
            source,
            message: e.to_string(),
        },
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    UpstreamUnavailable { source: Source, message: String },
    Internal { message: String },
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Internal { message } => f.write_str(message),
            AppError::UpstreamUnavailable { source, message } => {
                write!(f, "{source} feed unavailable: {message}")
            }
        }
    }
}

impl AppError {
    /// Status code returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest { .. } => "bad_request",
            AppError::NotFound { .. } => "not_found",
            AppError::UpstreamUnavailable { .. } => "upstream_unavailable",
            AppError::Internal { .. } => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(%status, kind = self.kind(), "{message}");
        } else {
            tracing::info!(%status, kind = self.kind(), "{message}");
        }

        let body = Json(ErrorResponse {
            error: message,
            kind: self.kind().to_string(),
        });
        (status, body).into_response()
    }
}
