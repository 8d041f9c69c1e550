use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kiosk_server::cache::CachedLiveSource;
use kiosk_server::config::Config;
use kiosk_server::feed::{LiveClient, LiveSource, MockFeed, PlanSource, Timetable};
use kiosk_server::reconcile::Reconciler;
use kiosk_server::web::{AppState, cors_layer, create_router};

/// How often to re-read timetable files.
const TIMETABLE_RELOAD_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiosk_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let live = match config.live.clone() {
        Some(live_config) => {
            tracing::info!(base_url = %live_config.base_url, "using live upstream");
            LiveSource::Http(LiveClient::new(live_config)?)
        }
        None => {
            tracing::warn!("API_BASE_URL not set, serving mock live departures");
            LiveSource::Mock(MockFeed::new())
        }
    };

    let plan = match &config.timetable_dir {
        Some(dir) => {
            let timetable = Timetable::load(dir)?;
            tracing::info!(
                dir = %dir.display(),
                stops = timetable.available_stops().await.len(),
                "loaded timetables"
            );

            // Pick up edited timetable files without a restart
            let refresh = timetable.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(TIMETABLE_RELOAD_INTERVAL);
                interval.tick().await; // First tick is immediate, skip it
                loop {
                    interval.tick().await;
                    match refresh.reload().await {
                        Ok(count) => tracing::debug!(stops = count, "reloaded timetables"),
                        Err(e) => tracing::warn!(error = %e, "failed to reload timetables"),
                    }
                }
            });

            PlanSource::Timetable(timetable)
        }
        None => {
            tracing::warn!("TIMETABLE_DIR not set, serving mock planned departures");
            PlanSource::Mock(MockFeed::new())
        }
    };

    if config.degrade_to_plan {
        tracing::info!("degrade mode on: a failing feed is replaced by the other one");
    }

    tracing::info!(
        live = live.describe(),
        plan = plan.describe(),
        cache_ttl_secs = config.live_cache.ttl.as_secs(),
        "feeds configured"
    );

    let live = CachedLiveSource::new(live, &config.live_cache);
    let state = AppState::new(live, plan, Reconciler::default(), config.degrade_to_plan);

    let static_dir = config.static_dir.to_string_lossy();
    let app = create_router(state, &static_dir)
        .layer(cors_layer(config.cors_origin.clone()))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("kiosk server listening on http://{}", config.bind_addr);
    tracing::info!("  GET /departures/{{stopId}}  merged departures (also under /api)");
    tracing::info!("  GET /kiosk?stop=..&name=..  kiosk screen");

    axum::serve(listener, app).await?;

    Ok(())
}
