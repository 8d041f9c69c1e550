//! Application state for the web layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cache::CachedLiveSource;
use crate::feed::PlanSource;
use crate::reconcile::Reconciler;

/// Source of "now" for request handling.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Live departures, cached briefly
    pub live: Arc<CachedLiveSource>,

    /// Planned departures
    pub plan: Arc<PlanSource>,

    /// Departure reconciler
    pub reconciler: Arc<Reconciler>,

    /// Serve the remaining feed when one upstream fails
    pub degrade_to_plan: bool,

    clock: Clock,
}

impl AppState {
    /// Create a new app state using the system clock.
    pub fn new(
        live: CachedLiveSource,
        plan: PlanSource,
        reconciler: Reconciler,
        degrade_to_plan: bool,
    ) -> Self {
        Self {
            live: Arc::new(live),
            plan: Arc::new(plan),
            reconciler: Arc::new(reconciler),
            degrade_to_plan,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the clock (for tests).
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The current instant.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}
