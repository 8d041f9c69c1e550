//! Departure reconciliation.
//!
//! Merges the live feed and the planned timetable for one stop into a
//! single list of what will actually leave next. A planned departure is
//! dropped when a live departure can be attributed to it; everything else
//! from both feeds is kept.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Departure, DeparturesPayload, Freshness, ParsedFeed, StopId};

/// Default matching window between a live and a planned departure, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 180;

/// Configuration for the reconciler.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Maximum distance between live and planned scheduled times for the
    /// two to count as the same trip (inclusive).
    pub tolerance: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            tolerance: Duration::seconds(DEFAULT_TOLERANCE_SECS),
        }
    }
}

/// Result of merging two departure lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Merged departures, sorted by effective time.
    pub departures: Vec<Departure>,
    /// Number of planned departures absorbed by a live one.
    pub matched: usize,
}

/// Merge live and planned departures.
///
/// Each live departure is kept and claims at most one planned departure:
/// the first one in `plan` order with the same route and headsign, within
/// `tolerance` of its scheduled time, and not already claimed. Claimed
/// planned departures are dropped, the rest are kept. The result is
/// stably sorted by effective time, so ties keep live departures (in
/// input order) ahead of planned ones (in input order).
///
/// A planned departure inside the window of two live departures goes to
/// whichever live departure comes first in `live`, not the nearer one.
pub fn merge(live: &[Departure], plan: &[Departure], config: &ReconcileConfig) -> Reconciliation {
    let mut claimed = vec![false; plan.len()];
    let mut departures = Vec::with_capacity(live.len() + plan.len());
    let mut matched = 0;

    for l in live {
        departures.push(l.clone());

        let hit = plan
            .iter()
            .enumerate()
            .find(|(i, p)| !claimed[*i] && l.same_trip(p, config.tolerance));

        if let Some((i, _)) = hit {
            claimed[i] = true;
            matched += 1;
        }
    }

    departures.extend(
        plan.iter()
            .zip(&claimed)
            .filter(|(_, c)| !**c)
            .map(|(p, _)| p.clone()),
    );

    // sort_by_key is stable
    departures.sort_by_key(Departure::effective_time);

    Reconciliation {
        departures,
        matched,
    }
}

/// Stateless reconciler with a fixed configuration.
///
/// Safe to share across requests: every call only reads its inputs and
/// builds a fresh payload.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// Build the merged payload for `stop_id` from both validated feeds.
    ///
    /// `now` becomes the payload's `updated_at`; it is passed in rather
    /// than read from the clock so results are reproducible.
    pub fn reconcile(
        &self,
        stop_id: &StopId,
        live: ParsedFeed,
        plan: ParsedFeed,
        now: DateTime<Utc>,
    ) -> DeparturesPayload {
        let Reconciliation {
            departures,
            matched,
        } = merge(&live.departures, &plan.departures, &self.config);

        let mut issues = live.issues;
        issues.extend(plan.issues);

        for issue in &issues {
            tracing::warn!(stop_id = %stop_id, %issue, "dropped malformed departure");
        }

        tracing::debug!(
            stop_id = %stop_id,
            live = live.departures.len(),
            plan = plan.departures.len(),
            matched,
            merged = departures.len(),
            issues = issues.len(),
            "reconciled departures"
        );

        DeparturesPayload {
            stop_id: stop_id.clone(),
            updated_at: now,
            departures,
            issues,
            freshness: Freshness::Complete,
        }
    }
}

/// The departure to show first, if there is one.
pub fn next_departure(payload: &DeparturesPayload) -> Option<&Departure> {
    payload.departures.first()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_792_400_000, 0).unwrap()
    }

    /// Small route/headsign alphabets so matches actually happen.
    fn arb_trip() -> impl Strategy<Value = (String, String, i64)> {
        (
            prop::sample::select(vec!["70", "61", "39"]),
            prop::sample::select(vec!["Letisko", "Hlavná"]),
            0i64..3_600,
        )
            .prop_map(|(r, h, secs)| (r.to_string(), h.to_string(), secs))
    }

    fn arb_plan() -> impl Strategy<Value = Departure> {
        arb_trip().prop_map(|(r, h, secs)| {
            Departure::planned(r, h, t0() + Duration::seconds(secs))
        })
    }

    fn arb_live() -> impl Strategy<Value = Departure> {
        (arb_trip(), prop::option::of(-300i64..1_200)).prop_map(|((r, h, secs), delay)| {
            let scheduled = t0() + Duration::seconds(secs);
            let adjusted = delay.map(|d| scheduled + Duration::seconds(d));
            Departure::live(r, h, scheduled, delay, adjusted)
        })
    }

    proptest! {
        /// Output is sorted by effective time
        #[test]
        fn output_sorted(
            live in prop::collection::vec(arb_live(), 0..8),
            plan in prop::collection::vec(arb_plan(), 0..8),
        ) {
            let result = merge(&live, &plan, &ReconcileConfig::default());
            for w in result.departures.windows(2) {
                prop_assert!(w[0].effective_time() <= w[1].effective_time());
            }
        }

        /// Every live departure appears exactly once
        #[test]
        fn live_complete(
            live in prop::collection::vec(arb_live(), 0..8),
            plan in prop::collection::vec(arb_plan(), 0..8),
        ) {
            let result = merge(&live, &plan, &ReconcileConfig::default());
            let out_live: Vec<_> = result.departures.iter().filter(|d| d.is_live()).collect();
            prop_assert_eq!(out_live.len(), live.len());
            for l in &live {
                let in_input = live.iter().filter(|x| *x == l).count();
                let in_output = out_live.iter().filter(|x| **x == l).count();
                prop_assert_eq!(in_input, in_output);
            }
        }

        /// |out| = |live| + |plan| - matches, and each match eats one plan entry
        #[test]
        fn no_duplication(
            live in prop::collection::vec(arb_live(), 0..8),
            plan in prop::collection::vec(arb_plan(), 0..8),
        ) {
            let result = merge(&live, &plan, &ReconcileConfig::default());
            prop_assert!(result.matched <= live.len().min(plan.len()));
            prop_assert_eq!(result.departures.len(), live.len() + plan.len() - result.matched);
            let out_plan = result.departures.iter().filter(|d| !d.is_live()).count();
            prop_assert_eq!(out_plan, plan.len() - result.matched);
        }

        /// Same inputs give the same output
        #[test]
        fn deterministic(
            live in prop::collection::vec(arb_live(), 0..8),
            plan in prop::collection::vec(arb_plan(), 0..8),
        ) {
            let config = ReconcileConfig::default();
            prop_assert_eq!(merge(&live, &plan, &config), merge(&live, &plan, &config));
        }

        /// Planned entries never gain delay information
        #[test]
        fn plan_entries_untouched(
            live in prop::collection::vec(arb_live(), 0..8),
            plan in prop::collection::vec(arb_plan(), 0..8),
        ) {
            let result = merge(&live, &plan, &ReconcileConfig::default());
            for d in result.departures.iter().filter(|d| !d.is_live()) {
                prop_assert!(d.delay_secs().is_none() && d.adjusted().is_none());
                prop_assert!(plan.contains(d));
            }
        }
    }
}
