//! Scale running times of routes

use super::{
    check_rebuilds, durations, patterns_of, rebuild_trip, resolve_routes, scale_seconds,
    valid_factor,
};
use crate::modification::{Diagnostics, Modification, StepFailure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tn_network::{NetworkError, RouteIndex, TransportNetwork, TripSchedule};

/// Make vehicles on the listed routes faster or slower
///
/// Travel time between stops is divided by `scale`; dwell times and the
/// first arrival of each trip are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustSpeed {
    /// Routes to change
    pub routes: Vec<String>,
    /// Speed multiplier; 2.0 halves travel times
    pub scale: f64,
    /// Comment and warnings
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    resolved_routes: BTreeSet<RouteIndex>,
}

impl AdjustSpeed {
    /// Scale speeds of `routes`
    #[must_use]
    pub fn new<S: Into<String>>(routes: impl IntoIterator<Item = S>, scale: f64) -> Self {
        Self {
            routes: routes.into_iter().map(Into::into).collect(),
            scale,
            diagnostics: Diagnostics::default(),
            resolved_routes: BTreeSet::new(),
        }
    }
}

fn rescale(trip: &TripSchedule, scale: f64) -> Result<TripSchedule, NetworkError> {
    let (dwells, hops) = durations(trip);
    let hops: Vec<u32> = hops.into_iter().map(|h| scale_seconds(h, 1.0 / scale)).collect();
    let first = trip.arrivals.first().copied().unwrap_or_default();
    rebuild_trip(trip.trip_id.clone(), first, &dwells, &hops)
}

impl Modification for AdjustSpeed {
    fn type_name(&self) -> &'static str {
        "adjust-speed"
    }

    fn sort_order(&self) -> i32 {
        50
    }

    fn resolve(&mut self, network: &TransportNetwork) -> Result<(), StepFailure> {
        let mut problems = Vec::new();
        if !valid_factor(self.scale) {
            problems.push(format!("scale must be positive, got {}", self.scale));
        }
        if self.routes.is_empty() {
            problems.push("no routes given".to_string());
        }
        let transit = network.transit_layer();
        self.resolved_routes = resolve_routes(transit, &self.routes, &mut problems);
        if problems.is_empty() {
            let scale = self.scale;
            let patterns = patterns_of(transit, &self.resolved_routes);
            check_rebuilds(transit, &patterns, |trip, _| rescale(trip, scale), &mut problems);
        }
        self.diagnostics.check(problems)
    }

    fn apply(&mut self, network: &mut TransportNetwork) -> Result<(), StepFailure> {
        let transit = network.transit_layer_mut()?;
        let patterns = patterns_of(transit, &self.resolved_routes);
        let mut trips = 0usize;
        for index in &patterns {
            let pattern = transit.pattern_mut(*index)?;
            let rescaled: Result<Vec<_>, _> =
                pattern.trips.iter().map(|t| rescale(t, self.scale)).collect();
            pattern.trips = rescaled.map_err(|e| self.diagnostics.fail(e.to_string()))?;
            trips += pattern.trips.len();
        }
        if trips == 0 {
            self.diagnostics.warn("selected routes have no trips");
        }
        tracing::debug!(patterns = patterns.len(), trips, scale = self.scale, "adjusted speed");
        Ok(())
    }

    fn affects_street_layer(&self) -> bool {
        false
    }

    fn affects_transit_layer(&self) -> bool {
        true
    }

    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}
