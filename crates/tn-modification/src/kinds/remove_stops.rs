//! Skip stops on some or all routes

use super::{durations, resolve_routes, resolve_stops};
use crate::modification::{Diagnostics, Modification, StepFailure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tn_network::{NetworkError, PatternIndex, RouteIndex, StopIndex, TransportNetwork, TripSchedule};

/// Remove stops from the patterns of the listed routes, or of every route
/// when none are listed
///
/// Vehicles no longer dwell at removed stops, so every later time in the
/// trip moves earlier by the dwell saved. A pattern that would keep fewer
/// than two stops fails the modification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveStops {
    /// Routes to change; empty means all
    #[serde(default)]
    pub routes: Vec<String>,
    /// Stops to skip
    pub stops: Vec<String>,
    /// Comment and warnings
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    resolved_routes: BTreeSet<RouteIndex>,
    #[serde(skip)]
    resolved_stops: BTreeSet<StopIndex>,
}

impl RemoveStops {
    /// Skip `stops` on every route
    #[must_use]
    pub fn everywhere<S: Into<String>>(stops: impl IntoIterator<Item = S>) -> Self {
        Self {
            stops: stops.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Restrict to `routes`
    #[must_use]
    pub fn on_routes<S: Into<String>>(mut self, routes: impl IntoIterator<Item = S>) -> Self {
        self.routes = routes.into_iter().map(Into::into).collect();
        self
    }
}

/// Rewrite a trip keeping only the stop positions in `keep`
fn skip_stops(trip: &TripSchedule, keep: &[usize]) -> Result<TripSchedule, NetworkError> {
    let (dwells, _) = durations(trip);
    let kept_dwells: Vec<u32> = keep.iter().map(|&k| dwells[k]).collect();
    let hops: Vec<u32> = keep
        .windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            let saved: u32 = dwells[a + 1..b].iter().sum();
            (trip.arrivals[b] - trip.departures[a]).saturating_sub(saved)
        })
        .collect();
    TripSchedule::from_durations(trip.trip_id.clone(), trip.arrivals[keep[0]], &kept_dwells, &hops)
}

impl Modification for RemoveStops {
    fn type_name(&self) -> &'static str {
        "remove-stops"
    }

    fn sort_order(&self) -> i32 {
        40
    }

    fn resolve(&mut self, network: &TransportNetwork) -> Result<(), StepFailure> {
        let transit = network.transit_layer();
        let mut problems = Vec::new();
        if self.stops.is_empty() {
            problems.push("no stops given".to_string());
        }
        self.resolved_routes = resolve_routes(transit, &self.routes, &mut problems);
        self.resolved_stops = resolve_stops(transit, &self.stops, &mut problems);
        self.diagnostics.check(problems)
    }

    fn apply(&mut self, network: &mut TransportNetwork) -> Result<(), StepFailure> {
        let transit = network.transit_layer_mut()?;
        let mut changed = 0usize;
        for i in 0..transit.pattern_count() {
            let index = PatternIndex::from_index(i);
            let pattern = transit.pattern_mut(index)?;
            if !self.resolved_routes.is_empty() && !self.resolved_routes.contains(&pattern.route) {
                continue;
            }
            let keep: Vec<usize> = (0..pattern.stops.len())
                .filter(|&k| !self.resolved_stops.contains(&pattern.stops[k]))
                .collect();
            if keep.len() == pattern.stops.len() {
                continue;
            }
            if keep.len() < 2 {
                return Err(self.diagnostics.fail(format!(
                    "pattern {index} would keep {} of {} stops",
                    keep.len(),
                    pattern.stops.len()
                )));
            }
            pattern.trips = pattern
                .trips
                .iter()
                .map(|t| skip_stops(t, &keep))
                .collect::<Result<_, _>>()?;
            pattern.stops = keep.iter().map(|&k| pattern.stops[k]).collect();
            changed += 1;
        }
        if changed == 0 {
            self.diagnostics.warn("no pattern calls at the removed stops");
        }
        tracing::debug!(patterns = changed, "removed stops");
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
