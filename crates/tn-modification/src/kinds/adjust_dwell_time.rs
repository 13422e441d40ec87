//! Set or scale dwell times at stops

use super::{
    check_rebuilds, durations, patterns_of, rebuild_trip, resolve_routes, resolve_stops,
    scale_seconds, valid_factor, SECONDS_PER_DAY,
};
use crate::modification::{Diagnostics, Modification, StepFailure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tn_network::{NetworkError, RouteIndex, StopIndex, TransportNetwork, TripSchedule};

/// Change how long vehicles of the listed routes wait at stops
///
/// Exactly one of `dwell_secs` and `scale` must be set. Later times in each
/// trip shift by the change in dwell; travel times between stops are kept.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustDwellTime {
    /// Routes to change
    pub routes: Vec<String>,
    /// Stops to change; empty means every stop of the routes
    #[serde(default)]
    pub stops: Vec<String>,
    /// New dwell time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dwell_secs: Option<u32>,
    /// Multiplier for existing dwell times
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Comment and warnings
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    resolved_routes: BTreeSet<RouteIndex>,
    #[serde(skip)]
    resolved_stops: BTreeSet<StopIndex>,
}

impl AdjustDwellTime {
    /// Set dwell at every stop of `routes`
    #[must_use]
    pub fn set<S: Into<String>>(routes: impl IntoIterator<Item = S>, dwell_secs: u32) -> Self {
        Self {
            routes: routes.into_iter().map(Into::into).collect(),
            dwell_secs: Some(dwell_secs),
            ..Self::default()
        }
    }

    /// Scale dwell at every stop of `routes`
    #[must_use]
    pub fn scale<S: Into<String>>(routes: impl IntoIterator<Item = S>, scale: f64) -> Self {
        Self {
            routes: routes.into_iter().map(Into::into).collect(),
            scale: Some(scale),
            ..Self::default()
        }
    }

    /// Restrict to `stops`
    #[must_use]
    pub fn at_stops<S: Into<String>>(mut self, stops: impl IntoIterator<Item = S>) -> Self {
        self.stops = stops.into_iter().map(Into::into).collect();
        self
    }

    fn new_dwell(&self, current: u32) -> u32 {
        match (self.dwell_secs, self.scale) {
            (Some(secs), _) => secs,
            (None, Some(scale)) => scale_seconds(current, scale),
            (None, None) => current,
        }
    }

    fn redwell(&self, trip: &TripSchedule, stops: &[StopIndex]) -> Result<TripSchedule, NetworkError> {
        let (mut dwells, hops) = durations(trip);
        for (position, stop) in stops.iter().enumerate() {
            if self.resolved_stops.is_empty() || self.resolved_stops.contains(stop) {
                dwells[position] = self.new_dwell(dwells[position]);
            }
        }
        let first = trip.arrivals.first().copied().unwrap_or_default();
        rebuild_trip(trip.trip_id.clone(), first, &dwells, &hops)
    }
}

impl Modification for AdjustDwellTime {
    fn type_name(&self) -> &'static str {
        "adjust-dwell-time"
    }

    fn sort_order(&self) -> i32 {
        60
    }

    fn resolve(&mut self, network: &TransportNetwork) -> Result<(), StepFailure> {
        let transit = network.transit_layer();
        let mut problems = Vec::new();
        match (self.dwell_secs, self.scale) {
            (Some(_), Some(_)) | (None, None) => {
                problems.push("exactly one of dwell time and scale must be given".to_string());
            }
            (None, Some(scale)) if !valid_factor(scale) => {
                problems.push(format!("scale must be positive, got {scale}"));
            }
            (Some(secs), None) if secs > SECONDS_PER_DAY => {
                problems.push(format!("dwell time {secs} s is longer than a day"));
            }
            _ => {}
        }
        if self.routes.is_empty() {
            problems.push("no routes given".to_string());
        }
        self.resolved_routes = resolve_routes(transit, &self.routes, &mut problems);
        self.resolved_stops = resolve_stops(transit, &self.stops, &mut problems);
        if problems.is_empty() {
            let patterns = patterns_of(transit, &self.resolved_routes);
            check_rebuilds(transit, &patterns, |trip, stops| self.redwell(trip, stops), &mut problems);
        }
        self.diagnostics.check(problems)
    }

    fn apply(&mut self, network: &mut TransportNetwork) -> Result<(), StepFailure> {
        let transit = network.transit_layer_mut()?;
        let patterns = patterns_of(transit, &self.resolved_routes);
        for index in &patterns {
            let pattern = transit.pattern_mut(*index)?;
            let trips: Result<Vec<_>, _> = pattern
                .trips
                .iter()
                .map(|t| self.redwell(t, &pattern.stops))
                .collect();
            pattern.trips = trips.map_err(|e| self.diagnostics.fail(e.to_string()))?;
        }
        tracing::debug!(patterns = patterns.len(), "adjusted dwell times");
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
