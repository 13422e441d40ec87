//! Remove whole routes' worth of trips or individual trips

use super::resolve_routes;
use crate::modification::{Diagnostics, Modification, StepFailure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tn_network::{PatternIndex, RouteIndex, TransportNetwork};

/// Drop every trip of the listed routes plus the listed trips
///
/// Patterns left without trips are removed. Stops and routes stay.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveTrips {
    /// Routes whose trips are all removed
    #[serde(default)]
    pub routes: Vec<String>,
    /// Individual trips to remove
    #[serde(default)]
    pub trips: Vec<String>,
    /// Comment and warnings
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    resolved_routes: BTreeSet<RouteIndex>,
}

impl RemoveTrips {
    /// Remove all trips of `routes`
    #[must_use]
    pub fn routes<S: Into<String>>(routes: impl IntoIterator<Item = S>) -> Self {
        Self {
            routes: routes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Remove the given trips
    #[must_use]
    pub fn trips<S: Into<String>>(trips: impl IntoIterator<Item = S>) -> Self {
        Self {
            trips: trips.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl Modification for RemoveTrips {
    fn type_name(&self) -> &'static str {
        "remove-trips"
    }

    fn sort_order(&self) -> i32 {
        30
    }

    fn resolve(&mut self, network: &TransportNetwork) -> Result<(), StepFailure> {
        let transit = network.transit_layer();
        let mut problems = Vec::new();
        if self.routes.is_empty() && self.trips.is_empty() {
            problems.push("no routes or trips given".to_string());
        }
        self.resolved_routes = resolve_routes(transit, &self.routes, &mut problems);

        let known: BTreeSet<&str> = transit
            .patterns()
            .flat_map(|(_, p)| p.trips.iter().map(|t| t.trip_id.as_str()))
            .collect();
        for trip in &self.trips {
            if !known.contains(trip.as_str()) {
                problems.push(format!("trip {trip} does not exist"));
            }
        }
        self.diagnostics.check(problems)
    }

    fn apply(&mut self, network: &mut TransportNetwork) -> Result<(), StepFailure> {
        let transit = network.transit_layer_mut()?;
        let trips: BTreeSet<&str> = self.trips.iter().map(String::as_str).collect();
        let before = transit.trip_count();

        let mut emptied = BTreeSet::new();
        for i in 0..transit.pattern_count() {
            let pattern = transit.pattern_mut(PatternIndex::from_index(i))?;
            if self.resolved_routes.contains(&pattern.route) {
                pattern.trips.clear();
            } else {
                pattern.trips.retain(|t| !trips.contains(t.trip_id.as_str()));
            }
            if pattern.trips.is_empty() {
                emptied.insert(i);
            }
        }

        let mut position = 0;
        transit.retain_patterns(|_| {
            let keep = !emptied.contains(&position);
            position += 1;
            keep
        });

        let removed = before - transit.trip_count();
        if removed == 0 {
            self.diagnostics.warn("no trips were removed");
        }
        tracing::debug!(removed, patterns_dropped = emptied.len(), "removed trips");
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
