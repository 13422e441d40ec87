//! Add a new route with its own pattern and trips

use super::rebuild_trip;
use crate::modification::{Diagnostics, Modification, StepFailure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tn_network::{Coordinate, NetworkError, Route, Stop, TransitMode, TransportNetwork, TripPattern, TripSchedule};

/// A stop on a new route: an existing stop id, or a new stop when a
/// location is given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSpec {
    /// Stop id
    pub id: String,
    /// Name of a new stop; defaults to the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Latitude of a new stop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Longitude of a new stop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl StopSpec {
    /// Refer to an existing stop
    #[must_use]
    pub fn existing(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            lat: None,
            lon: None,
        }
    }

    /// Create a stop at a location
    #[must_use]
    pub fn new_at(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            lat: Some(lat),
            lon: Some(lon),
        }
    }

    fn location(&self) -> Option<Coordinate> {
        Some(Coordinate::from_degrees(self.lat?, self.lon?))
    }
}

/// Add a route running `departures.len()` trips over `stops`
///
/// Each departure is the arrival time at the first stop, in seconds after
/// midnight; the rest of the trip follows from the hop and dwell times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTrips {
    /// Id of the new route
    pub route_id: String,
    /// Display name of the new route
    #[serde(default)]
    pub route_name: String,
    /// Vehicle type
    pub mode: TransitMode,
    /// Stops in visiting order
    pub stops: Vec<StopSpec>,
    /// Travel time between consecutive stops
    pub hop_times: Vec<u32>,
    /// Time spent at each stop
    pub dwell_times: Vec<u32>,
    /// First-stop times of the trips
    pub departures: Vec<u32>,
    /// Comment and warnings
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
}

impl AddTrips {
    /// A route over `stops` with uniform hop and dwell times
    #[must_use]
    pub fn uniform(
        route_id: impl Into<String>,
        mode: TransitMode,
        stops: Vec<StopSpec>,
        hop_secs: u32,
        dwell_secs: u32,
        departures: Vec<u32>,
    ) -> Self {
        let n = stops.len();
        Self {
            route_id: route_id.into(),
            route_name: String::new(),
            mode,
            stops,
            hop_times: vec![hop_secs; n.saturating_sub(1)],
            dwell_times: vec![dwell_secs; n],
            departures,
            diagnostics: Diagnostics::default(),
        }
    }

    fn trips(&self) -> impl Iterator<Item = Result<TripSchedule, NetworkError>> + '_ {
        self.departures.iter().enumerate().map(|(i, &start)| {
            rebuild_trip(format!("{}:{i}", self.route_id), start, &self.dwell_times, &self.hop_times)
        })
    }
}

impl Modification for AddTrips {
    fn type_name(&self) -> &'static str {
        "add-trips"
    }

    fn sort_order(&self) -> i32 {
        70
    }

    fn resolve(&mut self, network: &TransportNetwork) -> Result<(), StepFailure> {
        let transit = network.transit_layer();
        let mut problems = Vec::new();
        if transit.route_index(&self.route_id).is_some() {
            problems.push(format!("route {} already exists", self.route_id));
        }
        let n = self.stops.len();
        if n < 2 {
            problems.push(format!("a route needs at least two stops, got {n}"));
        }
        if self.hop_times.len() + 1 != n {
            problems.push(format!("expected {} hop times, got {}", n.saturating_sub(1), self.hop_times.len()));
        }
        if self.dwell_times.len() != n {
            problems.push(format!("expected {n} dwell times, got {}", self.dwell_times.len()));
        }
        if self.departures.is_empty() {
            problems.push("no departures given".to_string());
        }
        if n >= 2 && self.hop_times.len() + 1 == n && self.dwell_times.len() == n {
            if let Some(e) = self.trips().find_map(Result::err) {
                problems.push(e.to_string());
            }
        }

        let mut new_ids = BTreeSet::new();
        for spec in &self.stops {
            match (spec.lat, spec.lon) {
                (Some(_), Some(_)) => {
                    if transit.stop_index(&spec.id).is_some() {
                        problems.push(format!("new stop {} collides with an existing stop", spec.id));
                    } else if !new_ids.insert(spec.id.as_str()) {
                        problems.push(format!("new stop {} is defined twice", spec.id));
                    }
                }
                (None, None) => {
                    if transit.stop_index(&spec.id).is_none() && !new_ids.contains(spec.id.as_str()) {
                        problems.push(format!("stop {} does not exist", spec.id));
                    }
                }
                _ => problems.push(format!("stop {} has only one of latitude and longitude", spec.id)),
            }
        }
        self.diagnostics.check(problems)
    }

    fn apply(&mut self, network: &mut TransportNetwork) -> Result<(), StepFailure> {
        let transit = network.transit_layer_mut()?;

        let mut stops = Vec::with_capacity(self.stops.len());
        for spec in &self.stops {
            let index = match (transit.stop_index(&spec.id), spec.location()) {
                (Some(existing), None) => existing,
                (None, Some(coordinate)) => transit.add_stop(Stop {
                    id: spec.id.clone(),
                    name: spec.name.clone().unwrap_or_else(|| spec.id.clone()),
                    coordinate,
                })?,
                _ => return Err(self.diagnostics.fail(format!("stop {} changed since resolve", spec.id))),
            };
            stops.push(index);
        }

        let route = transit.add_route(Route {
            id: self.route_id.clone(),
            name: self.route_name.clone(),
            mode: self.mode,
        })?;
        let trips: Result<Vec<_>, _> = self.trips().collect();
        let trips = trips.map_err(|e| self.diagnostics.fail(e.to_string()))?;
        transit.add_pattern(TripPattern { route, stops, trips })?;
        tracing::debug!(route = %self.route_id, trips = self.departures.len(), "added trips");
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
