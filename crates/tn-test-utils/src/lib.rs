//! Testing utilities for the scenario engine workspace
//!
//! Shared fixtures and a scriptable modification.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::sync::Arc;
use tn_modification::{Diagnostics, Modification, StepFailure};
use tn_network::{
    kph_to_cms, Coordinate, LinkageParams, Permissions, Route, Stop, StreetLayer, TransitLayer,
    TransitMode, TransportNetwork, TripPattern, TripSchedule,
};

pub const FEED_ID: &str = "gtfs1";
pub const FEED_CHECKSUM: u64 = 100;

pub const GRID_SIZE: usize = 5;
pub const GRID_LAT_STEP: f64 = 0.002;
pub const GRID_LON_STEP: f64 = 0.003;
pub const GRID_ORIGIN: (f64, f64) = (45.0, 7.0);

/// Coordinate of grid vertex `(row, col)`
#[allow(clippy::cast_precision_loss)]
pub fn grid_point(row: usize, col: usize) -> (f64, f64) {
    (
        GRID_ORIGIN.0 + row as f64 * GRID_LAT_STEP,
        GRID_ORIGIN.1 + col as f64 * GRID_LON_STEP,
    )
}

/// `size` × `size` grid of bidirectional 30 km/h streets; vertex id is
/// `row * size + col`
pub fn grid_street_layer(size: usize) -> StreetLayer {
    let mut street = StreetLayer::new();
    let mut ids = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            let (lat, lon) = grid_point(row, col);
            ids.push(street.add_vertex(Coordinate::from_degrees(lat, lon)));
        }
    }
    let speed = kph_to_cms(30.0);
    for row in 0..size {
        for col in 0..size {
            let here = ids[row * size + col];
            if col + 1 < size {
                street.add_street(here, ids[row * size + col + 1], speed, Permissions::ALL).unwrap();
            }
            if row + 1 < size {
                street.add_street(here, ids[(row + 1) * size + col], speed, Permissions::ALL).unwrap();
            }
        }
    }
    street
}

fn stop_at(id: &str, row: usize, col: usize) -> Stop {
    let (lat, lon) = grid_point(row, col);
    Stop {
        id: id.to_string(),
        name: format!("Stop {id}"),
        coordinate: Coordinate::from_degrees(lat, lon),
    }
}

/// Two routes over six stops placed on grid vertices
///
/// - `r1` (bus) calls at a, b, c, d along the diagonal; trips `r1-0800`
///   and `r1-0830`, 120 s hops, 30 s dwell at b and c
/// - `r2` (tram) calls at x, c, y; trip `r2-0900`, 300 s hops, 60 s dwell at c
pub fn two_route_transit_layer() -> TransitLayer {
    let mut transit = TransitLayer::new();
    transit.set_feed_checksum(FEED_ID, FEED_CHECKSUM);
    for (id, row, col) in [
        ("a", 0, 0),
        ("b", 1, 1),
        ("c", 2, 2),
        ("d", 3, 3),
        ("x", 0, 4),
        ("y", 4, 0),
    ] {
        transit.add_stop(stop_at(id, row, col)).unwrap();
    }
    let stop = |id: &str| transit.stop_index(id).unwrap();
    let r1_stops = vec![stop("a"), stop("b"), stop("c"), stop("d")];
    let r2_stops = vec![stop("x"), stop("c"), stop("y")];

    let r1 = transit
        .add_route(Route {
            id: "r1".into(),
            name: "Diagonal".into(),
            mode: TransitMode::Bus,
        })
        .unwrap();
    let r2 = transit
        .add_route(Route {
            id: "r2".into(),
            name: "Cross".into(),
            mode: TransitMode::Tram,
        })
        .unwrap();

    let r1_trips = [("r1-0800", 28_800), ("r1-0830", 30_600)]
        .into_iter()
        .map(|(id, start)| TripSchedule::from_durations(id.into(), start, &[0, 30, 30, 0], &[120, 120, 120]).unwrap())
        .collect();
    transit
        .add_pattern(TripPattern {
            route: r1,
            stops: r1_stops,
            trips: r1_trips,
        })
        .unwrap();
    transit
        .add_pattern(TripPattern {
            route: r2,
            stops: r2_stops,
            trips: vec![TripSchedule::from_durations("r2-0900".into(), 32_400, &[0, 60, 0], &[300, 300]).unwrap()],
        })
        .unwrap();
    transit
}

/// Grid streets plus the two-route transit layer, fully indexed
pub fn baseline_network() -> TransportNetwork {
    TransportNetwork::build(
        grid_street_layer(GRID_SIZE),
        two_route_transit_layer(),
        LinkageParams::default(),
    )
}

pub fn shared_baseline() -> Arc<TransportNetwork> {
    Arc::new(baseline_network())
}

/// Shared record of modification calls, `"<label>:<phase>"`
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Scriptable modification that logs its calls
///
/// Applying touches the flagged layers through their mutable accessors, so
/// it also proves the scoped copy handed out exclusive access.
#[derive(Debug, Clone)]
pub struct RecordingModification {
    pub label: String,
    pub sort_order: i32,
    pub street: bool,
    pub transit: bool,
    pub fail_resolve: bool,
    pub fail_apply: bool,
    pub diagnostics: Diagnostics,
    log: CallLog,
}

impl RecordingModification {
    pub fn new(label: &str, sort_order: i32, log: &CallLog) -> Self {
        Self {
            label: label.to_string(),
            sort_order,
            street: false,
            transit: true,
            fail_resolve: false,
            fail_apply: false,
            diagnostics: Diagnostics::with_comment(format!("recording {label}")),
            log: Arc::clone(log),
        }
    }

    pub fn on_street(mut self) -> Self {
        self.street = true;
        self.transit = false;
        self
    }

    pub fn on_nothing(mut self) -> Self {
        self.street = false;
        self.transit = false;
        self
    }

    pub fn failing_resolve(mut self) -> Self {
        self.fail_resolve = true;
        self
    }

    pub fn failing_apply(mut self) -> Self {
        self.fail_apply = true;
        self
    }

    pub fn boxed(self) -> Box<dyn Modification> {
        Box::new(self)
    }
}

impl Modification for RecordingModification {
    fn type_name(&self) -> &'static str {
        "recording"
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }

    fn resolve(&mut self, _network: &TransportNetwork) -> Result<(), StepFailure> {
        self.log.lock().push(format!("{}:resolve", self.label));
        if self.fail_resolve {
            return Err(self.diagnostics.fail(format!("{} refused to resolve", self.label)));
        }
        Ok(())
    }

    fn apply(&mut self, network: &mut TransportNetwork) -> Result<(), StepFailure> {
        self.log.lock().push(format!("{}:apply", self.label));
        if self.fail_apply {
            return Err(self.diagnostics.fail(format!("{} refused to apply", self.label)));
        }
        if self.street {
            network.street_layer_mut()?;
        }
        if self.transit {
            network.transit_layer_mut()?;
        }
        Ok(())
    }

    fn affects_street_layer(&self) -> bool {
        self.street
    }

    fn affects_transit_layer(&self) -> bool {
        self.transit
    }

    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}
