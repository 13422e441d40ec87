//! Built-in modification kinds
//!
//! Sort orders place street changes before transit changes, and within the
//! transit layer removals before adjustments before additions.

mod add_streets;
mod add_trips;
mod adjust_dwell_time;
mod adjust_speed;
mod modify_streets;
mod remove_stops;
mod remove_streets;
mod remove_trips;

pub use add_streets::AddStreets;
pub use add_trips::{AddTrips, StopSpec};
pub use adjust_dwell_time::AdjustDwellTime;
pub use adjust_speed::AdjustSpeed;
pub use modify_streets::ModifyStreets;
pub use remove_stops::RemoveStops;
pub use remove_streets::RemoveStreets;
pub use remove_trips::RemoveTrips;

use std::collections::BTreeSet;
use tn_network::{NetworkError, PatternIndex, RouteIndex, StopIndex, TransitLayer, TripSchedule};

/// Seconds in one service day
const SECONDS_PER_DAY: u32 = 86_400;

/// Latest departure a rebuilt trip may reach; trips may run past midnight
/// into the next service day but no further
const MAX_SCHEDULE_SECS: u32 = 2 * SECONDS_PER_DAY;

fn resolve_routes(
    transit: &TransitLayer,
    ids: &[String],
    problems: &mut Vec<String>,
) -> BTreeSet<RouteIndex> {
    ids.iter()
        .filter_map(|id| {
            let found = transit.route_index(id);
            if found.is_none() {
                problems.push(format!("route {id} does not exist"));
            }
            found
        })
        .collect()
}

fn resolve_stops(
    transit: &TransitLayer,
    ids: &[String],
    problems: &mut Vec<String>,
) -> BTreeSet<StopIndex> {
    ids.iter()
        .filter_map(|id| {
            let found = transit.stop_index(id);
            if found.is_none() {
                problems.push(format!("stop {id} does not exist"));
            }
            found
        })
        .collect()
}

/// Patterns of the given routes, scanned directly so that stale transient
/// indexes do not matter
fn patterns_of(transit: &TransitLayer, routes: &BTreeSet<RouteIndex>) -> Vec<PatternIndex> {
    transit
        .patterns()
        .filter(|(_, p)| routes.contains(&p.route))
        .map(|(i, _)| i)
        .collect()
}

/// Split a trip into per-stop dwell times and per-hop travel times
fn durations(trip: &TripSchedule) -> (Vec<u32>, Vec<u32>) {
    let n = trip.arrivals.len();
    let dwells = (0..n).map(|i| trip.dwell_time(i)).collect();
    let hops = (0..n.saturating_sub(1)).map(|i| trip.hop_time(i)).collect();
    (dwells, hops)
}

/// Lay out a trip from durations and check it ends inside the service window
fn rebuild_trip(
    trip_id: String,
    first_arrival: u32,
    dwells: &[u32],
    hops: &[u32],
) -> Result<TripSchedule, NetworkError> {
    let trip = TripSchedule::from_durations(trip_id, first_arrival, dwells, hops)?;
    if trip.end() > MAX_SCHEDULE_SECS {
        return Err(NetworkError::InvalidTrip {
            reason: format!(
                "would end at {} s, past the {MAX_SCHEDULE_SECS} s service window",
                trip.end()
            ),
            trip_id: trip.trip_id,
        });
    }
    Ok(trip)
}

/// Rebuild every trip of `patterns` without touching the layer, pushing the
/// first failure into `problems`
fn check_rebuilds(
    transit: &TransitLayer,
    patterns: &[PatternIndex],
    rebuild: impl Fn(&TripSchedule, &[StopIndex]) -> Result<TripSchedule, NetworkError>,
    problems: &mut Vec<String>,
) {
    for pattern in patterns.iter().filter_map(|&index| transit.pattern(index)) {
        for trip in &pattern.trips {
            if let Err(e) = rebuild(trip, &pattern.stops) {
                problems.push(e.to_string());
                return;
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_seconds(seconds: u32, factor: f64) -> u32 {
    (f64::from(seconds) * factor).round().clamp(0.0, f64::from(u32::MAX)) as u32
}

fn valid_factor(factor: f64) -> bool {
    factor.is_finite() && factor > 0.0
}
