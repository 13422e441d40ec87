//! Transit layer (Layer B)
//!
//! Stops, routes and trip patterns with their timetables, plus the
//! per-feed checksums the layer was built from. Id lookups are maintained
//! as records are added; the pattern-membership indexes are transient and
//! must be rebuilt with [`TransitLayer::rebuild_transient_indexes`] after
//! patterns change.

use crate::error::NetworkError;
use crate::geometry::Coordinate;
use crate::hash::{ContentHash, RecordHasher};
use crate::ids::{PatternIndex, RouteIndex, StopIndex};
use crate::merkle::DigestTree;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Vehicle type of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitMode {
    /// Bus
    Bus,
    /// Tram or light rail
    Tram,
    /// Metro
    Subway,
    /// Heavy rail
    Rail,
    /// Ferry
    Ferry,
}

impl TransitMode {
    fn code(self) -> u32 {
        match self {
            Self::Bus => 3,
            Self::Tram => 0,
            Self::Subway => 1,
            Self::Rail => 2,
            Self::Ferry => 4,
        }
    }
}

/// A boarding location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    /// Feed-scoped id
    pub id: String,
    /// Display name
    pub name: String,
    /// Location
    pub coordinate: Coordinate,
}

/// A named line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Feed-scoped id
    pub id: String,
    /// Display name
    pub name: String,
    /// Vehicle type
    pub mode: TransitMode,
}

/// One vehicle run along a pattern, times in seconds after midnight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSchedule {
    /// Trip id
    pub trip_id: String,
    /// Arrival at each stop of the pattern
    pub arrivals: Vec<u32>,
    /// Departure from each stop of the pattern
    pub departures: Vec<u32>,
}

impl TripSchedule {
    /// Check the schedule fits a pattern with `stop_count` stops and never
    /// runs backwards in time
    ///
    /// # Errors
    /// Returns [`NetworkError::InvalidTrip`] describing the first problem
    pub fn validate(&self, stop_count: usize) -> Result<(), NetworkError> {
        let invalid = |reason: String| NetworkError::InvalidTrip {
            trip_id: self.trip_id.clone(),
            reason,
        };
        if self.arrivals.len() != stop_count || self.departures.len() != stop_count {
            return Err(invalid(format!(
                "expected {stop_count} stop times, got {} arrivals and {} departures",
                self.arrivals.len(),
                self.departures.len()
            )));
        }
        for i in 0..stop_count {
            if self.departures[i] < self.arrivals[i] {
                return Err(invalid(format!("departs before arriving at stop {i}")));
            }
            if i + 1 < stop_count && self.arrivals[i + 1] < self.departures[i] {
                return Err(invalid(format!("arrives at stop {} before leaving {i}", i + 1)));
            }
        }
        Ok(())
    }

    /// Travel time from stop `i` to stop `i + 1`
    #[inline]
    #[must_use]
    pub fn hop_time(&self, i: usize) -> u32 {
        self.arrivals[i + 1] - self.departures[i]
    }

    /// Time spent at stop `i`
    #[inline]
    #[must_use]
    pub fn dwell_time(&self, i: usize) -> u32 {
        self.departures[i] - self.arrivals[i]
    }

    /// Rebuild times from a first arrival and per-stop dwell/hop durations
    ///
    /// # Errors
    /// Returns [`NetworkError::InvalidTrip`] if a time does not fit in a `u32`
    pub fn from_durations(
        trip_id: String,
        first_arrival: u32,
        dwells: &[u32],
        hops: &[u32],
    ) -> Result<Self, NetworkError> {
        let overflow = |stop: usize| NetworkError::InvalidTrip {
            trip_id: trip_id.clone(),
            reason: format!("time at stop {stop} overflows"),
        };
        let mut arrivals = Vec::with_capacity(dwells.len());
        let mut departures = Vec::with_capacity(dwells.len());
        let mut clock = first_arrival;
        for (i, dwell) in dwells.iter().enumerate() {
            arrivals.push(clock);
            clock = clock.checked_add(*dwell).ok_or_else(|| overflow(i))?;
            departures.push(clock);
            if let Some(hop) = hops.get(i) {
                clock = clock.checked_add(*hop).ok_or_else(|| overflow(i + 1))?;
            }
        }
        Ok(Self {
            trip_id,
            arrivals,
            departures,
        })
    }

    /// Seconds from first arrival to last departure
    #[must_use]
    pub fn duration(&self) -> u32 {
        match (self.arrivals.first(), self.departures.last()) {
            (Some(first), Some(last)) => last.saturating_sub(*first),
            _ => 0,
        }
    }

    /// Last departure, or 0 for an empty trip
    #[inline]
    #[must_use]
    pub fn end(&self) -> u32 {
        self.departures.last().copied().unwrap_or_default()
    }
}

/// A stop sequence served by one or more trips of a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripPattern {
    /// Owning route
    pub route: RouteIndex,
    /// Stops in visiting order
    pub stops: Vec<StopIndex>,
    /// Trips in departure order
    pub trips: Vec<TripSchedule>,
}

#[derive(Debug, Clone, Default)]
struct TransientIndexes {
    patterns_for_stop: Vec<Vec<PatternIndex>>,
    patterns_for_route: Vec<Vec<PatternIndex>>,
}

/// Scheduled service
#[derive(Debug, Clone, Default)]
pub struct TransitLayer {
    feed_checksums: BTreeMap<String, u64>,
    stops: Vec<Stop>,
    routes: Vec<Route>,
    patterns: Vec<TripPattern>,
    stop_by_id: HashMap<String, StopIndex>,
    route_by_id: HashMap<String, RouteIndex>,
    transient: TransientIndexes,
    transient_stale: bool,
}

impl TransitLayer {
    /// Create an empty layer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the checksum of a feed this layer was built from
    pub fn set_feed_checksum(&mut self, feed_id: impl Into<String>, checksum: u64) {
        self.feed_checksums.insert(feed_id.into(), checksum);
    }

    /// Feed id → checksum
    #[inline]
    #[must_use]
    pub fn feed_checksums(&self) -> &BTreeMap<String, u64> {
        &self.feed_checksums
    }

    /// Add a stop
    ///
    /// # Errors
    /// Returns [`NetworkError::DuplicateId`] if the id is taken
    pub fn add_stop(&mut self, stop: Stop) -> Result<StopIndex, NetworkError> {
        if self.stop_by_id.contains_key(&stop.id) {
            return Err(NetworkError::DuplicateId {
                kind: "stop",
                id: stop.id,
            });
        }
        let index = StopIndex::from_index(self.stops.len());
        self.stop_by_id.insert(stop.id.clone(), index);
        self.stops.push(stop);
        self.transient_stale = true;
        Ok(index)
    }

    /// A stop by index
    #[inline]
    #[must_use]
    pub fn stop(&self, index: StopIndex) -> Option<&Stop> {
        self.stops.get(index.index())
    }

    /// Look up a stop by id
    #[inline]
    #[must_use]
    pub fn stop_index(&self, id: &str) -> Option<StopIndex> {
        self.stop_by_id.get(id).copied()
    }

    /// Iterate stops
    pub fn stops(&self) -> impl Iterator<Item = (StopIndex, &Stop)> {
        self.stops
            .iter()
            .enumerate()
            .map(|(i, s)| (StopIndex::from_index(i), s))
    }

    /// Number of stops
    #[inline]
    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// Add a route
    ///
    /// # Errors
    /// Returns [`NetworkError::DuplicateId`] if the id is taken
    pub fn add_route(&mut self, route: Route) -> Result<RouteIndex, NetworkError> {
        if self.route_by_id.contains_key(&route.id) {
            return Err(NetworkError::DuplicateId {
                kind: "route",
                id: route.id,
            });
        }
        let index = RouteIndex::from_index(self.routes.len());
        self.route_by_id.insert(route.id.clone(), index);
        self.routes.push(route);
        self.transient_stale = true;
        Ok(index)
    }

    /// A route by index
    #[inline]
    #[must_use]
    pub fn route(&self, index: RouteIndex) -> Option<&Route> {
        self.routes.get(index.index())
    }

    /// Look up a route by id
    #[inline]
    #[must_use]
    pub fn route_index(&self, id: &str) -> Option<RouteIndex> {
        self.route_by_id.get(id).copied()
    }

    /// Add a pattern after checking its references and timetables
    ///
    /// # Errors
    /// Returns an error for unknown routes or stops and for malformed trips
    pub fn add_pattern(&mut self, pattern: TripPattern) -> Result<PatternIndex, NetworkError> {
        if self.route(pattern.route).is_none() {
            return Err(NetworkError::RouteNotFound(pattern.route));
        }
        if let Some(missing) = pattern.stops.iter().find(|s| self.stop(**s).is_none()) {
            return Err(NetworkError::StopNotFound(*missing));
        }
        for trip in &pattern.trips {
            trip.validate(pattern.stops.len())?;
        }
        let index = PatternIndex::from_index(self.patterns.len());
        self.patterns.push(pattern);
        self.transient_stale = true;
        Ok(index)
    }

    /// A pattern by index
    #[inline]
    #[must_use]
    pub fn pattern(&self, index: PatternIndex) -> Option<&TripPattern> {
        self.patterns.get(index.index())
    }

    /// Mutable access to a pattern; marks transient indexes stale
    ///
    /// # Errors
    /// Returns [`NetworkError::PatternNotFound`] for unknown indices
    pub fn pattern_mut(&mut self, index: PatternIndex) -> Result<&mut TripPattern, NetworkError> {
        self.transient_stale = true;
        self.patterns
            .get_mut(index.index())
            .ok_or(NetworkError::PatternNotFound(index))
    }

    /// Iterate patterns
    pub fn patterns(&self) -> impl Iterator<Item = (PatternIndex, &TripPattern)> {
        self.patterns
            .iter()
            .enumerate()
            .map(|(i, p)| (PatternIndex::from_index(i), p))
    }

    /// Number of patterns
    #[inline]
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Drop patterns for which `keep` returns false; pattern indices shift
    pub fn retain_patterns(&mut self, keep: impl FnMut(&TripPattern) -> bool) {
        self.patterns.retain(keep);
        self.transient_stale = true;
    }

    /// Total number of trips across patterns
    #[must_use]
    pub fn trip_count(&self) -> usize {
        self.patterns.iter().map(|p| p.trips.len()).sum()
    }

    /// Patterns serving a route, as of the last index rebuild
    #[must_use]
    pub fn patterns_for_route(&self, route: RouteIndex) -> &[PatternIndex] {
        self.transient
            .patterns_for_route
            .get(route.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Patterns calling at a stop, as of the last index rebuild
    #[must_use]
    pub fn patterns_for_stop(&self, stop: StopIndex) -> &[PatternIndex] {
        self.transient
            .patterns_for_stop
            .get(stop.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Whether the pattern-membership indexes lag behind the patterns
    #[inline]
    #[must_use]
    pub fn transient_indexes_stale(&self) -> bool {
        self.transient_stale
    }

    /// Recompute the pattern-membership indexes
    pub fn rebuild_transient_indexes(&mut self) {
        let mut patterns_for_stop = vec![Vec::new(); self.stops.len()];
        let mut patterns_for_route = vec![Vec::new(); self.routes.len()];
        for (index, pattern) in self.patterns() {
            patterns_for_route[pattern.route.index()].push(index);
            for stop in &pattern.stops {
                let list: &mut Vec<PatternIndex> = &mut patterns_for_stop[stop.index()];
                if list.last() != Some(&index) {
                    list.push(index);
                }
            }
        }
        self.transient = TransientIndexes {
            patterns_for_stop,
            patterns_for_route,
        };
        self.transient_stale = false;
        tracing::debug!(
            stops = self.stops.len(),
            patterns = self.patterns.len(),
            "rebuilt transit transient indexes"
        );
    }

    /// Content digest over feeds, stops, routes and patterns
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        let mut tree = DigestTree::new();
        for (feed, checksum) in &self.feed_checksums {
            tree.push(RecordHasher::new("feed").str(feed).u64(*checksum).finish());
        }
        for stop in &self.stops {
            tree.push(
                RecordHasher::new("stop")
                    .str(&stop.id)
                    .str(&stop.name)
                    .i32(stop.coordinate.lat_fixed)
                    .i32(stop.coordinate.lon_fixed)
                    .finish(),
            );
        }
        for route in &self.routes {
            tree.push(
                RecordHasher::new("route")
                    .str(&route.id)
                    .str(&route.name)
                    .u32(route.mode.code())
                    .finish(),
            );
        }
        for pattern in &self.patterns {
            let stops: Vec<u32> = pattern.stops.iter().map(|s| s.0).collect();
            let mut record = RecordHasher::new("pattern");
            record.u32(pattern.route.0).u32_seq(&stops);
            for trip in &pattern.trips {
                record
                    .str(&trip.trip_id)
                    .u32_seq(&trip.arrivals)
                    .u32_seq(&trip.departures);
            }
            tree.push(record.finish());
        }
        tree.root()
    }
}
