//! Fixed-point coordinates and envelopes
//!
//! Coordinates are stored as degrees scaled by 10^7 so that equality and
//! hashing are exact. Distances use an equirectangular approximation, which
//! is accurate to well under a percent at the scales the network cares about
//! (a few kilometres).

use serde::{Deserialize, Serialize};

/// Degrees are stored multiplied by this factor
pub const FIXED_FACTOR: f64 = 1e7;

/// Metres per degree of latitude
pub const METERS_PER_DEGREE_LAT: f64 = 111_111.111;

/// Convert fixed-point degrees to floating degrees
#[inline]
#[must_use]
pub fn fixed_to_floating(fixed: i32) -> f64 {
    f64::from(fixed) / FIXED_FACTOR
}

/// Convert floating degrees to fixed-point degrees
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn floating_to_fixed(degrees: f64) -> i32 {
    (degrees * FIXED_FACTOR).round() as i32
}

/// A WGS84 point in fixed-point degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude × 10^7
    pub lat_fixed: i32,
    /// Longitude × 10^7
    pub lon_fixed: i32,
}

impl Coordinate {
    /// Create from floating degrees
    #[inline]
    #[must_use]
    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self {
            lat_fixed: floating_to_fixed(lat),
            lon_fixed: floating_to_fixed(lon),
        }
    }

    /// Latitude in degrees
    #[inline]
    #[must_use]
    pub fn lat(&self) -> f64 {
        fixed_to_floating(self.lat_fixed)
    }

    /// Longitude in degrees
    #[inline]
    #[must_use]
    pub fn lon(&self) -> f64 {
        fixed_to_floating(self.lon_fixed)
    }

    /// Approximate distance to another point in metres
    #[must_use]
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let mean_lat = ((self.lat() + other.lat()) / 2.0).to_radians();
        let dy = (self.lat() - other.lat()) * METERS_PER_DEGREE_LAT;
        let dx = (self.lon() - other.lon()) * METERS_PER_DEGREE_LAT * mean_lat.cos();
        dx.hypot(dy)
    }
}

/// Axis-aligned bounding box in floating degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Southern edge
    pub min_lat: f64,
    /// Western edge
    pub min_lon: f64,
    /// Northern edge
    pub max_lat: f64,
    /// Eastern edge
    pub max_lon: f64,
}

impl Envelope {
    /// Create from corner values
    #[inline]
    #[must_use]
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Degenerate envelope around one point
    #[inline]
    #[must_use]
    pub fn of_point(point: &Coordinate) -> Self {
        Self::new(point.lat(), point.lon(), point.lat(), point.lon())
    }

    /// Smallest envelope covering all points, `None` for no points
    #[must_use]
    pub fn covering<'a>(points: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut env = Self::of_point(first);
        for point in iter {
            env.include(point);
        }
        Some(env)
    }

    /// Whether the corners are ordered and finite
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.min_lat, self.min_lon, self.max_lat, self.max_lon]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lat <= self.max_lat
            && self.min_lon <= self.max_lon
    }

    /// Grow to include a point
    pub fn include(&mut self, point: &Coordinate) {
        self.min_lat = self.min_lat.min(point.lat());
        self.min_lon = self.min_lon.min(point.lon());
        self.max_lat = self.max_lat.max(point.lat());
        self.max_lon = self.max_lon.max(point.lon());
    }

    /// Grow to include another envelope
    pub fn merge(&mut self, other: &Self) {
        self.min_lat = self.min_lat.min(other.min_lat);
        self.min_lon = self.min_lon.min(other.min_lon);
        self.max_lat = self.max_lat.max(other.max_lat);
        self.max_lon = self.max_lon.max(other.max_lon);
    }

    /// Buffer by a distance in metres on every side
    ///
    /// The longitude buffer uses the latitude closest to a pole so the result
    /// is never narrower than the requested distance.
    #[must_use]
    pub fn buffered(&self, meters: f64) -> Self {
        let dlat = meters / METERS_PER_DEGREE_LAT;
        let extreme_lat = self.min_lat.abs().max(self.max_lat.abs()) + dlat;
        let cos = extreme_lat.min(89.0).to_radians().cos();
        let dlon = meters / (METERS_PER_DEGREE_LAT * cos);
        Self::new(
            self.min_lat - dlat,
            self.min_lon - dlon,
            self.max_lat + dlat,
            self.max_lon + dlon,
        )
    }

    /// Whether the point lies inside or on the boundary
    #[inline]
    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        let (lat, lon) = (point.lat(), point.lon());
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Whether two envelopes overlap
    #[inline]
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
    }
}
