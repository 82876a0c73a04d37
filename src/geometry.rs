//! Geospatial point type, the pluggable distance metric trait, and the bounding-box query
//! adaptor built on top of it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used by [`GreatCircleDistance`]. This is the same constant a
/// great-circle distance calculation conventionally uses; it is not configurable because the
/// index does not support alternate projections (see the crate's non-goals).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point on the Earth's surface, given as latitude/longitude in degrees, with an optional
/// caller-supplied payload.
///
/// Latitude is expected in `[-90, 90]` and longitude in `(-180, 180]`; the index itself does not
/// validate these ranges (see [`crate::tree::VpTree`] invariants), only the bounding-box adaptor
/// normalizes longitude for wraparound handling.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint<T> {
    pub lat: f64,
    pub lon: f64,
    pub data: Option<T>,
}

impl<T> GeoPoint<T> {
    pub fn new(lat: f64, lon: f64, data: Option<T>) -> Self {
        GeoPoint { lat, lon, data }
    }
}

/// A pluggable distance function between two points of type `P`.
///
/// Implementations are zero-sized marker types selected as a type parameter on the query
/// methods of [`crate::tree::VpTree`], mirroring how a caller picks a metric for a k-NN search.
pub trait DistanceMetric<P> {
    /// Returns the distance between `a` and `b`. Must be non-negative, symmetric, and satisfy
    /// the triangle inequality; the vantage-point tree's pruning is unsound otherwise.
    fn distance(a: &P, b: &P) -> f64;
}

/// Great-circle (haversine) distance between two [`GeoPoint`]s, in meters, assuming a sphere of
/// radius [`EARTH_RADIUS_M`].
pub struct GreatCircleDistance;

impl<T> DistanceMetric<GeoPoint<T>> for GreatCircleDistance {
    fn distance(a: &GeoPoint<T>, b: &GeoPoint<T>) -> f64 {
        haversine_distance(a.lat, a.lon, b.lat, b.lon)
    }
}

fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// A latitude/longitude bounding box, used by [`crate::bbox::bounding_box_query`].
///
/// `west` and `east` may wrap across the antimeridian (`west > east` means the box spans
/// longitude 180/-180); see [`crate::bbox`] for details.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        BoundingBox {
            south,
            west,
            north,
            east,
        }
    }

    /// The four corners of the box, in (lat, lon) degree pairs.
    pub(crate) fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.south, self.west),
            (self.south, self.east),
            (self.north, self.west),
            (self.north, self.east),
        ]
    }
}
