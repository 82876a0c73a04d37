//! Bounding-box query adaptor.
//!
//! The tree itself only exposes radius queries; this module builds a rectangular
//! latitude/longitude query on top of [`crate::tree::VpTree::within_distance`] by enclosing the
//! box in a minimal bounding circle and filtering the circle's results down to the box.

use crate::geometry::{BoundingBox, DistanceMetric, GeoPoint, GreatCircleDistance};
use crate::tree::VpTree;

/// Returns every stored point that falls within `bbox`, further restricted by `filter` if
/// given.
///
/// Internally this computes the centroid of the box's four corners (averaged as unit vectors on
/// the sphere, not as a naive lat/lon mean, which breaks down near the poles and the
/// antimeridian), takes the farthest corner from that centroid as a safe search radius, and then
/// filters the resulting candidates down to the exact box. `west > east` is treated as a box
/// that wraps across the antimeridian.
pub fn bounding_box_query<T, F>(
    tree: &VpTree<GeoPoint<T>>,
    bbox: &BoundingBox,
    filter: Option<&F>,
) -> Vec<GeoPoint<T>>
where
    T: Clone + PartialEq,
    F: Fn(&GeoPoint<T>) -> bool,
{
    let centroid = spherical_centroid(bbox);
    let radius = bbox
        .corners()
        .iter()
        .map(|&(lat, lon)| GreatCircleDistance::distance(&centroid, &GeoPoint::new(lat, lon, None)))
        .fold(0.0_f64, f64::max);

    let south = bbox.south;
    let north = bbox.north;
    let west = bbox.west;
    let east = bbox.east;
    let combined = move |p: &GeoPoint<T>| {
        p.lat >= south
            && p.lat <= north
            && longitude_in_arc(p.lon, west, east)
            && filter.map_or(true, |f| f(p))
    };

    tree.within_distance::<GreatCircleDistance>(&centroid, radius, Some(&combined))
        .unwrap_or_default()
}

/// The centroid of the box's four corners on the sphere, computed by averaging their unit
/// Cartesian vectors and converting back to lat/lon. Using the naive arithmetic mean of the
/// corner coordinates would give a poor (or, near the poles, nonsensical) center.
fn spherical_centroid<T>(bbox: &BoundingBox) -> GeoPoint<T> {
    let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
    for (lat_deg, lon_deg) in bbox.corners() {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();
        x += lat.cos() * lon.cos();
        y += lat.cos() * lon.sin();
        z += lat.sin();
    }
    x /= 4.0;
    y /= 4.0;
    z /= 4.0;
    let hyp = (x * x + y * y).sqrt();
    let lat = z.atan2(hyp).to_degrees();
    let lon = y.atan2(x).to_degrees();
    GeoPoint::new(lat, lon, None)
}

/// Normalizes a longitude in degrees to `(-180, 180]`.
fn normalize_longitude(lon: f64) -> f64 {
    let mut l = lon % 360.0;
    if l <= -180.0 {
        l += 360.0;
    } else if l > 180.0 {
        l -= 360.0;
    }
    l
}

/// True if `lon` falls on the shorter arc running from `west` to `east`. When `west > east`
/// (after normalization) the arc is taken to cross the antimeridian.
fn longitude_in_arc(lon: f64, west: f64, east: f64) -> bool {
    let lon = normalize_longitude(lon);
    let west = normalize_longitude(west);
    let east = normalize_longitude(east);
    if west <= east {
        lon >= west && lon <= east
    } else {
        lon >= west || lon <= east
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(0.0), 0.0);
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(-180.0), 180.0);
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
    }

    #[test]
    fn test_longitude_in_arc_non_wrapping() {
        assert!(longitude_in_arc(-72.0, -75.0, -70.0));
        assert!(!longitude_in_arc(-80.0, -75.0, -70.0));
    }

    #[test]
    fn test_longitude_in_arc_wrapping_antimeridian() {
        // Box spans from 170 east across the antimeridian to -170 (170 west).
        assert!(longitude_in_arc(175.0, 170.0, -170.0));
        assert!(longitude_in_arc(-175.0, 170.0, -170.0));
        assert!(!longitude_in_arc(0.0, 170.0, -170.0));
    }

    #[test]
    fn test_spherical_centroid_of_small_box_is_near_midpoint() {
        let bbox = BoundingBox::new(40.0, -75.0, 42.0, -73.0);
        let centroid: GeoPoint<()> = spherical_centroid(&bbox);
        assert!((centroid.lat - 41.0).abs() < 0.1);
        assert!((centroid.lon - (-74.0)).abs() < 0.1);
    }
}
