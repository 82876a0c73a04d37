//! A vantage-point tree index over geospatial points.
//!
//! The entry point is [`tree::VpTree`], parameterized over a stored element type and, per
//! query, a [`geometry::DistanceMetric`] such as [`geometry::GreatCircleDistance`].
//!
//! ```
//! use geoindex::geometry::{GeoPoint, GreatCircleDistance};
//! use geoindex::tree::VpTree;
//!
//! let mut tree: VpTree<GeoPoint<&str>> = VpTree::empty(32).unwrap();
//! tree.add::<GreatCircleDistance>(GeoPoint::new(42.3601, -71.0589, Some("Boston")));
//! let nearest = tree.nearest_neighbor::<GreatCircleDistance>(
//!     &GeoPoint::new(42.4, -71.1, None),
//!     f64::INFINITY,
//!     None,
//! ).unwrap();
//! assert!(nearest.is_some());
//! ```

pub mod bbox;
mod collector;
pub mod exceptions;
pub mod geometry;
pub mod iter;
mod logging;
mod node;
pub mod tree;
