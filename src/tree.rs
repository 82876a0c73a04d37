//! The public vantage-point tree type and its operations.

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collector::Collector;
use crate::exceptions::GeoIndexError;
use crate::geometry::DistanceMetric;
use crate::iter::Iter;
use crate::node::{prune_path, Node};

/// Recommended default leaf capacity, matching the reference crate's historical module-level
/// constant. Nothing in this crate applies it automatically; a caller (or an adaptor) chooses
/// to pass it to [`VpTree::empty`] / [`VpTree::from_points`].
pub const DEFAULT_BIN_SIZE: usize = 32;

/// A vantage-point tree indexing points of type `E` under a caller-chosen
/// [`DistanceMetric`][crate::geometry::DistanceMetric], selected per call rather than stored on
/// the tree, so the same tree can be queried under different metrics without re-parameterizing
/// its type.
///
/// # Examples
///
/// ```
/// use geoindex::geometry::{GeoPoint, GreatCircleDistance};
/// use geoindex::tree::VpTree;
///
/// let mut tree: VpTree<GeoPoint<&str>> = VpTree::empty(4).unwrap();
/// tree.add::<GreatCircleDistance>(GeoPoint::new(42.3601, -71.0589, Some("Boston")));
/// tree.add::<GreatCircleDistance>(GeoPoint::new(40.7128, -74.0060, Some("New York")));
///
/// let nearest = tree.nearest_neighbor::<GreatCircleDistance>(
///     &GeoPoint::new(42.3875, -71.0995, None),
///     f64::INFINITY,
///     None,
/// ).unwrap();
/// assert_eq!(nearest.unwrap().data, Some("Boston"));
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct VpTree<E> {
    root: Node<E>,
    bin_size: usize,
}

impl<E: Clone + PartialEq> VpTree<E> {
    /// Creates an empty tree.
    ///
    /// # Arguments
    ///
    /// * `bin_size` - The maximum number of points a leaf may hold before the tree attempts to
    ///   split it. Must be at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`GeoIndexError::InvalidArgument`] if `bin_size` is `0`.
    pub fn empty(bin_size: usize) -> Result<Self, GeoIndexError> {
        if bin_size < 1 {
            return Err(GeoIndexError::invalid_argument(format!(
                "bin_size must be >= 1, got {bin_size}"
            )));
        }
        Ok(VpTree {
            root: Node::empty_leaf(),
            bin_size,
        })
    }

    /// Builds a tree from an owned collection of points in one bulk pass, partitioning
    /// recursively as needed rather than inserting one at a time.
    ///
    /// # Arguments
    ///
    /// * `points` - The points to index. This method takes ownership of the vector.
    /// * `bin_size` - The maximum number of points a leaf may hold before the tree attempts to
    ///   split it. Must be at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`GeoIndexError::InvalidArgument`] if `bin_size` is `0`.
    pub fn from_points<M: DistanceMetric<E>>(
        points: Vec<E>,
        bin_size: usize,
    ) -> Result<Self, GeoIndexError> {
        if bin_size < 1 {
            return Err(GeoIndexError::invalid_argument(format!(
                "bin_size must be >= 1, got {bin_size}"
            )));
        }
        info!("Building vantage-point tree from {} points", points.len());
        Ok(VpTree {
            root: Node::from_points::<M>(points, bin_size),
            bin_size,
        })
    }

    pub fn bin_size(&self) -> usize {
        self.bin_size
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.len() == 0
    }

    pub fn clear(&mut self) {
        self.root = Node::empty_leaf();
    }

    pub fn contains<M: DistanceMetric<E>>(&self, e: &E) -> bool {
        self.root.contains::<M>(e)
    }

    pub fn contains_all<M: DistanceMetric<E>>(&self, items: &[E]) -> bool {
        items.iter().all(|e| self.root.contains::<M>(e))
    }

    pub fn to_vec(&self) -> Vec<E> {
        self.root.to_vec()
    }

    pub fn iter(&self) -> Iter<'_, E> {
        let mut leaves = Vec::new();
        self.root.gather_leaves(&mut leaves);
        Iter::new(leaves)
    }

    /// Adds a single point, immediately attempting to partition its destination leaf if it
    /// becomes overloaded. Always returns `true`: mutation always modifies the tree.
    pub fn add<M: DistanceMetric<E>>(&mut self, e: E) -> bool {
        debug!("Adding a point to the vantage-point tree");
        self.root.add::<M>(e, self.bin_size);
        true
    }

    /// Adds a batch of points, deferring each touched leaf's partition attempt until every point
    /// routed to it has been absorbed.
    pub fn add_all<M: DistanceMetric<E>>(&mut self, items: Vec<E>) -> bool {
        if items.is_empty() {
            return false;
        }
        debug!("Adding {} points to the vantage-point tree", items.len());
        self.root.add_all::<M>(items, self.bin_size);
        true
    }

    /// Removes a single matching element. Returns whether anything was removed.
    pub fn remove<M: DistanceMetric<E>>(&mut self, e: &E) -> bool {
        let path = self.root.path_to::<M>(e);
        let removed = self.root.remove_leaf_only::<M>(e);
        if removed && self.root.node_at_path(&path).is_empty_leaf() {
            prune_path::<E, M>(&mut self.root, &path, self.bin_size);
        }
        removed
    }

    /// Removes every occurrence of every element in `items`. Returns whether anything was
    /// removed.
    ///
    /// Leaves emptied by the batch are pruned together at the end: nodes whose path is a
    /// descendant of another emptied node are skipped, since absorbing the ancestor already
    /// subsumes them.
    pub fn remove_all<M: DistanceMetric<E>>(&mut self, items: &[E]) -> bool {
        let mut any_removed = false;
        let mut emptied: HashSet<Vec<crate::node::Direction>> = HashSet::new();

        for item in items {
            loop {
                let path = self.root.path_to::<M>(item);
                if !self.root.remove_leaf_only::<M>(item) {
                    break;
                }
                any_removed = true;
                if self.root.node_at_path(&path).is_empty_leaf() {
                    emptied.insert(path);
                }
            }
        }

        let snapshot: Vec<Vec<crate::node::Direction>> = emptied.into_iter().collect();
        let to_prune: Vec<&Vec<crate::node::Direction>> = snapshot
            .iter()
            .filter(|path| !has_proper_ancestor(path, &snapshot))
            .collect();
        for path in to_prune {
            prune_path::<E, M>(&mut self.root, path, self.bin_size);
        }

        any_removed
    }

    /// Removes every stored element not present in `keep`. Returns whether anything was
    /// removed.
    pub fn retain_all<M: DistanceMetric<E>>(&mut self, keep: &[E]) -> bool {
        let to_remove: Vec<E> = self
            .to_vec()
            .into_iter()
            .filter(|e| !keep.contains(e))
            .collect();
        if to_remove.is_empty() {
            false
        } else {
            self.remove_all::<M>(&to_remove)
        }
    }

    /// Removes `old` and inserts `new` in its place.
    ///
    /// Always implemented as remove-then-add: a point whose coordinates change may need to move
    /// to a different leaf, and attempting to special-case "stays in the same leaf" would
    /// require either interior mutability or a definition of in-place mutation that does not
    /// translate cleanly to this crate's by-value element model.
    pub fn move_point<M: DistanceMetric<E>>(&mut self, old: &E, new: E) -> bool {
        if self.remove::<M>(old) {
            self.add::<M>(new);
            true
        } else {
            false
        }
    }

    /// Returns up to `k` nearest neighbors of `q`, each within `max_distance`, admitted by
    /// `filter` if given. Sorted nearest-first.
    ///
    /// # Arguments
    ///
    /// * `q` - The query point to search around.
    /// * `k` - The maximum number of neighbors to return.
    /// * `max_distance` - Upper bound on the accepted distance from `q`. Must be non-negative;
    ///   pass `f64::INFINITY` for no bound.
    /// * `filter` - An optional post-acceptance predicate; rejected points are never returned.
    ///
    /// # Errors
    ///
    /// Returns [`GeoIndexError::InvalidArgument`] if `max_distance` is negative.
    pub fn nearest_neighbors<M: DistanceMetric<E>>(
        &self,
        q: &E,
        k: usize,
        max_distance: f64,
        filter: Option<&dyn Fn(&E) -> bool>,
    ) -> Result<Vec<E>, GeoIndexError> {
        if max_distance < 0.0 {
            return Err(GeoIndexError::invalid_argument(format!(
                "max_distance must be >= 0, got {max_distance}"
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let mut collector = Collector::new(q.clone(), k, max_distance, filter);
        self.root.nearest_neighbors::<M>(&mut collector);
        Ok(collector.to_sorted_vec())
    }

    /// Shorthand for `nearest_neighbors(q, 1, max_distance, filter)` returning at most one
    /// point.
    ///
    /// # Arguments
    ///
    /// * `q` - The query point to search around.
    /// * `max_distance` - Upper bound on the accepted distance from `q`. Must be non-negative;
    ///   pass `f64::INFINITY` for no bound.
    /// * `filter` - An optional post-acceptance predicate; a rejected point is never returned.
    ///
    /// # Errors
    ///
    /// Returns [`GeoIndexError::InvalidArgument`] if `max_distance` is negative.
    pub fn nearest_neighbor<M: DistanceMetric<E>>(
        &self,
        q: &E,
        max_distance: f64,
        filter: Option<&dyn Fn(&E) -> bool>,
    ) -> Result<Option<E>, GeoIndexError> {
        Ok(self
            .nearest_neighbors::<M>(q, 1, max_distance, filter)?
            .into_iter()
            .next())
    }

    /// Returns every stored point within `radius` of `q`, admitted by `filter` if given, sorted
    /// nearest-first.
    ///
    /// # Arguments
    ///
    /// * `q` - The query point to search around.
    /// * `radius` - The search radius. Must be non-negative.
    /// * `filter` - An optional post-acceptance predicate; rejected points are never returned.
    ///
    /// # Errors
    ///
    /// Returns [`GeoIndexError::InvalidArgument`] if `radius` is negative.
    pub fn within_distance<M: DistanceMetric<E>>(
        &self,
        q: &E,
        radius: f64,
        filter: Option<&dyn Fn(&E) -> bool>,
    ) -> Result<Vec<E>, GeoIndexError> {
        if radius < 0.0 {
            return Err(GeoIndexError::invalid_argument(format!(
                "radius must be >= 0, got {radius}"
            )));
        }
        let mut out = Vec::new();
        self.root.within_distance::<M>(q, radius, filter, &mut out);
        out.sort_by(|a, b| {
            M::distance(q, a)
                .partial_cmp(&M::distance(q, b))
                .unwrap()
        });
        Ok(out)
    }
}

fn has_proper_ancestor(path: &[crate::node::Direction], all: &[Vec<crate::node::Direction>]) -> bool {
    all.iter()
        .any(|other| other.len() < path.len() && path.starts_with(other.as_slice()))
}
