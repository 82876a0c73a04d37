//! The recursive vantage-point node: a tagged union of leaf and internal nodes, the median-based
//! partitioning algorithm, and the branch-and-bound search routines.
//!
//! Unlike a tree where an absent child is modeled with `Option<Box<_>>`, a VP node always has
//! exactly zero or two children, so the leaf/internal split is modeled as an enum instead of an
//! optional pointer.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::collector::Collector;
use crate::exceptions::GeoIndexError;
use crate::geometry::DistanceMetric;

/// Which child subtree a point was routed to while descending an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Direction {
    Inside,
    Outside,
}

pub(crate) type Path = Vec<Direction>;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub(crate) enum Node<E> {
    Leaf {
        points: Vec<E>,
        /// The first point ever stored in this leaf. Set once, on first insertion, and never
        /// changed afterward even if that exact element is later removed.
        center: Option<E>,
    },
    Internal {
        center: E,
        threshold: f64,
        inside: Box<Node<E>>,
        outside: Box<Node<E>>,
    },
}

impl<E: Clone + PartialEq> Node<E> {
    pub(crate) fn empty_leaf() -> Self {
        Node::Leaf {
            points: Vec::new(),
            center: None,
        }
    }

    /// Builds a subtree from an owned collection of points, partitioning recursively wherever
    /// a chunk exceeds `bin_size`. Used both for `from_points` and for rebuilding a subtree
    /// after it has been absorbed back into a single overloaded leaf.
    pub(crate) fn from_points<M: DistanceMetric<E>>(points: Vec<E>, bin_size: usize) -> Self {
        if points.len() <= bin_size {
            let center = points.first().cloned();
            return Node::Leaf { points, center };
        }
        let center = points[0].clone();
        match try_partition::<E, M>(points, &center) {
            Ok((threshold, inside_pts, outside_pts)) => Node::Internal {
                center,
                threshold,
                inside: Box::new(Node::from_points::<M>(inside_pts, bin_size)),
                outside: Box::new(Node::from_points::<M>(outside_pts, bin_size)),
            },
            Err(points) => {
                let center = points.first().cloned();
                Node::Leaf { points, center }
            }
        }
    }

    pub(crate) fn is_empty_leaf(&self) -> bool {
        matches!(self, Node::Leaf { points, .. } if points.is_empty())
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Node::Leaf { points, .. } => points.len(),
            Node::Internal { inside, outside, .. } => inside.len() + outside.len(),
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<E> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<E>) {
        match self {
            Node::Leaf { points, .. } => out.extend(points.iter().cloned()),
            Node::Internal { inside, outside, .. } => {
                inside.collect_into(out);
                outside.collect_into(out);
            }
        }
    }

    pub(crate) fn gather_leaves<'a>(&'a self, out: &mut Vec<&'a Vec<E>>) {
        match self {
            Node::Leaf { points, .. } => out.push(points),
            Node::Internal { inside, outside, .. } => {
                inside.gather_leaves(out);
                outside.gather_leaves(out);
            }
        }
    }

    pub(crate) fn contains<M: DistanceMetric<E>>(&self, e: &E) -> bool {
        match self {
            Node::Leaf { points, .. } => points.contains(e),
            Node::Internal {
                center,
                threshold,
                inside,
                outside,
            } => {
                if M::distance(center, e) <= *threshold {
                    inside.contains::<M>(e)
                } else {
                    outside.contains::<M>(e)
                }
            }
        }
    }

    /// Appends a single point, partitioning immediately if the destination leaf becomes
    /// overloaded as a result.
    pub(crate) fn add<M: DistanceMetric<E>>(&mut self, e: E, bin_size: usize) {
        match self {
            Node::Leaf { points, center } => {
                if center.is_none() {
                    *center = Some(e.clone());
                }
                points.push(e);
                if points.len() > bin_size {
                    let pts = std::mem::take(points);
                    let ctr = center.clone().expect("leaf with points has a center");
                    match try_partition::<E, M>(pts, &ctr) {
                        Ok((threshold, inside_pts, outside_pts)) => {
                            *self = Node::Internal {
                                center: ctr,
                                threshold,
                                inside: Box::new(Node::from_points::<M>(inside_pts, bin_size)),
                                outside: Box::new(Node::from_points::<M>(outside_pts, bin_size)),
                            };
                        }
                        Err(pts_back) => {
                            if let Node::Leaf { points, .. } = self {
                                *points = pts_back;
                            }
                        }
                    }
                }
            }
            Node::Internal {
                center,
                threshold,
                inside,
                outside,
            } => {
                if M::distance(center, &e) <= *threshold {
                    inside.add::<M>(e, bin_size);
                } else {
                    outside.add::<M>(e, bin_size);
                }
            }
        }
    }

    /// Appends a batch of points, deferring partition of each destination leaf until every
    /// point routed to it in this call has been absorbed.
    pub(crate) fn add_all<M: DistanceMetric<E>>(&mut self, items: Vec<E>, bin_size: usize) {
        if items.is_empty() {
            return;
        }
        match self {
            Node::Leaf { points, center } => {
                if center.is_none() {
                    *center = items.first().cloned();
                }
                points.extend(items);
                if points.len() > bin_size {
                    let pts = std::mem::take(points);
                    let ctr = center.clone().expect("leaf with points has a center");
                    match try_partition::<E, M>(pts, &ctr) {
                        Ok((threshold, inside_pts, outside_pts)) => {
                            *self = Node::Internal {
                                center: ctr,
                                threshold,
                                inside: Box::new(Node::from_points::<M>(inside_pts, bin_size)),
                                outside: Box::new(Node::from_points::<M>(outside_pts, bin_size)),
                            };
                        }
                        Err(pts_back) => {
                            if let Node::Leaf { points, .. } = self {
                                *points = pts_back;
                            }
                        }
                    }
                }
            }
            Node::Internal {
                center,
                threshold,
                inside,
                outside,
            } => {
                let mut ins = Vec::new();
                let mut outs = Vec::new();
                for item in items {
                    if M::distance(center, &item) <= *threshold {
                        ins.push(item);
                    } else {
                        outs.push(item);
                    }
                }
                if !ins.is_empty() {
                    inside.add_all::<M>(ins, bin_size);
                }
                if !outs.is_empty() {
                    outside.add_all::<M>(outs, bin_size);
                }
            }
        }
    }

    /// Removes a single matching element from whichever leaf it descends to, without pruning.
    /// Returns whether an element was removed.
    pub(crate) fn remove_leaf_only<M: DistanceMetric<E>>(&mut self, e: &E) -> bool {
        match self {
            Node::Leaf { points, .. } => {
                if let Some(pos) = points.iter().position(|p| p == e) {
                    points.remove(pos);
                    true
                } else {
                    false
                }
            }
            Node::Internal {
                center,
                threshold,
                inside,
                outside,
            } => {
                if M::distance(center, e) <= *threshold {
                    inside.remove_leaf_only::<M>(e)
                } else {
                    outside.remove_leaf_only::<M>(e)
                }
            }
        }
    }

    /// The sequence of inside/outside choices made while descending toward the leaf that holds
    /// (or would hold) `e`. Two points share a path exactly when they would land in the same
    /// leaf, which this crate uses in place of node-pointer identity for ancestor comparisons.
    pub(crate) fn path_to<M: DistanceMetric<E>>(&self, e: &E) -> Path {
        match self {
            Node::Leaf { .. } => Vec::new(),
            Node::Internal {
                center,
                threshold,
                inside,
                outside,
            } => {
                if M::distance(center, e) <= *threshold {
                    let mut path = vec![Direction::Inside];
                    path.extend(inside.path_to::<M>(e));
                    path
                } else {
                    let mut path = vec![Direction::Outside];
                    path.extend(outside.path_to::<M>(e));
                    path
                }
            }
        }
    }

    pub(crate) fn node_at_path(&self, path: &[Direction]) -> &Node<E> {
        match path.split_first() {
            None => self,
            Some((dir, rest)) => match self {
                Node::Internal { inside, outside, .. } => match dir {
                    Direction::Inside => inside.node_at_path(rest),
                    Direction::Outside => outside.node_at_path(rest),
                },
                Node::Leaf { .. } => self,
            },
        }
    }

    pub(crate) fn node_at_path_mut(&mut self, path: &[Direction]) -> &mut Node<E> {
        match path.split_first() {
            None => self,
            Some((dir, rest)) => match self {
                Node::Internal { inside, outside, .. } => match dir {
                    Direction::Inside => inside.node_at_path_mut(rest),
                    Direction::Outside => outside.node_at_path_mut(rest),
                },
                Node::Leaf { .. } => self,
            },
        }
    }

    /// Collapses this internal node's entire subtree into a single leaf, recursively absorbing
    /// any grandchildren first. Fails with `IllegalState` if called on a leaf.
    pub(crate) fn absorb_children(&mut self) -> Result<(), GeoIndexError> {
        match self {
            Node::Leaf { .. } => Err(GeoIndexError::illegal_state(
                "absorb_children called on a leaf node",
            )),
            Node::Internal {
                center,
                inside,
                outside,
                ..
            } => {
                collapse_if_internal(inside);
                collapse_if_internal(outside);
                let mut merged = take_leaf_points(inside);
                merged.extend(take_leaf_points(outside));
                let preserved_center = center.clone();
                *self = Node::Leaf {
                    points: merged,
                    center: Some(preserved_center),
                };
                Ok(())
            }
        }
    }

    /// If this leaf now holds more than `bin_size` elements (typically right after absorbing
    /// children), attempts to partition it again. Leaves it overloaded on failure.
    pub(crate) fn maybe_repartition<M: DistanceMetric<E>>(&mut self, bin_size: usize) {
        if let Node::Leaf { points, center } = self {
            if points.len() > bin_size {
                if let Some(ctr) = center.clone() {
                    let pts = std::mem::take(points);
                    match try_partition::<E, M>(pts, &ctr) {
                        Ok((threshold, inside_pts, outside_pts)) => {
                            *self = Node::Internal {
                                center: ctr,
                                threshold,
                                inside: Box::new(Node::from_points::<M>(inside_pts, bin_size)),
                                outside: Box::new(Node::from_points::<M>(outside_pts, bin_size)),
                            };
                        }
                        Err(pts_back) => {
                            if let Node::Leaf { points, .. } = self {
                                *points = pts_back;
                            }
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn nearest_neighbors<M: DistanceMetric<E>>(&self, collector: &mut Collector<E>) {
        match self {
            Node::Leaf { points, .. } => {
                for p in points {
                    collector.offer::<M>(p);
                }
            }
            Node::Internal {
                center,
                threshold,
                inside,
                outside,
            } => {
                let delta = M::distance(collector.anchor(), center);
                let inside_first = delta <= *threshold;
                let (first, second) = if inside_first {
                    (inside.as_ref(), outside.as_ref())
                } else {
                    (outside.as_ref(), inside.as_ref())
                };
                first.nearest_neighbors::<M>(collector);
                let lower_bound = if inside_first {
                    (*threshold - delta).max(0.0)
                } else {
                    (delta - *threshold).max(0.0)
                };
                let visit_second = if inside_first {
                    collector.worst_distance() > lower_bound
                } else {
                    collector.worst_distance() >= lower_bound
                };
                if visit_second {
                    second.nearest_neighbors::<M>(collector);
                }
            }
        }
    }

    pub(crate) fn within_distance<M: DistanceMetric<E>>(
        &self,
        q: &E,
        radius: f64,
        filter: Option<&dyn Fn(&E) -> bool>,
        out: &mut Vec<E>,
    ) {
        match self {
            Node::Leaf { points, .. } => {
                for p in points {
                    if M::distance(q, p) <= radius && filter.map_or(true, |f| f(p)) {
                        out.push(p.clone());
                    }
                }
            }
            Node::Internal {
                center,
                threshold,
                inside,
                outside,
            } => {
                let delta = M::distance(q, center);
                if delta <= *threshold + radius {
                    inside.within_distance::<M>(q, radius, filter, out);
                }
                if delta + radius > *threshold {
                    outside.within_distance::<M>(q, radius, filter, out);
                }
            }
        }
    }
}

fn collapse_if_internal<E: Clone + PartialEq>(node: &mut Node<E>) {
    if matches!(node, Node::Internal { .. }) {
        node.absorb_children()
            .expect("node just checked to be internal");
    }
}

fn take_leaf_points<E>(node: &mut Node<E>) -> Vec<E> {
    match node {
        Node::Leaf { points, .. } => std::mem::take(points),
        Node::Internal { .. } => unreachable!("collapse_if_internal guarantees a leaf here"),
    }
}

/// Walks from `leaf_path` up toward the root, absorbing each ancestor's children into it and
/// stopping as soon as one comes back non-empty (or we run out of ancestors).
pub(crate) fn prune_path<E: Clone + PartialEq, M: DistanceMetric<E>>(
    root: &mut Node<E>,
    leaf_path: &[Direction],
    bin_size: usize,
) {
    let mut cur = leaf_path.to_vec();
    loop {
        if cur.is_empty() {
            break;
        }
        let parent_path = cur[..cur.len() - 1].to_vec();
        let parent = root.node_at_path_mut(&parent_path);
        if parent.absorb_children().is_err() {
            break;
        }
        parent.maybe_repartition::<M>(bin_size);
        if !parent.is_empty_leaf() {
            break;
        }
        cur = parent_path;
    }
}

/// Attempts to split `points` (which must include `center` itself, chosen by the caller as the
/// pivot) into an inside/outside pair separated by a threshold `tau` such that every inside
/// point is within `tau` of `center` and every outside point is strictly farther. Fails if fewer
/// than two points are given or if every point is equidistant from the center (no valid,
/// strictly positive threshold exists).
fn try_partition<E, M>(mut points: Vec<E>, center: &E) -> Result<(f64, Vec<E>, Vec<E>), Vec<E>>
where
    E: Clone,
    M: DistanceMetric<E>,
{
    let n = points.len();
    if n < 2 {
        return Err(points);
    }

    points.sort_by(|a, b| {
        M::distance(center, a)
            .partial_cmp(&M::distance(center, b))
            .unwrap()
    });

    let m = (n - 1) / 2;
    let dm = M::distance(center, &points[m]);

    // Scan forward from just past the median for the first strictly-farther point.
    if let Some(k) = ((m + 1)..n).find(|&k| M::distance(center, &points[k]) > dm) {
        let dk = M::distance(center, &points[k]);
        // dm == 0 means the median landed on a run of points coincident with the center; a
        // threshold of exactly dm would be zero, which this tree never allows (tau > 0 always).
        // Split the difference to dk instead so the threshold stays strictly positive while
        // still separating the two runs at the same index k.
        let tau = if dm > 0.0 { dm } else { dk / 2.0 };
        let outside = points.split_off(k);
        return Ok((tau, points, outside));
    }

    if dm > 0.0 {
        // Forward scan found only ties at dm; look for a strictly-closer point between the
        // median and the start of the range instead.
        if let Some(j) = (1..=m).rev().find(|&j| M::distance(center, &points[j]) < dm) {
            let tau = M::distance(center, &points[j]);
            let outside = points.split_off(j + 1);
            return Ok((tau, points, outside));
        }

        // Neither scan found a distinct value among points[1..]; the only possible distinction
        // left is the center's own point at index 0, isolated alone on the inside.
        let d0 = M::distance(center, &points[0]);
        if d0 < dm {
            let tau = (d0 + dm) / 2.0;
            let outside = points.split_off(1);
            return Ok((tau, points, outside));
        }
    }

    Err(points)
}
