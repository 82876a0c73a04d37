//! Bounded result collector used by k-NN search.
//!
//! A max-heap ordered by distance, so the current worst accepted candidate is always at the top,
//! ready to be evicted by something closer.

use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::geometry::DistanceMetric;

struct HeapEntry<E> {
    dist: OrderedFloat<f64>,
    point: E,
}

impl<E> PartialEq for HeapEntry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist
    }
}

impl<E> Eq for HeapEntry<E> {}

impl<E> PartialOrd for HeapEntry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for HeapEntry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.cmp(&other.dist)
    }
}

/// Accumulates up to `capacity` nearest neighbors of `anchor`, within `max_distance`, admitted
/// by an optional filter. See `NEAREST-NEIGHBOR SEARCH` in the design notes for the exact
/// accept/evict/reject procedure this implements.
pub(crate) struct Collector<'f, E> {
    anchor: E,
    capacity: usize,
    max_distance: f64,
    filter: Option<&'f dyn Fn(&E) -> bool>,
    heap: BinaryHeap<HeapEntry<E>>,
}

impl<'f, E: Clone> Collector<'f, E> {
    pub(crate) fn new(
        anchor: E,
        capacity: usize,
        max_distance: f64,
        filter: Option<&'f dyn Fn(&E) -> bool>,
    ) -> Self {
        Collector {
            anchor,
            capacity,
            max_distance,
            filter,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    pub(crate) fn anchor(&self) -> &E {
        &self.anchor
    }

    /// The distance of the current worst accepted candidate, or `+inf` while the collector has
    /// not yet filled to capacity (nothing bounds the search yet).
    pub(crate) fn worst_distance(&self) -> f64 {
        if self.heap.len() < self.capacity {
            f64::INFINITY
        } else {
            self.heap
                .peek()
                .map(|e| e.dist.into_inner())
                .unwrap_or(f64::INFINITY)
        }
    }

    pub(crate) fn offer<M: DistanceMetric<E>>(&mut self, candidate: &E) {
        if let Some(filter) = self.filter {
            if !filter(candidate) {
                return;
            }
        }
        let dist = M::distance(&self.anchor, candidate);
        if dist > self.max_distance {
            return;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(HeapEntry {
                dist: OrderedFloat(dist),
                point: candidate.clone(),
            });
        } else if let Some(top) = self.heap.peek() {
            if dist < top.dist.into_inner() {
                self.heap.pop();
                self.heap.push(HeapEntry {
                    dist: OrderedFloat(dist),
                    point: candidate.clone(),
                });
            }
        }
    }

    /// Returns the accepted candidates sorted nearest-first, without draining the collector.
    pub(crate) fn to_sorted_vec(&self) -> Vec<E> {
        let mut items: Vec<(f64, E)> = self
            .heap
            .iter()
            .map(|e| (e.dist.into_inner(), e.point.clone()))
            .collect();
        items.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        items.into_iter().map(|(_, p)| p).collect()
    }
}
