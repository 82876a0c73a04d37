//! Property-based tests for VpTree

use geoindex::geometry::{DistanceMetric, GeoPoint, GreatCircleDistance};
use geoindex::tree::VpTree;
use proptest::prelude::*;
use std::cmp::Ordering;

prop_compose! {
    fn arb_geo_point()(lat in -89.0..89.0, lon in -179.0..179.0) -> (f64, f64) {
        (lat, lon)
    }
}

fn points_from_coords(coords: &[(f64, f64)]) -> Vec<GeoPoint<i32>> {
    coords
        .iter()
        .enumerate()
        .map(|(idx, (lat, lon))| GeoPoint::new(*lat, *lon, Some(idx as i32)))
        .collect()
}

fn brute_knn_distances(points: &[GeoPoint<i32>], target: &GeoPoint<i32>, k: usize) -> Vec<f64> {
    let mut distances: Vec<f64> = points
        .iter()
        .map(|p| GreatCircleDistance::distance(target, p))
        .collect();
    distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    distances.into_iter().take(k).collect()
}

proptest! {
    #[test]
    fn test_vptree_knn_matches_bruteforce(
        coords in prop::collection::vec(arb_geo_point(), 1..60),
        target_coords in arb_geo_point(),
        bin_size in 1usize..8,
        k in 1usize..15
    ) {
        let points = points_from_coords(&coords);
        let target = GeoPoint::new(target_coords.0, target_coords.1, Some(-1));
        let tree: VpTree<GeoPoint<i32>> =
            VpTree::from_points::<GreatCircleDistance>(points.clone(), bin_size).unwrap();

        let k = k.min(points.len());
        let knn = tree
            .nearest_neighbors::<GreatCircleDistance>(&target, k, f64::INFINITY, None)
            .unwrap();
        let brute_distances = brute_knn_distances(&points, &target, k);
        let knn_distances: Vec<f64> = knn
            .iter()
            .map(|p| GreatCircleDistance::distance(&target, p))
            .collect();

        prop_assert_eq!(knn_distances.len(), k);
        for i in 1..knn_distances.len() {
            prop_assert!(knn_distances[i - 1] <= knn_distances[i] + 1e-6);
        }
        for (got, expected) in knn_distances.iter().zip(brute_distances.iter()) {
            prop_assert!((got - expected).abs() <= 1e-3);
        }
    }

    #[test]
    fn test_vptree_radius_query_matches_bruteforce(
        coords in prop::collection::vec(arb_geo_point(), 1..60),
        target_coords in arb_geo_point(),
        bin_size in 1usize..8,
        radius in 0.0..3_000_000.0
    ) {
        let points = points_from_coords(&coords);
        let target = GeoPoint::new(target_coords.0, target_coords.1, Some(-1));
        let tree: VpTree<GeoPoint<i32>> =
            VpTree::from_points::<GreatCircleDistance>(points.clone(), bin_size).unwrap();

        let results = tree
            .within_distance::<GreatCircleDistance>(&target, radius, None)
            .unwrap();
        let mut expected_ids: Vec<i32> = points
            .iter()
            .filter(|p| GreatCircleDistance::distance(&target, p) <= radius)
            .map(|p| p.data.expect("data assigned"))
            .collect();
        let mut result_ids: Vec<i32> = results
            .iter()
            .map(|p| p.data.expect("data assigned"))
            .collect();
        expected_ids.sort_unstable();
        result_ids.sort_unstable();

        prop_assert_eq!(result_ids, expected_ids);

        for pair in results.windows(2) {
            let d0 = GreatCircleDistance::distance(&target, &pair[0]);
            let d1 = GreatCircleDistance::distance(&target, &pair[1]);
            prop_assert!(d0 <= d1 + 1e-6);
        }
    }

    #[test]
    fn test_vptree_membership_preserved_after_add_and_remove(
        coords in prop::collection::vec(arb_geo_point(), 1..40),
        bin_size in 1usize..6,
        drop_every in 2usize..5,
    ) {
        let points = points_from_coords(&coords);
        let mut tree: VpTree<GeoPoint<i32>> = VpTree::empty(bin_size).unwrap();
        tree.add_all::<GreatCircleDistance>(points.clone());
        prop_assert_eq!(tree.len(), points.len());

        let to_remove: Vec<GeoPoint<i32>> = points
            .iter()
            .enumerate()
            .filter(|(i, _)| i % drop_every == 0)
            .map(|(_, p)| p.clone())
            .collect();
        tree.remove_all::<GreatCircleDistance>(&to_remove);

        for p in &points {
            let should_remain = !to_remove.contains(p);
            prop_assert_eq!(tree.contains::<GreatCircleDistance>(p), should_remain);
        }
        prop_assert_eq!(tree.len(), points.len() - to_remove.len());
    }

    #[test]
    fn test_vptree_bulk_load_matches_incremental_add(
        coords in prop::collection::vec(arb_geo_point(), 1..40),
        bin_size in 1usize..6,
    ) {
        let points = points_from_coords(&coords);

        let bulk: VpTree<GeoPoint<i32>> =
            VpTree::from_points::<GreatCircleDistance>(points.clone(), bin_size).unwrap();
        let mut incremental: VpTree<GeoPoint<i32>> = VpTree::empty(bin_size).unwrap();
        for p in &points {
            incremental.add::<GreatCircleDistance>(p.clone());
        }

        prop_assert_eq!(bulk.len(), incremental.len());

        let target = points[0].clone();
        let bulk_nn = bulk
            .nearest_neighbors::<GreatCircleDistance>(&target, points.len(), f64::INFINITY, None)
            .unwrap();
        let incremental_nn = incremental
            .nearest_neighbors::<GreatCircleDistance>(&target, points.len(), f64::INFINITY, None)
            .unwrap();
        let bulk_dists: Vec<f64> = bulk_nn
            .iter()
            .map(|p| GreatCircleDistance::distance(&target, p))
            .collect();
        let incremental_dists: Vec<f64> = incremental_nn
            .iter()
            .map(|p| GreatCircleDistance::distance(&target, p))
            .collect();
        prop_assert_eq!(bulk_dists.len(), incremental_dists.len());
        for (a, b) in bulk_dists.iter().zip(incremental_dists.iter()) {
            prop_assert!((a - b).abs() <= 1e-3);
        }
    }
}
