use shared::*;

use criterion::{criterion_group, Criterion};
use geoindex::geometry::{GeoPoint, GreatCircleDistance};
use geoindex::tree::VpTree;
use std::hint::black_box;
use tracing::info;

/// A generic helper function for k-NN search benchmarks.
fn bench_knn_search<'a>(
    name: &str,
    tree: &'a VpTree<GeoPoint<i32>>,
    query: &'a GeoPoint<i32>,
    cc: &mut Criterion,
) {
    cc.bench_function(name, |b| {
        b.iter(|| {
            info!("Running knn search benchmark: {}", name);
            let res = tree.nearest_neighbors::<GreatCircleDistance>(
                query,
                BENCH_KNN_SIZE,
                f64::INFINITY,
                None,
            );
            black_box(res)
        })
    });
}

fn benchmark_knn_vptree(_c: &mut Criterion) {
    info!("Setting up benchmark: knn_vptree");
    let points = generate_points();
    let tree: VpTree<GeoPoint<i32>> =
        VpTree::from_points::<GreatCircleDistance>(points, BENCH_BIN_SIZE).unwrap();
    let target = GeoPoint::new(42.387597, -71.099497, None);
    let mut cc = configure_criterion();
    bench_knn_search("knn_vptree", &tree, &target, &mut cc);
}

fn benchmark_nearest_neighbor_vptree(_c: &mut Criterion) {
    info!("Setting up benchmark: nearest_neighbor_vptree");
    let points = generate_points();
    let tree: VpTree<GeoPoint<i32>> =
        VpTree::from_points::<GreatCircleDistance>(points, BENCH_BIN_SIZE).unwrap();
    let target = GeoPoint::new(42.387597, -71.099497, None);
    let mut cc = configure_criterion();
    cc.bench_function("nearest_neighbor_vptree", |b| {
        b.iter(|| {
            black_box(tree.nearest_neighbor::<GreatCircleDistance>(&target, f64::INFINITY, None))
        })
    });
}

criterion_group!(
    benches,
    benchmark_knn_vptree,
    benchmark_nearest_neighbor_vptree
);
