use shared::*;

use criterion::{criterion_group, Criterion};
use geoindex::geometry::{GeoPoint, GreatCircleDistance};
use geoindex::tree::VpTree;

fn bench_vptree_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("VpTree Serialization");
    let points = generate_points();
    let tree: VpTree<GeoPoint<i32>> =
        VpTree::from_points::<GreatCircleDistance>(points, BENCH_BIN_SIZE).unwrap();

    group.bench_function("serialize", |b| {
        b.iter(|| {
            let _encoded: Vec<u8> = bincode::serialize(&tree).unwrap();
        })
    });

    let encoded: Vec<u8> = bincode::serialize(&tree).unwrap();
    group.bench_function("deserialize", |b| {
        b.iter(|| {
            let _decoded: VpTree<GeoPoint<i32>> = bincode::deserialize(&encoded[..]).unwrap();
        })
    });
}

criterion_group!(benches, bench_vptree_serialization);
