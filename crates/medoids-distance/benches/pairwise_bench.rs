//! Criterion benchmarks for medoids-distance: pairwise and cross distance matrices.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use medoids_distance::{FeatureMatrix, Metric};

fn make_points(n: usize, dims: usize, offset: f64) -> FeatureMatrix {
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..dims)
                .map(|d| ((i * dims + d) as f64 * 0.1).sin() + offset)
                .collect()
        })
        .collect();
    FeatureMatrix::new(rows).unwrap()
}

fn bench_pairwise(c: &mut Criterion) {
    let metrics = [
        Metric::Euclidean,
        Metric::Manhattan,
        Metric::Cosine,
    ];

    let mut group = c.benchmark_group("pairwise");

    for &n in &[100usize, 500] {
        let x = make_points(n, 16, 0.0);
        for metric in &metrics {
            let id = BenchmarkId::new(format!("n{n}_d16"), metric.to_string());
            group.bench_with_input(id, &x, |bencher, x| {
                bencher.iter(|| metric.pairwise(x).unwrap());
            });
        }
    }

    group.finish();
}

fn bench_cross(c: &mut Criterion) {
    let x = make_points(1000, 16, 0.5);
    let centers = make_points(8, 16, 0.0);

    c.bench_function("cross_1000x8_d16_euclidean", |b| {
        b.iter(|| Metric::Euclidean.cross(&x, &centers).unwrap());
    });
}

criterion_group!(benches, bench_pairwise, bench_cross);
criterion_main!(benches);
