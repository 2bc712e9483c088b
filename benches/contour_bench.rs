//! Benchmarks for the contour interpolation pipeline

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dam_post::prelude::*;

fn dam_boundary() -> Boundary {
    Boundary::new(vec![[0.0, 0.0], [48.0, 0.0], [6.0, 60.0], [0.0, 60.0]]).unwrap()
}

fn dam_sample(n: usize) -> FieldSample {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut z = Vec::new();
    for j in 0..=n {
        let py = 60.0 * j as f64 / n as f64;
        let width = 48.0 - 42.0 * py / 60.0;
        for i in 0..=n {
            let px = width * i as f64 / n as f64;
            x.push(px);
            y.push(py);
            z.push(-0.025 * (60.0 - py) * (1.0 + px / 96.0));
        }
    }
    FieldSample::new(x, y, z).unwrap()
}

fn bench_exact_grid(c: &mut Criterion) {
    let sample = dam_sample(22); // ~500 sites
    let boundary = dam_boundary();
    let options = ContourOptions::default()
        .with_dpi(100)
        .with_method(InterpMethod::Exact);
    c.bench_function("exact_grid_500_sites_dpi100", |b| {
        b.iter(|| compute_grid(black_box(&sample), &boundary, &[], &options).unwrap())
    });
}

fn bench_rbf_grid(c: &mut Criterion) {
    let sample = dam_sample(12); // dense solve scales cubically in sites
    let boundary = dam_boundary();
    let options = ContourOptions::default()
        .with_dpi(100)
        .with_method(InterpMethod::Extrapolated);
    c.bench_function("rbf_grid_170_sites_dpi100", |b| {
        b.iter(|| compute_grid(black_box(&sample), &boundary, &[], &options).unwrap())
    });
}

fn bench_full_contour(c: &mut Criterion) {
    let sample = dam_sample(22);
    let boundary = dam_boundary();
    let options = ContourOptions::default().with_dpi(100);
    c.bench_function("contour_render_dpi100", |b| {
        b.iter(|| compute_contour(black_box(&sample), &boundary, &[], &options).unwrap())
    });
}

criterion_group!(benches, bench_exact_grid, bench_rbf_grid, bench_full_contour);
criterion_main!(benches);
