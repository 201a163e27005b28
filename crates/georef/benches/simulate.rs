use criterion::{black_box, criterion_group, criterion_main, Criterion};
use georef::core::{SpreadAccumulator, UnprojectedPoint};
use georef::{fit, simulate, simulate_into, AffineTransform, ControlPoint, ControlPointSet, DrawSource};

fn grid_control(n_side: usize) -> ControlPointSet {
    let truth = AffineTransform::new(0.998, -0.032, 625773.86, 0.031, 1.001, 1011775.84);
    let mut points = Vec::with_capacity(n_side * n_side);
    for i in 0..n_side {
        for j in 0..n_side {
            let (gx, gy) = (i as f64 * 100.0, j as f64 * 50.0);
            let (e, n) = truth.apply(gx, gy);
            points.push(ControlPoint::new(e, n, gx, gy).with_stderr(2.0, 3.0));
        }
    }
    ControlPointSet::new(points).expect("control points")
}

fn scattered_points(count: usize) -> Vec<UnprojectedPoint> {
    (0..count)
        .map(|k| {
            let t = k as f64;
            UnprojectedPoint::new(k as i64, (t * 7.3) % 1000.0, (t * 3.1) % 500.0)
        })
        .collect()
}

fn bench_fit(c: &mut Criterion) {
    let control = grid_control(6);
    c.bench_function("fit_36cp", |b| b.iter(|| fit(black_box(&control))));
}

fn bench_simulate(c: &mut Criterion) {
    let control = grid_control(4);
    let points = scattered_points(200);

    c.bench_function("simulate_16cp_200pts_100iter", |b| {
        b.iter(|| {
            let mut source = DrawSource::new(10);
            simulate(black_box(&control), black_box(&points), 100, &mut source)
        })
    });

    c.bench_function("simulate_into_spread_16cp_200pts_100iter", |b| {
        b.iter(|| {
            let mut source = DrawSource::new(10);
            let mut spread = SpreadAccumulator::new();
            simulate_into(&control, &points, 100, &mut source, &mut spread)
                .expect("simulate");
            black_box(spread.finish())
        })
    });
}

criterion_group!(simulate_benches, bench_fit, bench_simulate);
criterion_main!(simulate_benches);
