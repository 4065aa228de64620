//! Benchmarks for the software evaluator and tracer

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sdf_trace::eval::{closest_batch, closest_batch_parallel};
use sdf_trace::prelude::*;

fn grid(n: usize) -> Vec<Vec3> {
    let step = 4.0 / n as f32;
    (0..n * n * n)
        .map(|i| {
            let (x, y, z) = (i % n, (i / n) % n, i / (n * n));
            Vec3::new(x as f32, y as f32, z as f32) * step - Vec3::splat(2.0)
        })
        .collect()
}

fn bench_closest(c: &mut Criterion) {
    let mut group = c.benchmark_group("closest");

    for demo in [Demo::Simple, Demo::Cubes, Demo::Skull] {
        let scene = demo.scene().unwrap();
        let eval = SceneEvaluator::new(&scene, 1e-4);
        let point = Vec3::new(0.3, 0.2, 0.1);
        group.bench_function(demo.name(), |b| b.iter(|| eval.closest(black_box(point))));
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("closest_batch");
    let scene = Demo::Modulation.scene().unwrap();
    let eval = SceneEvaluator::new(&scene, 1e-4);

    for n in [8, 16, 32] {
        let points = grid(n);
        group.throughput(Throughput::Elements(points.len() as u64));
        group.bench_with_input(BenchmarkId::new("sequential", n), &points, |b, points| {
            b.iter(|| closest_batch(&eval, black_box(points)))
        });
        group.bench_with_input(BenchmarkId::new("parallel", n), &points, |b, points| {
            b.iter(|| closest_batch_parallel(&eval, black_box(points)))
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");
    group.sample_size(10);

    let scene = Demo::Simple.scene().unwrap();
    for size in [16, 32] {
        let options = Options::default().with_size(size, size).with_steps(64).with_bounces(2);
        let tracer = PathTracer::new(&scene, options).unwrap();
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::new("simple", size), &tracer, |b, tracer| {
            b.iter(|| tracer.render_frame(black_box(&Frame::default()), &[]))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_closest, bench_batch, bench_render);
criterion_main!(benches);
