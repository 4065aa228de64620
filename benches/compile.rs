//! Benchmarks for scene compilation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sdf_trace::compiler::resolve_dependencies;
use sdf_trace::prelude::*;

fn chain(depth: usize) -> (Scene, Shape) {
    let mut b = Scene::builder();
    let mut top = b.sphere();
    for i in 0..depth {
        let side = b.cube();
        top = if i % 2 == 0 {
            b.smooth_union(top, side, scalar(0.1)).unwrap()
        } else {
            b.translate(value(&[0.0, 0.1, 0.0]), top).unwrap()
        };
    }
    b.model(top, Material::default()).unwrap();
    (b.build(), top)
}

fn bench_demos(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_demo");
    let options = Options::default();

    for demo in Demo::ALL {
        let scene = demo.scene().unwrap();
        group.bench_with_input(BenchmarkId::new("glsl", demo.name()), &scene, |b, scene| {
            b.iter(|| compile(black_box(scene), black_box(&options)))
        });
    }

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_dependencies");

    for depth in [10, 100, 1_000, 10_000] {
        let (scene, root) = chain(depth);
        group.throughput(Throughput::Elements(scene.shapes().len() as u64));
        group.bench_with_input(BenchmarkId::new("chain", depth), &root, |b, &root| {
            b.iter(|| resolve_dependencies(black_box(scene.shapes()), black_box(root)))
        });
    }

    group.finish();
}

fn bench_emission(c: &mut Criterion) {
    let mut group = c.benchmark_group("emission");
    let options = Options::default();
    let (scene, _) = chain(1_000);

    group.bench_function("build_program", |b| {
        b.iter(|| build_program(black_box(&scene), black_box(&options)))
    });

    let program = build_program(&scene, &options);
    group.bench_function("to_glsl", |b| b.iter(|| black_box(&program).to_glsl()));

    group.finish();
}

criterion_group!(benches, bench_demos, bench_resolution, bench_emission);
criterion_main!(benches);
