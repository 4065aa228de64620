//! Common test helpers for sdf-trace integration tests

#![allow(dead_code)]

use sdf_trace::prelude::*;
use sdf_trace::shapes::ShapeId;

// ============================================================================
// Standard test scenes
// ============================================================================

/// One sphere (radius 0.5) at the origin with the default material
pub fn sphere_scene() -> Scene {
    let mut b = Scene::builder();
    let s = b.sphere();
    b.model(s, Material::default()).unwrap();
    b.build()
}

/// Two models sharing a sphere node: `union(sphere, translate(sphere))` and
/// the bare sphere
pub fn shared_scene() -> Scene {
    let mut b = Scene::builder();
    let s = b.sphere();
    let moved = b.translate(value(&[1.0, 0.0, 0.0]), s).unwrap();
    let both = b.union(s, moved).unwrap();
    b.model(both, Material::default()).unwrap();
    b.model(s, Material::default()).unwrap();
    b.build()
}

/// A DAG reusing nodes through several paths, returning the builder and its
/// root
pub fn diamond() -> (SceneBuilder, Shape) {
    let mut b = Scene::builder();
    let s = b.sphere();
    let c = b.cube();
    let left = b.translate(value(&[-1.0, 0.0, 0.0]), s).unwrap();
    let right = b.scale(scalar(2.0), s).unwrap();
    let joined = b.smooth_union(left, right, scalar(0.2)).unwrap();
    let carved = b.difference(joined, c).unwrap();
    let again = b.union(carved, left).unwrap();
    (b, again)
}

// ============================================================================
// Standard test points
// ============================================================================

/// Points inside, on and outside unit-scale shapes
pub fn test_points() -> Vec<Vec3> {
    vec![
        Vec3::ZERO,
        Vec3::new(0.5, 0.0, 0.0),
        Vec3::new(0.0, 0.7, 0.0),
        Vec3::new(0.0, 0.0, -1.2),
        Vec3::new(0.4, 0.4, 0.4),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(-1.3, 0.9, 0.2),
        Vec3::new(0.1, -0.25, 0.3),
    ]
}

// ============================================================================
// Evaluation helpers
// ============================================================================

/// Distance of node `id` at `p` outside any repetition
pub fn distance(arena: &sdf_trace::shapes::ShapeArena, id: ShapeId, p: Vec3) -> f32 {
    sdf_trace::eval::eval_shape(arena, id, p, Vec3::ZERO, &EvalContext::default()).unwrap()
}

/// Names of the functions defined by `program`, in order
pub fn function_names(program: &Program) -> Vec<String> {
    program.functions().map(|f| f.name().to_string()).collect()
}

// ============================================================================
// Assertion helpers
// ============================================================================

/// Assert two f32 values are close within tolerance
pub fn assert_close(a: f32, b: f32, tol: f32, msg: &str) {
    assert!(
        (a - b).abs() < tol,
        "{}: {} vs {} (diff={}, tol={})",
        msg,
        a,
        b,
        (a - b).abs(),
        tol
    );
}
