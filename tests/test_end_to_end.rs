//! Integration tests: scene to program to pixels
//!
//! The generated program and the software evaluator must agree on the
//! dispatch rules: distances, closest-object tie-breaks and the
//! refraction fallback.

mod common;

use common::*;
use sdf_trace::tracer::{reflect, refract};
use sdf_trace::prelude::*;

// ============================================================================
// Single sphere
// ============================================================================

#[test]
fn test_sphere_scene_program() {
    let glsl = compile(&sphere_scene(), &Options::default());
    assert!(glsl.contains("float distance1(vec3 p) {\n    return shape1_1(p, vec3(0.0));\n}"));
    assert!(glsl.contains("float shape1_1(vec3 p, vec3 cell) {\n    return length(p) - 0.5;\n}"));
    assert!(glsl.contains("closest = Closest(1, candidate);"));
}

#[test]
fn test_sphere_scene_distance_and_dispatch() {
    let scene = sphere_scene();
    let eval = SceneEvaluator::new(&scene, 1e-4);
    let model = &scene.models()[0];
    assert_close(eval.distance(model, Vec3::new(2.0, 0.0, 0.0)).unwrap(), 1.5, 1e-6, "distance1");

    let hit = eval.closest(Vec3::new(2.0, 0.0, 0.0)).unwrap();
    assert_eq!(hit.object, 1);
    assert_close(hit.distance, 1.5, 1e-6, "closest");

    // Inside the sphere the dispatch sees the absolute distance
    let inside = eval.closest(Vec3::new(0.1, 0.0, 0.0)).unwrap();
    assert_eq!(inside.object, 1);
    assert_close(inside.distance, 0.4, 1e-6, "inside");
}

#[test]
fn test_sphere_scene_normals_point_outward() {
    let scene = sphere_scene();
    let eval = SceneEvaluator::new(&scene, 1e-4);
    for dir in [Vec3::X, Vec3::NEG_Y, Vec3::new(1.0, 1.0, -1.0).normalize()] {
        let n = eval.normal(1, dir * 0.5).unwrap();
        assert!(n.dot(dir) > 0.999, "normal {:?} for {:?}", n, dir);
    }
}

#[test]
fn test_nothing_within_range_is_air() {
    let scene = sphere_scene();
    let eval = SceneEvaluator::new(&scene, 1e-4);
    let far = eval.closest(Vec3::new(2.0e5, 0.0, 0.0)).unwrap();
    assert_eq!(far.object, 0);
}

// ============================================================================
// Tie-break
// ============================================================================

fn coincident_spheres() -> Scene {
    let mut b = Scene::builder();
    let first = b.sphere();
    let second = b.sphere();
    b.model(first, Material::default()).unwrap();
    b.model(second, Material::new().with_color(value(&[1.0, 0.0, 0.0]))).unwrap();
    b.build()
}

#[test]
fn test_first_declared_model_wins_ties() {
    let scene = coincident_spheres();
    let eval = SceneEvaluator::new(&scene, 1e-4);
    for p in test_points() {
        assert_eq!(eval.closest(p).unwrap().object, 1, "at {:?}", p);
    }
}

#[test]
fn test_emitted_dispatch_uses_strict_comparison() {
    let glsl = compile(&coincident_spheres(), &Options::default());
    let first = glsl.find("candidate = abs(distance1(position));").unwrap();
    let second = glsl.find("candidate = abs(distance2(position));").unwrap();
    assert!(first < second);
    assert!(glsl.contains("if (candidate < closest.distance)"));
    assert!(!glsl.contains("candidate <= closest.distance"));
}

// ============================================================================
// Refraction fallback
// ============================================================================

#[test]
fn test_grazing_exit_from_glass_reflects() {
    let normal = Vec3::Y;
    let grazing = Vec3::new(1.0, -0.2, 0.0).normalize();
    let eta = 1.5;

    // Past the critical angle refract() signals with the zero vector
    assert_eq!(refract(grazing, normal, eta), Vec3::ZERO);
    let mirrored = reflect(grazing, normal);
    assert_close(mirrored.y, 0.2f32 / 1.04f32.sqrt(), 1e-6, "reflected");

    // Head-on the ray goes through
    assert_eq!(refract(Vec3::NEG_Y, normal, eta), Vec3::NEG_Y);
}

#[test]
fn test_emitted_program_checks_refract_result() {
    let glsl = compile(&sphere_scene(), &Options::default());
    let refract_at = glsl.find("vec3 refracted = refract(direction, normal, eta);").unwrap();
    let guard = glsl.find("if (refracted != vec3(0.0)) {").unwrap();
    let fallback = glsl[guard..].find("reflect(direction, normal)").map(|i| guard + i).unwrap();
    assert!(refract_at < guard && guard < fallback);
}

// ============================================================================
// Software rendering
// ============================================================================

#[test]
fn test_demo_scene_renders() {
    let scene = Demo::Truchet.scene().unwrap();
    let options = Options::default().with_size(8, 6).with_steps(64).with_bounces(2);
    let tracer = PathTracer::new(&scene, options).unwrap();
    let accum = tracer.render(2).unwrap();
    assert_eq!(accum.len(), 48);
    // The sky encloses the camera: every frame records one to `bounces` events
    for px in &accum {
        assert!(px.w >= 2.0 && px.w <= 4.0, "events: {}", px.w);
        assert!(px.is_finite());
        assert!(px.x >= 0.0 && px.y >= 0.0 && px.z >= 0.0);
    }
    let image = tracer.present(&accum);
    assert_eq!(image.dimensions(), (8, 6));
    assert_eq!(image.pixels().count(), 48);
}

#[test]
fn test_frames_are_deterministic() {
    let scene = Demo::Simple.scene().unwrap();
    let options = Options::default().with_size(4, 4).with_steps(32).with_bounces(2);
    let tracer = PathTracer::new(&scene, options).unwrap();
    let frame = Frame::at(3);
    let zero = vec![Vec4::ZERO; 16];
    assert_eq!(tracer.render_frame(&frame, &zero).unwrap(), tracer.render_frame(&frame, &zero).unwrap());
}

// ============================================================================
// Ray spawning
// ============================================================================

#[test]
fn test_emitted_spawn_offsets() {
    let glsl = compile(&sphere_scene(), &Options::default());
    let refracted = glsl
        .find("from = position - 6.0 * epsilon * direction / dot(direction, normal);")
        .unwrap();
    let reflected = glsl.find("from = position + 2.0 * epsilon * normal;").unwrap();
    let turn = glsl.find("direction = reflect(direction, normal);").unwrap();
    assert!(refracted < reflected && reflected < turn);
    // The third spawn is the in-medium scatter event, which starts in place
    assert_eq!(glsl.matches("from = position").count(), 3);
    assert_eq!(glsl.matches("from = position;").count(), 1);
}

// ============================================================================
// Variable scopes
// ============================================================================

#[test]
fn test_material_cell_is_zero_on_both_sides() {
    let mut b = Scene::builder();
    let tiles = b
        .modulate(value(&[2.0, 0.0, 2.0]), |b, cell| {
            let s = b.sphere();
            b.translate(cell * 0.1, s)
        })
        .unwrap();
    let tinted = Material::default().with_color(Expression::cell() + value(&[0.5]));
    b.model(tiles, tinted).unwrap();
    let scene = b.build();

    let glsl = compile(&scene, &Options::default());
    let start = glsl.find("Material material1(vec3 p, vec3 n, vec3 d) {").unwrap();
    let body = &glsl[start..start + glsl[start..].find('}').unwrap()];
    assert!(body.contains("vec3 cell = vec3(0.0);"));

    // A point in cell (1, 0, 0) still shades with a zero cell
    let eval = SceneEvaluator::new(&scene, 1e-4);
    let m = eval.material(1, Vec3::new(2.6, 0.0, 0.0), Vec3::X, Vec3::NEG_X).unwrap();
    assert_eq!(m.color, Vec3::splat(0.5));
}

#[test]
fn test_air_normal_is_zero_on_both_sides() {
    let mut b = Scene::builder();
    b.air(Material::default().with_color(Expression::normal() * 0.5 + value(&[0.5])))
        .unwrap();
    let scene = b.build();

    let glsl = compile(&scene, &Options::default());
    assert!(glsl.contains("Material air = materialAir(from, vec3(0.0), direction);"));

    let eval = SceneEvaluator::new(&scene, 1e-4);
    let air = eval.air(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y).unwrap();
    assert_eq!(air.color, Vec3::splat(0.5));
}

#[test]
fn test_shape_locals_do_not_shadow_parameters() {
    let mut b = Scene::builder();
    let post = b.cylinder(scalar(0.2) + Expression::cell().x() * 0.05, scalar(1.0)).unwrap();
    let ring = b.torus(scalar(0.5), scalar(0.1)).unwrap();
    let both = b.union(post, ring).unwrap();
    let grid = b.repeat(value(&[2.0, 0.0, 2.0]), both).unwrap();
    b.model(grid, Material::default()).unwrap();
    let glsl = compile(&b.build(), &Options::default());

    assert!(glsl.contains("vec2 _d = vec2(length(p.xz) - "));
    assert!(glsl.contains("vec2 _q = vec2(length(p.xz) - 0.5, p.y);"));
    assert!(glsl.contains("vec3 _span = abs(vec3(2.0, 0.0, 2.0));"));
    for shadowing in ["vec2 d ", "vec3 d ", "vec3 n ", "vec3 p ", "vec3 cell ", "vec2 q ", "vec3 q "] {
        assert!(!glsl.contains(&format!(" {shadowing}= ")), "{shadowing}");
    }
}
