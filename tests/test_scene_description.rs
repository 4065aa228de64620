//! Integration tests: scene and options files

mod common;

use common::*;
use sdf_trace::prelude::*;
use std::fs;
use std::path::PathBuf;

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("sdf_trace_test_scenes");
    fs::create_dir_all(&dir).unwrap();
    dir
}

const SHARED: &str = r#"{
    "shapes": [
        { "name": "ball", "type": "sphere" },
        { "name": "pair", "type": "union",
          "a": "ball",
          "b": { "type": "translate", "offset": [1, 0, 0], "shape": "ball" } }
    ],
    "models": [ { "shape": "pair" }, { "shape": "ball" } ]
}"#;

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_description_matches_builder() {
    let path = temp_dir().join("shared.json");
    fs::write(&path, SHARED).unwrap();
    let loaded = load_scene(&path).unwrap();

    // Same construction order as common::shared_scene
    let built = shared_scene();
    assert_eq!(loaded.shapes().len(), built.shapes().len());
    let options = Options::default();
    assert_eq!(compile(&loaded, &options), compile(&built, &options));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_scene(temp_dir().join("does_not_exist.json")).unwrap_err();
    assert!(matches!(err, SceneError::Io(_)));
}

#[test]
fn test_errors_surface_before_emission() {
    let cases = [
        (r#"{ "models": [ { "shape": "ghost" } ] }"#, "undefined shape `ghost`"),
        (
            r#"{ "models": [ { "shape": { "type": "sphere" }, "material": "chrome" } ] }"#,
            "undefined material `chrome`",
        ),
        (
            r#"{ "shapes": [ { "name": "a", "type": "cube" }, { "name": "a", "type": "cube" } ], "models": [] }"#,
            "duplicate definition of `a`",
        ),
    ];
    for (json, message) in cases {
        let err = SceneDescription::from_json_str(json).and_then(|d| d.build()).unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    let err = SceneDescription::from_json_str(r#"{ "models": [ { "shape": { "type": "cone" } } ] }"#)
        .and_then(|d| d.build())
        .unwrap_err();
    assert!(matches!(err, SceneError::Parse(_)));
}

#[test]
fn test_materials_and_camera_reach_the_program() {
    let json = r#"{
        "materials": [
            { "name": "glass", "type": "material", "transmittance": 0.9, "refraction": 1.5 },
            { "name": "sky", "type": "spotlight", "direction": [0, 1, 0], "spread": 0.2 }
        ],
        "models": [
            { "shape": { "type": "sphere" }, "material": "glass" },
            { "shape": { "type": "scale", "factor": 100, "shape": { "type": "sphere" } }, "material": "sky" }
        ],
        "camera": { "type": "look_at", "eye": [0, 1, 5], "field_of_view": 0.8 }
    }"#;
    let scene = SceneDescription::from_json_str(json).unwrap().build().unwrap();
    let glsl = compile(&scene, &Options::default());
    assert!(glsl.contains("m.refraction = 1.5;"));
    assert!(glsl.contains("m.transmittance = 0.9;"));
    assert!(glsl.contains("smoothstep("));
    assert!(glsl.contains("vec3(0.0, 1.0, 5.0)"));

    // The glass sphere is found first from outside the sky
    let eval = SceneEvaluator::new(&scene, 1e-4);
    assert_eq!(eval.closest(Vec3::new(0.0, 0.0, 2.0)).unwrap().object, 1);
}

#[test]
fn test_slots_read_only_bound_variables() {
    let build = |json: &str| SceneDescription::from_json_str(json).and_then(|d| d.build());

    let err = build(r#"{ "models": [], "camera": { "type": "look_at", "eye": { "var": "p" } } }"#).unwrap_err();
    assert!(matches!(err, SceneError::UnboundVariable { ref slot, .. } if slot == "camera.eye"));
    assert_eq!(err.to_string(), "`p` is not available in camera.eye");

    let err = build(
        r#"{ "models": [ { "shape": { "type": "translate", "offset": { "var": "d" },
                                      "shape": { "type": "sphere" } } } ] }"#,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "`d` is not available in translate.offset");

    let err = build(r#"{ "models": [ { "shape": { "type": "torus", "major": 1, "minor": { "swizzle": "x", "of": { "var": "n" } } } } ] }"#)
        .unwrap_err();
    assert!(matches!(err, SceneError::UnboundVariable { ref slot, .. } if slot == "torus.minor"));

    // Materials see the hit point, normal, direction and cell; cameras see
    // the frame variables
    let scene = build(
        r#"{
        "materials": [ { "name": "shaded", "type": "material",
                         "color": { "op": "+", "args": [ { "var": "n" }, { "var": "cell" } ] },
                         "smoothness": { "swizzle": "x", "of": { "var": "d" } } } ],
        "models": [ { "shape": { "type": "cylinder", "radius": { "swizzle": "y", "of": { "var": "p" } }, "height": 1 },
                      "material": "shaded" } ],
        "camera": { "type": "look_at", "aperture": { "op": "*", "args": [ { "var": "time" }, 0.01 ] } }
    }"#,
    )
    .unwrap();
    assert_eq!(scene.models().len(), 1);
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_options_file_overrides_subset() {
    let path = temp_dir().join("options.json");
    fs::write(&path, r#"{ "width": 64, "steps": 32 }"#).unwrap();
    let options = Options::load(&path).unwrap();
    assert_eq!(options.width, 64);
    assert_eq!(options.steps, 32);
    assert_eq!(options.height, Options::default().height);

    let glsl = try_compile(&sphere_scene(), &options).unwrap();
    assert!(glsl.contains("const int steps = 32;"));
}

#[test]
fn test_invalid_options_rejected_by_try_compile() {
    let options = Options::default().with_steps(0);
    assert!(matches!(
        try_compile(&sphere_scene(), &options),
        Err(OptionsError::Invalid { field: "steps", .. })
    ));
    assert!(Options::from_json_str(r#"{ "frames": 3 }"#).is_err());
}

// ============================================================================
// Built-in scenes
// ============================================================================

#[test]
fn test_every_demo_compiles() {
    for demo in Demo::ALL {
        let scene = demo.scene().unwrap();
        let (glsl, stats) = compile_with_stats(&scene, &Options::default());
        assert!(stats.models >= 2, "{} has too few models", demo);
        assert!(glsl.contains("void main() {"));
        assert_eq!(demo.name().parse::<Demo>().unwrap(), demo);
    }
}

#[test]
fn test_bundled_scene_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenes/glass.json");
    let scene = load_scene(path).unwrap();
    assert_eq!(scene.models().len(), 3);

    let glsl = try_compile(&scene, &Options::default()).unwrap();
    assert!(glsl.contains("float smax(float a, float b, float k)"));
    assert!(!glsl.contains("float smin("));

    // Standing above the floor, outside the lens
    let eval = SceneEvaluator::new(&scene, 1e-4);
    assert_eq!(eval.closest(Vec3::new(3.0, -0.4, 0.0)).unwrap().object, 2);
}
