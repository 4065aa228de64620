//! # sdf-trace
//!
//! Compiles a declarative scene of signed-distance-field shapes, materials
//! and a camera into a single GLSL ES fragment program implementing a
//! multi-bounce Monte-Carlo path tracer.
//!
//! ## Features
//!
//! - **Expressions**: typed GLSL sub-expressions with scalar broadcasting,
//!   builtins, swizzles, a per-pixel hash and raw snippets
//! - **Shapes**: Sphere, Cube, Plane, SmoothBox, Cylinder, Torus, Truchet, Skull
//! - **Combinators**: Translate, Scale, Rotate, Union, Intersection,
//!   Difference (smooth variants), Modulate, Repeat
//! - **Materials**: color, transmittance, smoothness, refraction, scatter,
//!   emissivity; directional spotlights
//! - **Compiler**: shared-subgraph deduplication, deterministic emission
//! - **Software path**: CPU evaluator and tracer mirroring the program
//! - **Scene files**: JSON scene descriptions and compile options
//!
//! ## Example
//!
//! ```rust
//! use sdf_trace::prelude::*;
//!
//! let mut scene = Scene::builder();
//!
//! // A sphere carved out of a cube
//! let ball = scene.sphere();
//! let block = scene.cube();
//! let carved = scene.difference(block, ball).unwrap();
//! scene.model(carved, Material::new().with_color(value(&[0.8, 0.4, 0.2]))).unwrap();
//!
//! let scene = scene.build();
//! let glsl = compile(&scene, &Options::default());
//! assert!(glsl.contains("Closest calculateClosest(vec3 position)"));
//!
//! // The same scene on the CPU
//! let eval = SceneEvaluator::new(&scene, 1e-4);
//! let hit = eval.closest(Vec3::new(0.0, 0.0, 2.0)).unwrap();
//! assert_eq!(hit.object, 1);
//! ```

#![warn(missing_docs)]

pub mod compiler;
pub mod demos;
pub mod eval;
pub mod expression;
pub mod material;
pub mod options;
pub mod scene;
pub mod shapes;
pub mod tracer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::compiler::{build_program, compile, compile_with_stats, try_compile, CompileStats, Program};
    pub use crate::demos::Demo;
    pub use crate::eval::{Closest, EvalContext, EvalError, MaterialSample, SceneEvaluator, Value};
    pub use crate::expression::{random, raw, scalar, value, Builtin, Expression, Ty};
    pub use crate::material::{Material, Spotlight};
    pub use crate::options::{Options, OptionsError};
    pub use crate::scene::{load_scene, Camera, Model, Orbit, Scene, SceneBuilder, SceneDescription, SceneError};
    pub use crate::shapes::{Axis, Shape};
    pub use crate::tracer::{present, Frame, PathTracer};
    pub use glam::{Vec2, Vec3, Vec4};
}

// Re-exports for convenience
pub use compiler::{compile, try_compile};
pub use options::Options;
pub use scene::{Scene, SceneBuilder};

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_basic_workflow() {
        let mut b = Scene::builder();
        let ball = b.sphere();
        let moved = b.translate(value(&[1.0, 0.0, 0.0]), ball).unwrap();
        b.model(moved, Material::default()).unwrap();
        let scene = b.build();

        // Distance at (2, 0, 0) from a radius-0.5 sphere centered at (1, 0, 0)
        let eval = SceneEvaluator::new(&scene, 1e-4);
        let c = eval.closest(Vec3::new(2.0, 0.0, 0.0)).unwrap();
        assert_eq!(c.object, 1);
        assert!((c.distance - 0.5).abs() < 1e-6);

        let glsl = compile(&scene, &Options::default());
        assert!(glsl.contains("float shape1_2(vec3 p, vec3 cell)"));
    }

    #[test]
    fn test_compile_and_trace_agree_on_miss() {
        let scene = Scene::builder().build();
        let options = Options::default().with_size(4, 4);
        let glsl = try_compile(&scene, &options).unwrap();
        assert!(glsl.contains("if (closest.object == 0)"));

        let tracer = PathTracer::new(&scene, options).unwrap();
        let px = tracer.trace_pixel(Vec2::ZERO, &Frame::default(), Vec4::ZERO).unwrap();
        assert_eq!(px, Vec4::ZERO);
    }
}
