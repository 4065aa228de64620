//! Scene compiler
//!
//! Turns a [`Scene`] and [`Options`] into the complete fragment program.
//! Compilation is a pure function of its inputs: the same scene and options
//! always produce byte-identical text.
//!
//! # Example
//!
//! ```
//! use sdf_trace::prelude::*;
//!
//! let mut scene = Scene::builder();
//! let ball = scene.sphere();
//! scene.model(ball, Material::default()).unwrap();
//!
//! let glsl = compile(&scene.build(), &Options::default());
//! assert!(glsl.contains("float distance1(vec3 p)"));
//! ```

mod emit;
mod program;
mod resolve;
pub mod templates;

pub use emit::build_program;
pub use program::{Declaration, Function, Item, Program, Signature, Statement};
pub use resolve::resolve_dependencies;

use crate::options::{Options, OptionsError};
use crate::scene::Scene;

/// Sentinel "no hit" distance, also the default mean free path
pub const MAX_VALUE: f32 = 1e5;

/// Value of `PI` in the generated program
#[allow(clippy::approx_constant)]
pub const PI: f32 = 3.14159;

/// Counts reported by [`compile_with_stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileStats {
    /// Models dispatched
    pub models: usize,
    /// Shape distance functions emitted, summed over models
    pub shape_functions: usize,
    /// All function definitions
    pub functions: usize,
    /// Length of the program text in bytes
    pub bytes: usize,
}

/// Compile `scene` into program text.
///
/// Options are spliced in as given; use [`try_compile`] to validate them.
pub fn compile(scene: &Scene, options: &Options) -> String {
    compile_with_stats(scene, options).0
}

/// Validate `options`, then compile
pub fn try_compile(scene: &Scene, options: &Options) -> Result<String, OptionsError> {
    options.validate()?;
    Ok(compile(scene, options))
}

/// Compile and report what was emitted
pub fn compile_with_stats(scene: &Scene, options: &Options) -> (String, CompileStats) {
    let program = build_program(scene, options);
    let text = program.to_glsl();

    let stats = CompileStats {
        models: scene.models().len(),
        shape_functions: program
            .functions()
            .filter(|f| f.name().starts_with("shape"))
            .count(),
        functions: program.functions().count(),
        bytes: text.len(),
    };

    tracing::info!(
        models = stats.models,
        shape_functions = stats.shape_functions,
        functions = stats.functions,
        bytes = stats.bytes,
        "compiled scene"
    );
    tracing::debug!(program = %text, "generated program");

    (text, stats)
}
