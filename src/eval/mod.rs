//! Software evaluation
//!
//! A CPU mirror of the generated program: expression values, shape
//! distances and the three scene-level queries (closest object, normal,
//! material). Every function follows the GLSL the compiler emits for the
//! same construct, including tie-breaks and fallbacks, so tests and the
//! software tracer can check generated behavior without a GPU.
//!
//! Raw snippets are opaque here; evaluating one yields [`EvalError::Opaque`].

mod expression;
pub mod parallel;
mod scene;
mod shape;
mod value;

pub use parallel::{closest_batch, closest_batch_parallel};
pub use scene::{Closest, MaterialSample, SceneEvaluator};
pub use shape::eval_shape;
pub use value::Value;

use crate::shapes::primitives::fract;
use crate::shapes::ShapeId;
use glam::{Vec2, Vec3};
use thiserror::Error;

/// Software evaluation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A raw snippet cannot be interpreted
    #[error("raw expressions cannot be evaluated in software")]
    Opaque,

    /// Ill-typed operation
    #[error("type error: {0}")]
    Type(String),

    /// Shape id not present in the arena
    #[error("unknown shape #{0}")]
    UnknownShape(ShapeId),
}

/// Values of the program variables an expression may read
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvalContext {
    /// `p`
    pub position: Vec3,
    /// `n`
    pub normal: Vec3,
    /// `d`
    pub direction: Vec3,
    /// `cell`
    pub cell: Vec3,
    /// `time`
    pub time: f32,
    /// `uv`
    pub uv: Vec2,
    /// `mouse`
    pub mouse: Vec2,
}

impl EvalContext {
    /// Context for one pixel of one frame
    pub fn frame(uv: Vec2, time: f32, mouse: Vec2) -> Self {
        EvalContext {
            uv,
            time,
            mouse,
            ..Self::default()
        }
    }
}

/// The program's `random(seed)` hash: a `vec2` in [0, 1)² keyed by screen
/// position, time and seed
#[inline]
pub fn random(uv: Vec2, time: f32, seed: f32) -> Vec2 {
    let s = uv * (1.0 + time + seed);
    Vec2::new(
        fract(s.dot(Vec2::new(12.9898, 78.233)).sin() * 43758.5453),
        fract(s.dot(Vec2::new(4.898, 7.23)).cos() * 23421.631),
    )
}
