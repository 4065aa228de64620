//! Batch closest-object queries
//!
//! Uses rayon for parallel iteration over points.

use super::{Closest, EvalError, SceneEvaluator};
use glam::Vec3;
use rayon::prelude::*;

/// Closest-object query at multiple points (single-threaded)
pub fn closest_batch(evaluator: &SceneEvaluator<'_>, points: &[Vec3]) -> Result<Vec<Closest>, EvalError> {
    points.iter().map(|&p| evaluator.closest(p)).collect()
}

/// Closest-object query at multiple points (parallel)
pub fn closest_batch_parallel(
    evaluator: &SceneEvaluator<'_>,
    points: &[Vec3],
) -> Result<Vec<Closest>, EvalError> {
    points.par_iter().map(|&p| evaluator.closest(p)).collect()
}
