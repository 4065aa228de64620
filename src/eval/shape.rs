//! Shape distance evaluation

use super::{EvalContext, EvalError};
use crate::expression::Expression;
use crate::shapes::primitives::*;
use crate::shapes::{ShapeArena, ShapeId, ShapeKind};
use glam::Vec3;

/// Signed distance of node `id` at `point` inside repetition `cell`.
///
/// Expressions of the node see `p = point` and `cell`; frame variables come
/// from `ctx`.
pub fn eval_shape(
    arena: &ShapeArena,
    id: ShapeId,
    point: Vec3,
    cell: Vec3,
    ctx: &EvalContext,
) -> Result<f32, EvalError> {
    let node = arena.get(id).ok_or(EvalError::UnknownShape(id))?;
    let local = EvalContext {
        position: point,
        cell,
        ..*ctx
    };
    let scalar = |e: &Expression| -> Result<f32, EvalError> { Ok(e.eval(&local)?.x()) };
    let vector = |e: &Expression| -> Result<Vec3, EvalError> { Ok(e.eval(&local)?.to_vec3()) };
    let child = |id: ShapeId, p: Vec3| eval_shape(arena, id, p, cell, ctx);

    Ok(match &node.kind {
        // === Primitives ===
        ShapeKind::Sphere => sdf_sphere(point),
        ShapeKind::Cube => sdf_cube(point),
        ShapeKind::Plane { normal, offset } => sdf_plane(point, vector(normal)?, scalar(offset)?),
        ShapeKind::SmoothBox { size, radius } => sdf_smooth_box(point, vector(size)?, scalar(radius)?),
        ShapeKind::Cylinder { radius, height } => sdf_cylinder(point, scalar(radius)?, scalar(height)?),
        ShapeKind::Torus { major, minor } => sdf_torus(point, scalar(major)?, scalar(minor)?),
        ShapeKind::Truchet { thickness } => sdf_truchet(point, scalar(thickness)?),
        ShapeKind::Skull => sdf_skull(point),

        // === Transforms ===
        ShapeKind::Translate { offset, child: c } => child(*c, point - vector(offset)?)?,
        ShapeKind::Scale { factor, child: c } => {
            let s = scalar(factor)?;
            child(*c, point / s)? * s
        }
        ShapeKind::Rotate { axis, angle, child: c } => {
            child(*c, rotate_inverse(point, *axis, scalar(angle)?))?
        }

        // === Operations ===
        ShapeKind::Union { a, b } => child(*a, point)?.min(child(*b, point)?),
        ShapeKind::Intersection { a, b } => child(*a, point)?.max(child(*b, point)?),
        ShapeKind::Difference { a, b } => child(*a, point)?.max(-child(*b, point)?),
        ShapeKind::SmoothUnion { a, b, radius } => {
            smooth_min(child(*a, point)?, child(*b, point)?, scalar(radius)?)
        }
        ShapeKind::SmoothIntersection { a, b, radius } => {
            smooth_max(child(*a, point)?, child(*b, point)?, scalar(radius)?)
        }
        ShapeKind::SmoothDifference { a, b, radius } => {
            smooth_max(child(*a, point)?, -child(*b, point)?, scalar(radius)?)
        }

        // === Repetition ===
        ShapeKind::Modulate { period, child: c } => {
            let period = vector(period)?;
            let index = repetition_cell(point, period);
            eval_shape(arena, *c, fold_into_cell(point, period, index), index, ctx)?
        }
        ShapeKind::Repeat { period, child: c } => {
            let period = vector(period)?;
            let index = repetition_cell(point, period);
            child(*c, fold_into_cell(point, period, index))?
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{scalar, value};

    fn at(arena: &ShapeArena, id: ShapeId, p: Vec3) -> f32 {
        eval_shape(arena, id, p, Vec3::ZERO, &EvalContext::default()).unwrap()
    }

    #[test]
    fn test_translate_shifts_query() {
        let mut arena = ShapeArena::new();
        let s = arena.insert(ShapeKind::Sphere);
        let t = arena.insert(ShapeKind::Translate {
            offset: value(&[1.0, 0.0, 0.0]),
            child: s,
        });
        assert!((at(&arena, t, Vec3::new(3.0, 0.0, 0.0)) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_scale_multiplies_distance() {
        let mut arena = ShapeArena::new();
        let s = arena.insert(ShapeKind::Sphere);
        let big = arena.insert(ShapeKind::Scale {
            factor: scalar(4.0),
            child: s,
        });
        // radius 2 after scaling
        assert!((at(&arena, big, Vec3::new(5.0, 0.0, 0.0)) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_modulate_child_sees_cell() {
        let mut arena = ShapeArena::new();
        // Radius grows with the x cell index
        let grown = arena.insert(ShapeKind::SmoothBox {
            size: value(&[0.5]) + Expression::cell().x() * 0.25,
            radius: scalar(0.0),
        });
        let m = arena.insert(ShapeKind::Modulate {
            period: value(&[2.0, 0.0, 0.0]),
            child: grown,
        });
        // Cell 0: box of size 0.5, cell 1 (x in [1, 3)): size 0.75
        let d0 = at(&arena, m, Vec3::new(0.5, 0.0, 0.0));
        let d1 = at(&arena, m, Vec3::new(2.5, 0.0, 0.0));
        assert!((d0 - 0.25).abs() < 1e-6);
        assert!((d1 - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_id() {
        let mut arena = ShapeArena::new();
        let s = arena.insert(ShapeKind::Sphere);
        let other = ShapeArena::new();
        let err = eval_shape(&other, s, Vec3::ZERO, Vec3::ZERO, &EvalContext::default());
        assert_eq!(err, Err(EvalError::UnknownShape(s)));
    }
}
