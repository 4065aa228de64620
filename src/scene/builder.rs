//! Scene construction context
//!
//! The builder owns the shape arena and the model counter, so ids are
//! scoped to one scene. Each arena draws its tag from a process-wide
//! counter; a cloned builder shares the tag of its source.
//!
//! ```
//! use sdf_trace::prelude::*;
//!
//! let mut b = Scene::builder();
//! let ball = b.sphere();
//! let moved = b.translate(value(&[0.0, 1.0, 0.0]), ball).unwrap();
//! b.model(moved, Material::default()).unwrap();
//! let scene = b.build();
//! assert_eq!(scene.models().len(), 1);
//! ```

use super::{expect_any, expect_bound, expect_type, Camera, Model, Scene, SceneError, UNBOUND_IN_SHAPES};
use crate::expression::{Expression, Ty};
use crate::material::Material;
use crate::shapes::{Axis, Shape, ShapeArena, ShapeKind};

/// Incrementally assembles a [`Scene`]
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    shapes: ShapeArena,
    models: Vec<Model>,
    camera: Camera,
    air: Material,
}

impl SceneBuilder {
    /// Empty scene with the default camera and air
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node after checking its children and expression slots.
    ///
    /// Shape expressions may read `p`, `cell` and the frame variables; the
    /// surface normal and ray direction only exist in material functions.
    pub fn push(&mut self, kind: ShapeKind) -> Result<Shape, SceneError> {
        if let Some(missing) = kind.children().into_iter().find(|c| !self.shapes.contains(*c)) {
            return Err(SceneError::UnknownShape(missing));
        }
        check_slots(&kind)?;
        for (slot, expression) in kind.parameters() {
            expect_bound(slot, expression, UNBOUND_IN_SHAPES)?;
        }
        Ok(self.shapes.insert(kind))
    }

    // === Primitives ===

    /// Sphere of radius 0.5
    pub fn sphere(&mut self) -> Shape {
        self.shapes.insert(ShapeKind::Sphere)
    }

    /// Cube with edge 1
    pub fn cube(&mut self) -> Shape {
        self.shapes.insert(ShapeKind::Cube)
    }

    /// Skull approximation
    pub fn skull(&mut self) -> Shape {
        self.shapes.insert(ShapeKind::Skull)
    }

    /// Half-space `dot(p, normal) + offset`
    pub fn plane(
        &mut self,
        normal: impl Into<Expression>,
        offset: impl Into<Expression>,
    ) -> Result<Shape, SceneError> {
        self.push(ShapeKind::Plane {
            normal: normal.into(),
            offset: offset.into(),
        })
    }

    /// Rounded box of full size `size`
    pub fn smooth_box(
        &mut self,
        size: impl Into<Expression>,
        radius: impl Into<Expression>,
    ) -> Result<Shape, SceneError> {
        self.push(ShapeKind::SmoothBox {
            size: size.into(),
            radius: radius.into(),
        })
    }

    /// Capped cylinder along Y
    pub fn cylinder(
        &mut self,
        radius: impl Into<Expression>,
        height: impl Into<Expression>,
    ) -> Result<Shape, SceneError> {
        self.push(ShapeKind::Cylinder {
            radius: radius.into(),
            height: height.into(),
        })
    }

    /// Torus in the XZ plane
    pub fn torus(
        &mut self,
        major: impl Into<Expression>,
        minor: impl Into<Expression>,
    ) -> Result<Shape, SceneError> {
        self.push(ShapeKind::Torus {
            major: major.into(),
            minor: minor.into(),
        })
    }

    /// Truchet tiling of unit cells
    pub fn truchet(&mut self, thickness: impl Into<Expression>) -> Result<Shape, SceneError> {
        self.push(ShapeKind::Truchet {
            thickness: thickness.into(),
        })
    }

    // === Transforms ===

    /// Move `shape` by `offset`
    pub fn translate(&mut self, offset: impl Into<Expression>, shape: Shape) -> Result<Shape, SceneError> {
        self.push(ShapeKind::Translate {
            offset: offset.into(),
            child: shape,
        })
    }

    /// Uniformly scale `shape`
    pub fn scale(&mut self, factor: impl Into<Expression>, shape: Shape) -> Result<Shape, SceneError> {
        self.push(ShapeKind::Scale {
            factor: factor.into(),
            child: shape,
        })
    }

    /// Rotate `shape` about `axis`
    pub fn rotate(
        &mut self,
        axis: Axis,
        angle: impl Into<Expression>,
        shape: Shape,
    ) -> Result<Shape, SceneError> {
        self.push(ShapeKind::Rotate {
            axis,
            angle: angle.into(),
            child: shape,
        })
    }

    /// Rotate about X
    pub fn rotate_x(&mut self, angle: impl Into<Expression>, shape: Shape) -> Result<Shape, SceneError> {
        self.rotate(Axis::X, angle, shape)
    }

    /// Rotate about Y
    pub fn rotate_y(&mut self, angle: impl Into<Expression>, shape: Shape) -> Result<Shape, SceneError> {
        self.rotate(Axis::Y, angle, shape)
    }

    /// Rotate about Z
    pub fn rotate_z(&mut self, angle: impl Into<Expression>, shape: Shape) -> Result<Shape, SceneError> {
        self.rotate(Axis::Z, angle, shape)
    }

    // === Operations ===

    /// `min(a, b)`
    pub fn union(&mut self, a: Shape, b: Shape) -> Result<Shape, SceneError> {
        self.push(ShapeKind::Union { a, b })
    }

    /// `max(a, b)`
    pub fn intersection(&mut self, a: Shape, b: Shape) -> Result<Shape, SceneError> {
        self.push(ShapeKind::Intersection { a, b })
    }

    /// `max(a, -b)`
    pub fn difference(&mut self, a: Shape, b: Shape) -> Result<Shape, SceneError> {
        self.push(ShapeKind::Difference { a, b })
    }

    /// Smooth union with blend `radius`
    pub fn smooth_union(&mut self, a: Shape, b: Shape, radius: impl Into<Expression>) -> Result<Shape, SceneError> {
        self.push(ShapeKind::SmoothUnion {
            a,
            b,
            radius: radius.into(),
        })
    }

    /// Smooth intersection with blend `radius`
    pub fn smooth_intersection(
        &mut self,
        a: Shape,
        b: Shape,
        radius: impl Into<Expression>,
    ) -> Result<Shape, SceneError> {
        self.push(ShapeKind::SmoothIntersection {
            a,
            b,
            radius: radius.into(),
        })
    }

    /// Smooth difference with blend `radius`
    pub fn smooth_difference(
        &mut self,
        a: Shape,
        b: Shape,
        radius: impl Into<Expression>,
    ) -> Result<Shape, SceneError> {
        self.push(ShapeKind::SmoothDifference {
            a,
            b,
            radius: radius.into(),
        })
    }

    // === Repetition ===

    /// Grid repetition with a per-cell child.
    ///
    /// `mapping` receives the symbolic cell index ([`Expression::cell`]) and
    /// builds the child; expressions in the child that read the cell vary
    /// from cell to cell.
    pub fn modulate<F>(&mut self, period: impl Into<Expression>, mapping: F) -> Result<Shape, SceneError>
    where
        F: FnOnce(&mut Self, Expression) -> Result<Shape, SceneError>,
    {
        let child = mapping(self, Expression::cell())?;
        self.push(ShapeKind::Modulate {
            period: period.into(),
            child,
        })
    }

    /// Grid repetition of an unchanged shape
    pub fn repeat(&mut self, period: impl Into<Expression>, shape: Shape) -> Result<Shape, SceneError> {
        self.push(ShapeKind::Repeat {
            period: period.into(),
            child: shape,
        })
    }

    // === Scene ===

    /// Attach `material` to `shape`, returning the model id
    pub fn model(&mut self, shape: Shape, material: Material) -> Result<u32, SceneError> {
        if !self.shapes.contains(shape) {
            return Err(SceneError::UnknownShape(shape));
        }
        material.validate()?;
        let id = self.models.len() as u32 + 1;
        self.models.push(Model { id, shape, material });
        Ok(id)
    }

    /// Replace the camera
    pub fn camera(&mut self, camera: Camera) -> Result<&mut Self, SceneError> {
        camera.validate()?;
        self.camera = camera;
        Ok(self)
    }

    /// Replace the ambient medium
    pub fn air(&mut self, air: Material) -> Result<&mut Self, SceneError> {
        air.validate()?;
        self.air = air;
        Ok(self)
    }

    /// Shapes created so far
    pub fn shapes(&self) -> &ShapeArena {
        &self.shapes
    }

    /// Finish construction
    pub fn build(self) -> Scene {
        Scene {
            shapes: self.shapes,
            models: self.models,
            camera: self.camera,
            air: self.air,
        }
    }
}

fn check_slots(kind: &ShapeKind) -> Result<(), SceneError> {
    match kind {
        ShapeKind::Sphere | ShapeKind::Cube | ShapeKind::Skull => Ok(()),
        ShapeKind::Plane { normal, offset } => {
            expect_type("plane.normal", normal, Ty::Vec3)?;
            expect_any("plane.offset", offset).map(drop)
        }
        ShapeKind::SmoothBox { size, radius } => {
            expect_type("smooth_box.size", size, Ty::Vec3)?;
            expect_any("smooth_box.radius", radius).map(drop)
        }
        ShapeKind::Cylinder { radius, height } => {
            expect_any("cylinder.radius", radius)?;
            expect_any("cylinder.height", height).map(drop)
        }
        ShapeKind::Torus { major, minor } => {
            expect_any("torus.major", major)?;
            expect_any("torus.minor", minor).map(drop)
        }
        ShapeKind::Truchet { thickness } => expect_any("truchet.thickness", thickness).map(drop),
        ShapeKind::Translate { offset, .. } => expect_type("translate.offset", offset, Ty::Vec3),
        ShapeKind::Scale { factor, .. } => expect_any("scale.factor", factor).map(drop),
        ShapeKind::Rotate { angle, .. } => expect_any("rotate.angle", angle).map(drop),
        ShapeKind::Union { .. } | ShapeKind::Intersection { .. } | ShapeKind::Difference { .. } => Ok(()),
        ShapeKind::SmoothUnion { radius, .. }
        | ShapeKind::SmoothIntersection { radius, .. }
        | ShapeKind::SmoothDifference { radius, .. } => expect_any("smooth.radius", radius).map(drop),
        ShapeKind::Modulate { period, .. } => expect_type("modulate.period", period, Ty::Vec3),
        ShapeKind::Repeat { period, .. } => expect_type("repeat.period", period, Ty::Vec3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{raw, scalar, value, Variable};

    #[test]
    fn test_model_ids_in_creation_order() {
        let mut b = SceneBuilder::new();
        let s = b.sphere();
        let c = b.cube();
        assert_eq!(b.model(s, Material::default()).unwrap(), 1);
        assert_eq!(b.model(c, Material::default()).unwrap(), 2);
        let scene = b.build();
        assert_eq!(scene.model(2).map(|m| m.shape), Some(c));
    }

    #[test]
    fn test_translate_requires_vec3() {
        let mut b = SceneBuilder::new();
        let s = b.sphere();
        let err = b.translate(value(&[1.0, 2.0]), s).unwrap_err();
        assert!(matches!(err, SceneError::TypeMismatch { expected: Ty::Vec3, found: Ty::Vec2, .. }));
        // A failed push leaves the arena unchanged
        assert_eq!(b.shapes().len(), 1);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut other = SceneBuilder::new();
        other.sphere();
        let foreign = other.cube();
        let mut b = SceneBuilder::new();
        assert!(matches!(b.union(foreign, foreign), Err(SceneError::UnknownShape(id)) if id == foreign));
        assert!(matches!(b.model(foreign, Material::default()), Err(SceneError::UnknownShape(_))));
    }

    #[test]
    fn test_foreign_handle_in_range_rejected() {
        let mut other = SceneBuilder::new();
        let foreign = other.sphere();
        let mut b = SceneBuilder::new();
        let local = b.sphere();
        assert_eq!(foreign.get(), local.get());
        assert_ne!(foreign, local);
        assert!(matches!(b.translate(value(&[1.0, 0.0, 0.0]), foreign), Err(SceneError::UnknownShape(_))));
        assert!(b.model(local, Material::default()).is_ok());
        assert!(b.model(foreign, Material::default()).is_err());
        assert_eq!(b.shapes().len(), 1);
    }

    #[test]
    fn test_shape_slots_cannot_read_direction_or_normal() {
        let mut b = SceneBuilder::new();
        let err = b.cylinder(Expression::direction().x() + 0.5, scalar(1.0)).unwrap_err();
        assert!(matches!(
            &err,
            SceneError::UnboundVariable { slot, variable: Variable::Direction } if slot == "cylinder.radius"
        ));
        let s = b.sphere();
        let err = b.translate(Expression::normal(), s).unwrap_err();
        assert!(matches!(err, SceneError::UnboundVariable { variable: Variable::Normal, .. }));
        assert_eq!(b.shapes().len(), 1);

        // Position, cell and frame variables are bound in shape functions
        let wobble = Expression::position().y() * 0.1 + Expression::time().sin() * 0.05;
        assert!(b.cylinder(scalar(0.25) + wobble, Expression::cell().x()).is_ok());
    }

    #[test]
    fn test_modulate_hands_out_cell() {
        let mut b = SceneBuilder::new();
        let m = b
            .modulate(value(&[1.0, 0.0, 1.0]), |b, cell| {
                let size = raw("0.5 + 0.2 * {r}.x", vec![("r", random_of(&cell))]);
                b.smooth_box(size, scalar(0.05))
            })
            .unwrap();
        assert_eq!(m.get(), 2);
        let node = b.shapes().node(m);
        assert_eq!(node.kind.name(), "modulate");
    }

    fn random_of(cell: &Expression) -> Expression {
        crate::expression::random(cell.dot(value(&[1.0, 57.0, 113.0])))
    }

    #[test]
    fn test_camera_and_air_checked() {
        let mut b = SceneBuilder::new();
        let bad = Camera {
            up: scalar(1.0),
            ..Camera::default()
        };
        assert!(b.camera(bad).is_err());
        assert!(b.air(Material::default().with_scatter(scalar(10.0))).is_ok());
        assert_eq!(b.build().air().scatter, scalar(10.0));
    }
}
