//! Camera description
//!
//! Every camera field is an expression so the view can depend on `time` or
//! `mouse`. The compiled program evaluates them once per pixel.

use super::{expect_any, expect_bound, expect_type, SceneError, UNBOUND_IN_CAMERA};
use crate::expression::{scalar, value, Expression, Ty};
use crate::material::scalar_of;
use std::f32::consts::PI;

/// Pinhole / thin-lens camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye position (vec3)
    pub eye: Expression,
    /// Point looked at (vec3)
    pub target: Expression,
    /// Up vector (vec3)
    pub up: Expression,
    /// Vertical field of view in radians (scalar slot)
    pub field_of_view: Expression,
    /// Lens radius; 0 disables depth of field (scalar slot)
    pub aperture: Expression,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            eye: value(&[0.0, 0.0, 4.0]),
            target: value(&[0.0]),
            up: value(&[0.0, 1.0, 0.0]),
            field_of_view: scalar(PI / 3.0),
            aperture: scalar(0.0),
        }
    }
}

impl Camera {
    /// Camera at `eye` looking at `target`
    pub fn look_at(eye: impl Into<Expression>, target: impl Into<Expression>) -> Self {
        Camera {
            eye: eye.into(),
            target: target.into(),
            ..Camera::default()
        }
    }

    /// Mouse-driven orbit camera
    pub fn orbit(orbit: Orbit) -> Result<Self, SceneError> {
        orbit.camera()
    }

    /// Set field of view
    #[must_use]
    pub fn with_field_of_view(mut self, field_of_view: impl Into<Expression>) -> Self {
        self.field_of_view = field_of_view.into();
        self
    }

    /// Set aperture
    #[must_use]
    pub fn with_aperture(mut self, aperture: impl Into<Expression>) -> Self {
        self.aperture = aperture.into();
        self
    }

    /// Set up vector
    #[must_use]
    pub fn with_up(mut self, up: impl Into<Expression>) -> Self {
        self.up = up.into();
        self
    }

    /// Check every field's type and that only `time`, `uv` and `mouse`
    /// are read
    pub fn validate(&self) -> Result<(), SceneError> {
        expect_type("camera.eye", &self.eye, Ty::Vec3)?;
        expect_type("camera.target", &self.target, Ty::Vec3)?;
        expect_type("camera.up", &self.up, Ty::Vec3)?;
        expect_any("camera.field_of_view", &self.field_of_view)?;
        expect_any("camera.aperture", &self.aperture)?;
        for (slot, expression) in [
            ("camera.eye", &self.eye),
            ("camera.target", &self.target),
            ("camera.up", &self.up),
            ("camera.field_of_view", &self.field_of_view),
            ("camera.aperture", &self.aperture),
        ] {
            expect_bound(slot, expression, UNBOUND_IN_CAMERA)?;
        }
        Ok(())
    }
}

/// Mouse-driven camera orbiting `target` at `radius`
#[derive(Debug, Clone, PartialEq)]
pub struct Orbit {
    /// Vertical field of view in radians (scalar slot)
    pub field_of_view: Expression,
    /// Orbit radius (scalar slot)
    pub radius: Expression,
    /// Lens radius (scalar slot)
    pub aperture: Expression,
    /// Orbit center (vec3)
    pub target: Expression,
    /// Spherical angles, in half turns, added to the mouse position (vec2)
    pub offset: Expression,
}

impl Default for Orbit {
    fn default() -> Self {
        Orbit {
            field_of_view: scalar(PI / 3.0),
            radius: scalar(4.0),
            aperture: scalar(0.0),
            target: value(&[0.0]),
            offset: value(&[0.25, -0.4]),
        }
    }
}

impl Orbit {
    /// Resolve into a camera whose eye follows the mouse
    pub fn camera(self) -> Result<Camera, SceneError> {
        expect_type("orbit.offset", &self.offset, Ty::Vec2)?;
        let angles = (self.offset + Expression::mouse()) * PI;
        let (theta, phi) = (angles.x(), angles.y());
        let direction = Expression::construct(
            Ty::Vec3,
            vec![phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()],
        );
        let camera = Camera {
            eye: &self.target + scalar_of(&self.radius) * direction,
            target: self.target,
            up: value(&[0.0, 1.0, 0.0]),
            field_of_view: self.field_of_view,
            aperture: self.aperture,
        };
        camera.validate()?;
        Ok(camera)
    }
}
