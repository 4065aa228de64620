//! Surface and medium materials
//!
//! A [`Material`] is a record of expression-valued optical properties. The
//! same record describes a surface (attached to a model) and a participating
//! medium (the scene's `air`, or the inside of a refractive model).
//!
//! Expressions of a material are evaluated at the hit point `p`, with the
//! surface normal `n` and incoming direction `d` in scope.

use crate::compiler::MAX_VALUE;
use crate::expression::{scalar, value, Expression, Ty};
use crate::scene::{expect_any, expect_type, SceneError};

/// Expression-valued optical properties
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Albedo multiplied into the path throughput (vec3); zero absorbs
    pub color: Expression,
    /// Probability of refracting instead of reflecting (scalar slot)
    pub transmittance: Expression,
    /// 0 = diffuse, 1 = mirror (scalar slot)
    pub smoothness: Expression,
    /// Index of refraction (scalar slot)
    pub refraction: Expression,
    /// Mean free path inside the medium (scalar slot)
    pub scatter: Expression,
    /// Emitted radiance (vec3)
    pub emissivity: Expression,
}

impl Default for Material {
    /// Opaque white surface in a non-scattering medium
    fn default() -> Self {
        Material {
            color: value(&[1.0]),
            transmittance: scalar(0.0),
            smoothness: scalar(0.0),
            refraction: scalar(1.0),
            scatter: scalar(MAX_VALUE),
            emissivity: value(&[0.0]),
        }
    }
}

impl Material {
    /// Default material
    pub fn new() -> Self {
        Self::default()
    }

    /// Default ambient medium
    pub fn air() -> Self {
        Self::default()
    }

    /// Directional emitter configured by `spotlight`
    pub fn spotlight(spotlight: Spotlight) -> Self {
        spotlight.material()
    }

    /// Set albedo
    #[must_use]
    pub fn with_color(mut self, color: impl Into<Expression>) -> Self {
        self.color = color.into();
        self
    }

    /// Set transmittance
    #[must_use]
    pub fn with_transmittance(mut self, transmittance: impl Into<Expression>) -> Self {
        self.transmittance = transmittance.into();
        self
    }

    /// Set smoothness
    #[must_use]
    pub fn with_smoothness(mut self, smoothness: impl Into<Expression>) -> Self {
        self.smoothness = smoothness.into();
        self
    }

    /// Set index of refraction
    #[must_use]
    pub fn with_refraction(mut self, refraction: impl Into<Expression>) -> Self {
        self.refraction = refraction.into();
        self
    }

    /// Set mean free path
    #[must_use]
    pub fn with_scatter(mut self, scatter: impl Into<Expression>) -> Self {
        self.scatter = scatter.into();
        self
    }

    /// Set emitted radiance
    #[must_use]
    pub fn with_emissivity(mut self, emissivity: impl Into<Expression>) -> Self {
        self.emissivity = emissivity.into();
        self
    }

    /// Check every field's type
    pub fn validate(&self) -> Result<(), SceneError> {
        expect_type("material.color", &self.color, Ty::Vec3)?;
        expect_any("material.transmittance", &self.transmittance)?;
        expect_any("material.smoothness", &self.smoothness)?;
        expect_any("material.refraction", &self.refraction)?;
        expect_any("material.scatter", &self.scatter)?;
        expect_type("material.emissivity", &self.emissivity, Ty::Vec3)?;
        Ok(())
    }

    /// All fields with their slot names, in declaration order
    pub fn fields(&self) -> [(&'static str, &Expression); 6] {
        [
            ("transmittance", &self.transmittance),
            ("smoothness", &self.smoothness),
            ("refraction", &self.refraction),
            ("scatter", &self.scatter),
            ("color", &self.color),
            ("emissivity", &self.emissivity),
        ]
    }
}

/// Directional emitter, typically attached to a large enclosing sphere
#[derive(Debug, Clone, PartialEq)]
pub struct Spotlight {
    /// Emitted color (vec3)
    pub color: Expression,
    /// Direction the light shines from (vec3)
    pub direction: Expression,
    /// Angular width; larger is softer (scalar slot)
    pub spread: Expression,
    /// Uniform emission added in every direction (scalar slot)
    pub ambient: Expression,
}

impl Default for Spotlight {
    fn default() -> Self {
        Spotlight {
            color: value(&[1.0]),
            direction: value(&[0.0, 1.0, 0.0]),
            spread: scalar(0.1),
            ambient: scalar(0.0),
        }
    }
}

impl Spotlight {
    /// Set emitted color
    #[must_use]
    pub fn with_color(mut self, color: impl Into<Expression>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the direction light comes from
    #[must_use]
    pub fn with_direction(mut self, direction: impl Into<Expression>) -> Self {
        self.direction = direction.into();
        self
    }

    /// Set angular width
    #[must_use]
    pub fn with_spread(mut self, spread: impl Into<Expression>) -> Self {
        self.spread = spread.into();
        self
    }

    /// Set uniform emission
    #[must_use]
    pub fn with_ambient(mut self, ambient: impl Into<Expression>) -> Self {
        self.ambient = ambient.into();
        self
    }

    /// Absorbing material whose emission peaks along `direction`
    pub fn material(self) -> Material {
        let spread = scalar_of(&self.spread);
        let ambient = scalar_of(&self.ambient);
        let facing = Expression::direction().dot(self.direction.normalize());
        let lobe = facing.smoothstep(1.0 - spread, scalar(1.0));
        Material {
            color: value(&[0.0]),
            emissivity: self.color * (ambient + lobe),
            ..Material::default()
        }
    }
}

impl From<Spotlight> for Material {
    fn from(spotlight: Spotlight) -> Self {
        spotlight.material()
    }
}

/// Read an expression as a scalar: vectors by their first component
pub(crate) fn scalar_of(e: &Expression) -> Expression {
    match e.ty() {
        Ok(Ty::Float) => e.clone(),
        _ => e.x(),
    }
}
