//! CPU values mirroring GLSL `float`/`vecN` semantics

use super::EvalError;
use crate::expression::Ty;
use glam::{Vec2, Vec3, Vec4};

/// A scalar or vector value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Value {
    ty: Ty,
    data: [f32; 4],
}

impl Value {
    /// Scalar
    #[inline]
    pub fn float(x: f32) -> Self {
        Value {
            ty: Ty::Float,
            data: [x, 0.0, 0.0, 0.0],
        }
    }

    /// Two-component vector
    #[inline]
    pub fn vec2(v: Vec2) -> Self {
        Value {
            ty: Ty::Vec2,
            data: [v.x, v.y, 0.0, 0.0],
        }
    }

    /// Three-component vector
    #[inline]
    pub fn vec3(v: Vec3) -> Self {
        Value {
            ty: Ty::Vec3,
            data: [v.x, v.y, v.z, 0.0],
        }
    }

    /// Four-component vector
    #[inline]
    pub fn vec4(v: Vec4) -> Self {
        Value {
            ty: Ty::Vec4,
            data: v.to_array(),
        }
    }

    /// All components set to `x`
    pub fn splat(ty: Ty, x: f32) -> Self {
        let mut data = [0.0; 4];
        data[..ty.components()].fill(x);
        Value { ty, data }
    }

    /// Build from 1 to 4 components
    pub fn from_components(components: &[f32]) -> Option<Self> {
        let ty = Ty::from_components(components.len())?;
        let mut data = [0.0; 4];
        data[..components.len()].copy_from_slice(components);
        Some(Value { ty, data })
    }

    /// Value type
    #[inline]
    pub fn ty(&self) -> Ty {
        self.ty
    }

    /// Live components
    #[inline]
    pub fn components(&self) -> &[f32] {
        &self.data[..self.ty.components()]
    }

    /// First component, the reading of a scalar slot
    #[inline]
    pub fn x(&self) -> f32 {
        self.data[0]
    }

    /// As `Vec2`; scalars broadcast
    pub fn to_vec2(&self) -> Vec2 {
        match self.ty {
            Ty::Float => Vec2::splat(self.data[0]),
            _ => Vec2::new(self.data[0], self.data[1]),
        }
    }

    /// As `Vec3`; scalars broadcast, missing components are zero
    pub fn to_vec3(&self) -> Vec3 {
        match self.ty {
            Ty::Float => Vec3::splat(self.data[0]),
            _ => Vec3::new(self.data[0], self.data[1], self.data[2]),
        }
    }

    /// Apply `f` to every component
    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        let mut out = self;
        for c in &mut out.data[..self.ty.components()] {
            *c = f(*c);
        }
        out
    }

    /// Combine componentwise, broadcasting a scalar operand
    pub fn zip(self, other: Value, op: &'static str, f: impl Fn(f32, f32) -> f32) -> Result<Self, EvalError> {
        let ty = match (self.ty, other.ty) {
            (a, b) if a == b => a,
            (Ty::Float, t) | (t, Ty::Float) => t,
            (a, b) => return Err(EvalError::Type(format!("`{}` on {} and {}", op, a, b))),
        };
        let mut data = [0.0; 4];
        for (i, slot) in data.iter_mut().enumerate().take(ty.components()) {
            *slot = f(self.lane(i), other.lane(i));
        }
        Ok(Value { ty, data })
    }

    /// Component `i`, broadcasting scalars
    #[inline]
    fn lane(&self, i: usize) -> f32 {
        if self.ty == Ty::Float {
            self.data[0]
        } else {
            self.data[i]
        }
    }

    /// Euclidean length
    pub fn length(&self) -> f32 {
        self.components().iter().map(|c| c * c).sum::<f32>().sqrt()
    }

    /// Dot product of equally sized values
    pub fn dot(&self, other: &Value) -> Result<f32, EvalError> {
        if self.ty != other.ty {
            return Err(EvalError::Type(format!("`dot` on {} and {}", self.ty, other.ty)));
        }
        Ok(self
            .components()
            .iter()
            .zip(other.components())
            .map(|(a, b)| a * b)
            .sum())
    }
}
