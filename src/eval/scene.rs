//! Scene-level queries mirroring the generated dispatch functions

use super::{eval_shape, EvalContext, EvalError};
use crate::compiler::MAX_VALUE;
use crate::material::Material;
use crate::scene::{Model, Scene};
use glam::Vec3;

/// Result of the closest-object query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Closest {
    /// Model id, 0 if no model is closer than `MAX_VALUE`
    pub object: u32,
    /// Unsigned distance to that model
    pub distance: f32,
}

/// A material evaluated at one point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaterialSample {
    /// Refraction probability
    pub transmittance: f32,
    /// Glossiness
    pub smoothness: f32,
    /// Index of refraction
    pub refraction: f32,
    /// Mean free path
    pub scatter: f32,
    /// Albedo
    pub color: Vec3,
    /// Emitted radiance
    pub emissivity: Vec3,
}

impl MaterialSample {
    /// Evaluate every field of `material` in `ctx`; scalar fields read `.x`
    pub fn evaluate(material: &Material, ctx: &EvalContext) -> Result<Self, EvalError> {
        Ok(MaterialSample {
            transmittance: material.transmittance.eval(ctx)?.x(),
            smoothness: material.smoothness.eval(ctx)?.x(),
            refraction: material.refraction.eval(ctx)?.x(),
            scatter: material.scatter.eval(ctx)?.x(),
            color: material.color.eval(ctx)?.to_vec3(),
            emissivity: material.emissivity.eval(ctx)?.to_vec3(),
        })
    }
}

/// Evaluates a scene the way the compiled program does
#[derive(Debug, Clone, Copy)]
pub struct SceneEvaluator<'a> {
    scene: &'a Scene,
    epsilon: f32,
    frame: EvalContext,
}

impl<'a> SceneEvaluator<'a> {
    /// Evaluator with normal offsets of `epsilon` and a zeroed frame
    pub fn new(scene: &'a Scene, epsilon: f32) -> Self {
        SceneEvaluator {
            scene,
            epsilon,
            frame: EvalContext::default(),
        }
    }

    /// Use the frame variables (`time`, `uv`, `mouse`) of `frame`
    #[must_use]
    pub fn with_frame(mut self, frame: EvalContext) -> Self {
        self.frame = frame;
        self
    }

    /// Scene being evaluated
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// Signed distance of one model (`distance<id>`)
    pub fn distance(&self, model: &Model, position: Vec3) -> Result<f32, EvalError> {
        eval_shape(self.scene.shapes(), model.shape, position, Vec3::ZERO, &self.frame)
    }

    /// Closest model at `position`; ties keep the earlier model
    pub fn closest(&self, position: Vec3) -> Result<Closest, EvalError> {
        let mut closest = Closest {
            object: 0,
            distance: MAX_VALUE,
        };
        for model in self.scene.models() {
            let d = self.distance(model, position)?.abs();
            if d < closest.distance {
                closest = Closest {
                    object: model.id,
                    distance: d,
                };
            }
        }
        Ok(closest)
    }

    /// Central-difference normal of `object`, zero for unknown ids
    pub fn normal(&self, object: u32, position: Vec3) -> Result<Vec3, EvalError> {
        let Some(model) = self.scene.model(object) else {
            return Ok(Vec3::ZERO);
        };
        let e = self.epsilon;
        let d = |offset: Vec3| -> Result<f32, EvalError> {
            Ok(self.distance(model, position + offset)? - self.distance(model, position - offset)?)
        };
        let gradient = Vec3::new(d(Vec3::X * e)?, d(Vec3::Y * e)?, d(Vec3::Z * e)?);
        Ok(gradient.normalize_or_zero())
    }

    /// Material of `object` at a hit; zeroed for unknown ids
    pub fn material(
        &self,
        object: u32,
        position: Vec3,
        normal: Vec3,
        direction: Vec3,
    ) -> Result<MaterialSample, EvalError> {
        match self.scene.model(object) {
            Some(model) => MaterialSample::evaluate(&model.material, &self.at(position, normal, direction)),
            None => Ok(MaterialSample::default()),
        }
    }

    /// Ambient medium at `position`
    pub fn air(&self, position: Vec3, direction: Vec3) -> Result<MaterialSample, EvalError> {
        MaterialSample::evaluate(self.scene.air(), &self.at(position, Vec3::ZERO, direction))
    }

    fn at(&self, position: Vec3, normal: Vec3, direction: Vec3) -> EvalContext {
        EvalContext {
            position,
            normal,
            direction,
            cell: Vec3::ZERO,
            ..self.frame
        }
    }
}
