//! Models, scenes and scene construction
//!
//! A [`Scene`] is the immutable input of the compiler: the shape arena, the
//! models (shape root + material, ids 1..n in creation order), the camera
//! and the ambient medium. Scenes are assembled through a [`SceneBuilder`]
//! or loaded from a JSON [`SceneDescription`]; both check expression types
//! and the variables an expression reads when a value is attached, so an
//! ill-formed scene never reaches emission.

mod builder;
mod camera;
mod description;

pub use builder::SceneBuilder;
pub use camera::{Camera, Orbit};
pub use description::{load_scene, SceneDescription};

use crate::expression::{ExprError, Expression, Ty, Variable};
use crate::material::Material;
use crate::shapes::{ShapeArena, ShapeId};
use thiserror::Error;

/// Scene construction errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// An expression has the wrong type for the slot it is attached to
    #[error("type mismatch for {slot}: expected {expected}, got {found}")]
    TypeMismatch {
        /// Slot name, e.g. `translate.offset`
        slot: String,
        /// Required type
        expected: Ty,
        /// Inferred type
        found: Ty,
    },

    /// An expression attached to a slot is itself ill-typed
    #[error("invalid expression for {slot}: {source}")]
    Expression {
        /// Slot name
        slot: String,
        /// Underlying type error
        #[source]
        source: ExprError,
    },

    /// A shape handle that this builder did not create
    #[error("unknown shape #{0}")]
    UnknownShape(ShapeId),

    /// Malformed scene description
    #[error("invalid scene description: {0}")]
    Parse(String),

    /// Reference to a shape name with no earlier definition
    #[error("undefined shape `{0}`")]
    UndefinedShape(String),

    /// Reference to an undefined material name
    #[error("undefined material `{0}`")]
    UndefinedMaterial(String),

    /// A name defined twice in one description
    #[error("duplicate definition of `{0}`")]
    DuplicateName(String),

    /// An expression reads a variable the slot's generated function does not bind
    #[error("`{}` is not available in {slot}", .variable.name())]
    UnboundVariable {
        /// Slot name
        slot: String,
        /// Variable read
        variable: Variable,
    },

    /// Unknown context variable in a description
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Check that `expression` is well-typed, returning its type
pub(crate) fn expect_any(slot: &str, expression: &Expression) -> Result<Ty, SceneError> {
    expression.ty().map_err(|source| SceneError::Expression {
        slot: slot.to_string(),
        source,
    })
}

/// Variables with no binding inside shape distance functions
pub(crate) const UNBOUND_IN_SHAPES: &[Variable] = &[Variable::Normal, Variable::Direction];

/// Variables with no binding inside `main`, where the camera is evaluated
pub(crate) const UNBOUND_IN_CAMERA: &[Variable] =
    &[Variable::Position, Variable::Normal, Variable::Direction, Variable::Cell];

/// Check that `expression` reads none of `unbound`
pub(crate) fn expect_bound(slot: &str, expression: &Expression, unbound: &[Variable]) -> Result<(), SceneError> {
    match unbound.iter().find(|v| expression.reads(**v)) {
        Some(variable) => Err(SceneError::UnboundVariable {
            slot: slot.to_string(),
            variable: *variable,
        }),
        None => Ok(()),
    }
}

/// Check that `expression` has type `expected`
pub(crate) fn expect_type(slot: &str, expression: &Expression, expected: Ty) -> Result<(), SceneError> {
    let found = expect_any(slot, expression)?;
    if found != expected {
        return Err(SceneError::TypeMismatch {
            slot: slot.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// A shape root paired with a material
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Dispatch id, unique within the scene, starting at 1
    pub id: u32,
    /// Root of the model's shape DAG
    pub shape: ShapeId,
    /// Surface material; also the medium entered by refraction
    pub material: Material,
}

/// Immutable compiler input
#[derive(Debug, Clone)]
pub struct Scene {
    pub(crate) shapes: ShapeArena,
    pub(crate) models: Vec<Model>,
    pub(crate) camera: Camera,
    pub(crate) air: Material,
}

impl Scene {
    /// Start building a scene
    pub fn builder() -> SceneBuilder {
        SceneBuilder::new()
    }

    /// All shape nodes
    pub fn shapes(&self) -> &ShapeArena {
        &self.shapes
    }

    /// Models in declaration order
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Model with dispatch id `id`
    pub fn model(&self, id: u32) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Ambient medium
    pub fn air(&self) -> &Material {
        &self.air
    }
}
