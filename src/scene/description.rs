//! JSON scene descriptions
//!
//! A description lists named shapes and materials, then models that refer
//! to them by name (or define them inline). A name may only refer to
//! definitions that appear earlier in its list, so the shape graph stays
//! acyclic. Reusing a name reuses the same node, which is emitted once per
//! model.
//!
//! ```json
//! {
//!   "shapes": [
//!     { "name": "ball", "type": "sphere" },
//!     { "name": "pair", "type": "union",
//!       "a": "ball",
//!       "b": { "type": "translate", "offset": [1, 0, 0], "shape": "ball" } }
//!   ],
//!   "materials": [
//!     { "name": "glass", "type": "material", "transmittance": 0.9, "refraction": 1.5 }
//!   ],
//!   "models": [ { "shape": "pair", "material": "glass" } ]
//! }
//! ```
//!
//! Expressions are numbers (`2.5` is a float), arrays (`[1, 0, 0]`, one
//! element broadcasts to `vec3`), `{"var": "cell"}`, `{"random": seed}`,
//! `{"raw": "...", "bindings": {...}, "ty": "vec3"}`, `{"swizzle": "xy",
//! "of": e}` or `{"op": "+", "args": [a, b]}` where `op` is an arithmetic
//! operator or a builtin function name.

use super::{Camera, Orbit, Scene, SceneBuilder, SceneError};
use crate::expression::{random, scalar, value, Builtin, Expression, Ty, Variable};
use crate::material::{Material, Spotlight};
use crate::shapes::{Axis, Shape};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Parsed scene file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDescription {
    /// Named shapes, in definition order
    #[serde(default)]
    pub shapes: Vec<NamedShape>,
    /// Named materials, in definition order
    #[serde(default)]
    pub materials: Vec<NamedMaterial>,
    /// Models in dispatch order
    pub models: Vec<ModelDesc>,
    /// Optional camera
    #[serde(default)]
    pub camera: Option<CameraDesc>,
    /// Optional ambient medium
    #[serde(default)]
    pub air: Option<MaterialRef>,
}

/// A shape definition with a name
#[derive(Debug, Clone, Deserialize)]
pub struct NamedShape {
    /// Name other definitions refer to
    pub name: String,
    /// Definition
    #[serde(flatten)]
    pub shape: ShapeDesc,
}

/// A material definition with a name
#[derive(Debug, Clone, Deserialize)]
pub struct NamedMaterial {
    /// Name models refer to
    pub name: String,
    /// Definition
    #[serde(flatten)]
    pub material: MaterialDesc,
}

/// Model entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDesc {
    /// Root shape
    pub shape: ShapeRef,
    /// Surface material, default if absent
    #[serde(default)]
    pub material: Option<MaterialRef>,
}

/// Shape given by name or inline
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShapeRef {
    /// Earlier named definition
    Named(String),
    /// Inline definition
    Inline(Box<ShapeDesc>),
}

/// Material given by name or inline
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaterialRef {
    /// Earlier named definition
    Named(String),
    /// Inline definition
    Inline(Box<MaterialDesc>),
}

/// Shape node definition, tagged by `type`
#[allow(missing_docs)]
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeDesc {
    Sphere,
    Cube,
    Skull,
    Plane { normal: ExprDesc, #[serde(default)] offset: Option<ExprDesc> },
    SmoothBox { size: ExprDesc, radius: ExprDesc },
    Cylinder { radius: ExprDesc, height: ExprDesc },
    Torus { major: ExprDesc, minor: ExprDesc },
    Truchet { thickness: ExprDesc },
    Translate { offset: ExprDesc, shape: ShapeRef },
    Scale { factor: ExprDesc, shape: ShapeRef },
    RotateX { angle: ExprDesc, shape: ShapeRef },
    RotateY { angle: ExprDesc, shape: ShapeRef },
    RotateZ { angle: ExprDesc, shape: ShapeRef },
    Union { a: ShapeRef, b: ShapeRef },
    Intersection { a: ShapeRef, b: ShapeRef },
    Difference { a: ShapeRef, b: ShapeRef },
    SmoothUnion { a: ShapeRef, b: ShapeRef, radius: ExprDesc },
    SmoothIntersection { a: ShapeRef, b: ShapeRef, radius: ExprDesc },
    SmoothDifference { a: ShapeRef, b: ShapeRef, radius: ExprDesc },
    Modulate { period: ExprDesc, shape: ShapeRef },
    Repeat { period: ExprDesc, shape: ShapeRef },
}

/// Material definition, tagged by `type`
#[allow(missing_docs)]
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialDesc {
    Material {
        #[serde(default)]
        color: Option<ExprDesc>,
        #[serde(default)]
        transmittance: Option<ExprDesc>,
        #[serde(default)]
        smoothness: Option<ExprDesc>,
        #[serde(default)]
        refraction: Option<ExprDesc>,
        #[serde(default)]
        scatter: Option<ExprDesc>,
        #[serde(default)]
        emissivity: Option<ExprDesc>,
    },
    Spotlight {
        #[serde(default)]
        color: Option<ExprDesc>,
        #[serde(default)]
        direction: Option<ExprDesc>,
        #[serde(default)]
        spread: Option<ExprDesc>,
        #[serde(default)]
        ambient: Option<ExprDesc>,
    },
}

/// Camera definition, tagged by `type`
#[allow(missing_docs)]
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraDesc {
    LookAt {
        #[serde(default)]
        eye: Option<ExprDesc>,
        #[serde(default)]
        target: Option<ExprDesc>,
        #[serde(default)]
        up: Option<ExprDesc>,
        #[serde(default)]
        field_of_view: Option<ExprDesc>,
        #[serde(default)]
        aperture: Option<ExprDesc>,
    },
    Orbit {
        #[serde(default)]
        field_of_view: Option<ExprDesc>,
        #[serde(default)]
        radius: Option<ExprDesc>,
        #[serde(default)]
        aperture: Option<ExprDesc>,
        #[serde(default)]
        target: Option<ExprDesc>,
        #[serde(default)]
        offset: Option<ExprDesc>,
    },
}

/// Expression in a description
#[allow(missing_docs)]
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExprDesc {
    Number(f32),
    Vector(Vec<f32>),
    Variable {
        var: String,
    },
    Random {
        random: Box<ExprDesc>,
    },
    Swizzle {
        swizzle: String,
        of: Box<ExprDesc>,
    },
    Op {
        op: String,
        args: Vec<ExprDesc>,
    },
    Raw {
        raw: String,
        #[serde(default)]
        bindings: BTreeMap<String, ExprDesc>,
        #[serde(default)]
        ty: Option<String>,
    },
}

impl ExprDesc {
    /// Convert into an expression
    pub fn to_expression(&self) -> Result<Expression, SceneError> {
        Ok(match self {
            ExprDesc::Number(x) => scalar(*x),
            ExprDesc::Vector(v) => value(v),
            ExprDesc::Variable { var } => Expression::Variable(parse_variable(var)?),
            ExprDesc::Random { random: seed } => {
                let seed = seed.to_expression()?;
                // Vector seeds fold to a scalar the same way random_cell does
                match seed.ty() {
                    Ok(Ty::Vec3) => random(seed.dot(value(&[1.0, 57.0, 113.0]))),
                    _ => random(seed),
                }
            }
            ExprDesc::Swizzle { swizzle, of } => of.to_expression()?.swizzle(swizzle),
            ExprDesc::Op { op, args } => {
                let args = args
                    .iter()
                    .map(ExprDesc::to_expression)
                    .collect::<Result<Vec<_>, _>>()?;
                apply_op(op, args)?
            }
            ExprDesc::Raw { raw, bindings, ty } => {
                let ty = match ty.as_deref() {
                    None => Ty::Vec3,
                    Some(name) => parse_ty(name)?,
                };
                let mut bound = Vec::with_capacity(bindings.len());
                for (name, e) in bindings {
                    bound.push((name.as_str(), e.to_expression()?));
                }
                Expression::raw(raw.clone(), bound, ty)
            }
        })
    }
}

fn parse_variable(name: &str) -> Result<Variable, SceneError> {
    Ok(match name {
        "position" | "p" => Variable::Position,
        "normal" | "n" => Variable::Normal,
        "direction" | "d" => Variable::Direction,
        "cell" => Variable::Cell,
        "time" => Variable::Time,
        "uv" => Variable::Uv,
        "mouse" => Variable::Mouse,
        other => return Err(SceneError::UnknownVariable(other.to_string())),
    })
}

fn parse_ty(name: &str) -> Result<Ty, SceneError> {
    Ok(match name {
        "float" => Ty::Float,
        "vec2" => Ty::Vec2,
        "vec3" => Ty::Vec3,
        "vec4" => Ty::Vec4,
        other => return Err(SceneError::Parse(format!("unknown type `{}`", other))),
    })
}

fn parse_builtin(name: &str) -> Option<Builtin> {
    Some(match name {
        "abs" => Builtin::Abs,
        "sin" => Builtin::Sin,
        "cos" => Builtin::Cos,
        "floor" => Builtin::Floor,
        "fract" => Builtin::Fract,
        "sqrt" => Builtin::Sqrt,
        "normalize" => Builtin::Normalize,
        "length" => Builtin::Length,
        "dot" => Builtin::Dot,
        "cross" => Builtin::Cross,
        "min" => Builtin::Min,
        "max" => Builtin::Max,
        "pow" => Builtin::Pow,
        "mix" => Builtin::Mix,
        "clamp" => Builtin::Clamp,
        "smoothstep" => Builtin::Smoothstep,
        _ => return None,
    })
}

fn apply_op(op: &str, mut args: Vec<Expression>) -> Result<Expression, SceneError> {
    let arity = |n: usize, args: &[Expression]| {
        if args.len() == n {
            Ok(())
        } else {
            Err(SceneError::Parse(format!("`{}` takes {} arguments, got {}", op, n, args.len())))
        }
    };
    match op {
        "neg" => {
            arity(1, &args)?;
            Ok(-args.remove(0))
        }
        "+" | "-" | "*" | "/" => {
            arity(2, &args)?;
            let rhs = args.remove(1);
            let lhs = args.remove(0);
            Ok(match op {
                "+" => lhs + rhs,
                "-" => lhs - rhs,
                "*" => lhs * rhs,
                _ => lhs / rhs,
            })
        }
        "vec2" | "vec3" | "vec4" => Ok(Expression::construct(parse_ty(op)?, args)),
        name => match parse_builtin(name) {
            Some(function) => Ok(Expression::call(function, args)),
            None => Err(SceneError::Parse(format!("unknown operator `{}`", name))),
        },
    }
}

fn opt(e: &Option<ExprDesc>, default: Expression) -> Result<Expression, SceneError> {
    match e {
        Some(desc) => desc.to_expression(),
        None => Ok(default),
    }
}

impl MaterialDesc {
    /// Convert into a material
    pub fn to_material(&self) -> Result<Material, SceneError> {
        let d = Material::default();
        Ok(match self {
            MaterialDesc::Material {
                color,
                transmittance,
                smoothness,
                refraction,
                scatter,
                emissivity,
            } => Material {
                color: opt(color, d.color)?,
                transmittance: opt(transmittance, d.transmittance)?,
                smoothness: opt(smoothness, d.smoothness)?,
                refraction: opt(refraction, d.refraction)?,
                scatter: opt(scatter, d.scatter)?,
                emissivity: opt(emissivity, d.emissivity)?,
            },
            MaterialDesc::Spotlight {
                color,
                direction,
                spread,
                ambient,
            } => {
                let s = Spotlight::default();
                Spotlight {
                    color: opt(color, s.color)?,
                    direction: opt(direction, s.direction)?,
                    spread: opt(spread, s.spread)?,
                    ambient: opt(ambient, s.ambient)?,
                }
                .material()
            }
        })
    }
}

impl CameraDesc {
    /// Convert into a camera
    pub fn to_camera(&self) -> Result<Camera, SceneError> {
        match self {
            CameraDesc::LookAt {
                eye,
                target,
                up,
                field_of_view,
                aperture,
            } => {
                let d = Camera::default();
                Ok(Camera {
                    eye: opt(eye, d.eye)?,
                    target: opt(target, d.target)?,
                    up: opt(up, d.up)?,
                    field_of_view: opt(field_of_view, d.field_of_view)?,
                    aperture: opt(aperture, d.aperture)?,
                })
            }
            CameraDesc::Orbit {
                field_of_view,
                radius,
                aperture,
                target,
                offset,
            } => {
                let d = Orbit::default();
                Orbit {
                    field_of_view: opt(field_of_view, d.field_of_view)?,
                    radius: opt(radius, d.radius)?,
                    aperture: opt(aperture, d.aperture)?,
                    target: opt(target, d.target)?,
                    offset: opt(offset, d.offset)?,
                }
                .camera()
            }
        }
    }
}

/// Name tables used while lowering a description
struct Lowering {
    builder: SceneBuilder,
    shapes: HashMap<String, Shape>,
    materials: HashMap<String, Material>,
}

impl Lowering {
    fn shape_ref(&mut self, r: &ShapeRef) -> Result<Shape, SceneError> {
        match r {
            ShapeRef::Named(name) => self
                .shapes
                .get(name)
                .copied()
                .ok_or_else(|| SceneError::UndefinedShape(name.clone())),
            ShapeRef::Inline(desc) => self.shape(desc),
        }
    }

    fn material_ref(&self, r: &MaterialRef) -> Result<Material, SceneError> {
        match r {
            MaterialRef::Named(name) => self
                .materials
                .get(name)
                .cloned()
                .ok_or_else(|| SceneError::UndefinedMaterial(name.clone())),
            MaterialRef::Inline(desc) => desc.to_material(),
        }
    }

    fn shape(&mut self, desc: &ShapeDesc) -> Result<Shape, SceneError> {
        match desc {
            ShapeDesc::Sphere => Ok(self.builder.sphere()),
            ShapeDesc::Cube => Ok(self.builder.cube()),
            ShapeDesc::Skull => Ok(self.builder.skull()),
            ShapeDesc::Plane { normal, offset } => {
                self.builder.plane(normal.to_expression()?, opt(offset, scalar(0.0))?)
            }
            ShapeDesc::SmoothBox { size, radius } => {
                self.builder.smooth_box(size.to_expression()?, radius.to_expression()?)
            }
            ShapeDesc::Cylinder { radius, height } => {
                self.builder.cylinder(radius.to_expression()?, height.to_expression()?)
            }
            ShapeDesc::Torus { major, minor } => self.builder.torus(major.to_expression()?, minor.to_expression()?),
            ShapeDesc::Truchet { thickness } => self.builder.truchet(thickness.to_expression()?),
            ShapeDesc::Translate { offset, shape } => {
                let child = self.shape_ref(shape)?;
                self.builder.translate(offset.to_expression()?, child)
            }
            ShapeDesc::Scale { factor, shape } => {
                let child = self.shape_ref(shape)?;
                self.builder.scale(factor.to_expression()?, child)
            }
            ShapeDesc::RotateX { angle, shape } => self.rotate(Axis::X, angle, shape),
            ShapeDesc::RotateY { angle, shape } => self.rotate(Axis::Y, angle, shape),
            ShapeDesc::RotateZ { angle, shape } => self.rotate(Axis::Z, angle, shape),
            ShapeDesc::Union { a, b } => {
                let (a, b) = (self.shape_ref(a)?, self.shape_ref(b)?);
                self.builder.union(a, b)
            }
            ShapeDesc::Intersection { a, b } => {
                let (a, b) = (self.shape_ref(a)?, self.shape_ref(b)?);
                self.builder.intersection(a, b)
            }
            ShapeDesc::Difference { a, b } => {
                let (a, b) = (self.shape_ref(a)?, self.shape_ref(b)?);
                self.builder.difference(a, b)
            }
            ShapeDesc::SmoothUnion { a, b, radius } => {
                let (a, b) = (self.shape_ref(a)?, self.shape_ref(b)?);
                self.builder.smooth_union(a, b, radius.to_expression()?)
            }
            ShapeDesc::SmoothIntersection { a, b, radius } => {
                let (a, b) = (self.shape_ref(a)?, self.shape_ref(b)?);
                self.builder.smooth_intersection(a, b, radius.to_expression()?)
            }
            ShapeDesc::SmoothDifference { a, b, radius } => {
                let (a, b) = (self.shape_ref(a)?, self.shape_ref(b)?);
                self.builder.smooth_difference(a, b, radius.to_expression()?)
            }
            // The child reads the cell through `{"var": "cell"}`
            ShapeDesc::Modulate { period, shape } => {
                let period = period.to_expression()?;
                let child = self.shape_ref(shape)?;
                self.builder.modulate(period, |_, _| Ok(child))
            }
            ShapeDesc::Repeat { period, shape } => {
                let child = self.shape_ref(shape)?;
                self.builder.repeat(period.to_expression()?, child)
            }
        }
    }

    fn rotate(&mut self, axis: Axis, angle: &ExprDesc, shape: &ShapeRef) -> Result<Shape, SceneError> {
        let child = self.shape_ref(shape)?;
        self.builder.rotate(axis, angle.to_expression()?, child)
    }
}

impl SceneDescription {
    /// Parse from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, SceneError> {
        serde_json::from_str(json).map_err(|e| SceneError::Parse(e.to_string()))
    }

    /// Parse from a JSON file (buffered)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|e| SceneError::Parse(e.to_string()))
    }

    /// Resolve names and assemble the scene
    pub fn build(&self) -> Result<Scene, SceneError> {
        let mut lowering = Lowering {
            builder: SceneBuilder::new(),
            shapes: HashMap::new(),
            materials: HashMap::new(),
        };

        for named in &self.shapes {
            if lowering.shapes.contains_key(&named.name) {
                return Err(SceneError::DuplicateName(named.name.clone()));
            }
            let shape = lowering.shape(&named.shape)?;
            lowering.shapes.insert(named.name.clone(), shape);
        }

        for named in &self.materials {
            if lowering.materials.contains_key(&named.name) {
                return Err(SceneError::DuplicateName(named.name.clone()));
            }
            let material = named.material.to_material()?;
            material.validate()?;
            lowering.materials.insert(named.name.clone(), material);
        }

        for model in &self.models {
            let shape = lowering.shape_ref(&model.shape)?;
            let material = match &model.material {
                Some(r) => lowering.material_ref(r)?,
                None => Material::default(),
            };
            lowering.builder.model(shape, material)?;
        }

        if let Some(camera) = &self.camera {
            lowering.builder.camera(camera.to_camera()?)?;
        }
        if let Some(air) = &self.air {
            let air = lowering.material_ref(air)?;
            lowering.builder.air(air)?;
        }

        Ok(lowering.builder.build())
    }
}

/// Load and assemble a scene file
pub fn load_scene(path: impl AsRef<Path>) -> Result<Scene, SceneError> {
    SceneDescription::load(path)?.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeKind;

    fn build(json: &str) -> Result<Scene, SceneError> {
        SceneDescription::from_json_str(json)?.build()
    }

    #[test]
    fn test_named_shapes_are_shared() {
        let scene = build(
            r#"{
                "shapes": [
                    { "name": "ball", "type": "sphere" },
                    { "name": "pair", "type": "union", "a": "ball",
                      "b": { "type": "translate", "offset": [1, 0, 0], "shape": "ball" } }
                ],
                "models": [ { "shape": "pair" } ]
            }"#,
        )
        .unwrap();
        assert_eq!(scene.shapes().len(), 3);
        let root = scene.models()[0].shape;
        let ShapeKind::Union { a, b } = &scene.shapes().node(root).kind else {
            panic!("expected union");
        };
        assert_eq!(scene.shapes().node(*b).dependencies, vec![*a]);
    }

    #[test]
    fn test_unknown_variant_fails() {
        let err = build(r#"{ "models": [ { "shape": { "type": "pyramid" } } ] }"#).unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }

    #[test]
    fn test_undefined_names_fail() {
        let err = build(r#"{ "models": [ { "shape": "nothing" } ] }"#).unwrap_err();
        assert!(matches!(err, SceneError::UndefinedShape(name) if name == "nothing"));

        let err = build(r#"{ "models": [ { "shape": { "type": "cube" }, "material": "gold" } ] }"#)
            .unwrap_err();
        assert!(matches!(err, SceneError::UndefinedMaterial(name) if name == "gold"));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let err = build(
            r#"{
                "shapes": [
                    { "name": "a", "type": "scale", "factor": 2, "shape": "b" },
                    { "name": "b", "type": "sphere" }
                ],
                "models": []
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::UndefinedShape(name) if name == "b"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = build(
            r#"{
                "shapes": [ { "name": "a", "type": "sphere" }, { "name": "a", "type": "cube" } ],
                "models": []
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::DuplicateName(_)));
    }

    #[test]
    fn test_expressions_and_materials() {
        let scene = build(
            r#"{
                "materials": [
                    { "name": "lamp", "type": "spotlight", "direction": [1, 1, 0] },
                    { "name": "jitter", "type": "material",
                      "color": { "raw": "0.9, 1.0 + 5.0 * {r}.x, 0.9",
                                 "bindings": { "r": { "random": { "var": "cell" } } } } }
                ],
                "models": [
                    { "shape": { "type": "scale", "factor": 8, "shape": { "type": "sphere" } },
                      "material": "lamp" },
                    { "shape": { "type": "modulate", "period": [1, 0, 1],
                                 "shape": { "type": "smooth_box",
                                            "size": { "op": "+", "args": [[0.5], { "op": "*",
                                                      "args": [0.1, { "swizzle": "xxx", "of": { "random": { "var": "cell" } } }] }] },
                                            "radius": 0.05 } },
                      "material": "jitter" }
                ],
                "camera": { "type": "orbit", "radius": 6 },
                "air": { "type": "material", "scatter": 50 }
            }"#,
        )
        .unwrap();
        assert_eq!(scene.models().len(), 2);
        assert_eq!(scene.models()[0].material.color, value(&[0.0]));
        assert_eq!(scene.air().scatter, scalar(50.0));
        assert!(scene.camera().eye.to_string().contains("mouse"));
    }

    #[test]
    fn test_type_errors_surface() {
        let err = build(
            r#"{ "models": [ { "shape": { "type": "translate", "offset": [1, 2], "shape": { "type": "cube" } } } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::TypeMismatch { .. }));

        let err = build(r#"{ "models": [ { "shape": { "type": "scale", "factor": { "var": "speed" }, "shape": { "type": "cube" } } } ] }"#)
            .unwrap_err();
        assert!(matches!(err, SceneError::UnknownVariable(_)));
    }

    #[test]
    fn test_unknown_top_level_field() {
        assert!(SceneDescription::from_json_str(r#"{ "models": [], "lights": [] }"#).is_err());
    }
}
