//! Expression model
//!
//! Typed value-producing nodes used by shapes, materials and the camera.
//! Every expression renders to a GLSL sub-expression and, unless it embeds a
//! raw snippet, can also be evaluated on the CPU by [`crate::eval`].
//!
//! Expressions are immutable once built. Composition is either through the
//! operator impls (`+ - * /` and unary `-`, with scalar broadcasting) or
//! through the builtin helpers ([`Expression::call`], [`Expression::dot`], ...).
//! Composition itself never fails; type errors are reported when an
//! expression is attached to a scene slot, see [`Expression::ty`].

mod ops;
mod render;

pub use render::{float_literal, render_scalar};

use crate::eval::Value;
use std::fmt;
use thiserror::Error;

/// Errors raised while type-checking an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// Operand types cannot be combined
    #[error("cannot apply `{op}` to {lhs} and {rhs}")]
    Operands {
        /// Operator or function name
        op: &'static str,
        /// Left operand type
        lhs: Ty,
        /// Right operand type
        rhs: Ty,
    },

    /// A builtin was called with the wrong argument types
    #[error("invalid arguments for `{function}`: ({args})")]
    Arguments {
        /// Builtin name
        function: &'static str,
        /// Rendered argument type list
        args: String,
    },

    /// A swizzle selects components the base value does not have
    #[error("invalid swizzle `.{components}` on {base}")]
    Swizzle {
        /// Requested components
        components: String,
        /// Base type
        base: Ty,
    },

    /// Vector construction with the wrong number of components
    #[error("{ty} constructor needs {expected} components, got {actual}")]
    Construct {
        /// Constructed type
        ty: Ty,
        /// Components required
        expected: usize,
        /// Components supplied
        actual: usize,
    },

    /// A raw template references a slot with no binding
    #[error("raw expression references unbound slot `{{{0}}}`")]
    UnboundSlot(String),

    /// The seed of `random` must be a scalar
    #[error("random seed must be float, got {0}")]
    Seed(Ty),
}

/// Shading-language value type of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
}

impl Ty {
    /// Number of scalar components
    #[inline]
    pub fn components(self) -> usize {
        match self {
            Ty::Float => 1,
            Ty::Vec2 => 2,
            Ty::Vec3 => 3,
            Ty::Vec4 => 4,
        }
    }

    /// Type with the given number of components
    pub fn from_components(n: usize) -> Option<Ty> {
        match n {
            1 => Some(Ty::Float),
            2 => Some(Ty::Vec2),
            3 => Some(Ty::Vec3),
            4 => Some(Ty::Vec4),
            _ => None,
        }
    }

    /// GLSL type name
    pub fn glsl_name(self) -> &'static str {
        match self {
            Ty::Float => "float",
            Ty::Vec2 => "vec2",
            Ty::Vec3 => "vec3",
            Ty::Vec4 => "vec4",
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl_name())
    }
}

/// Names bound by the generated program that expressions may read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    /// Query point (`p`), in shape-local coordinates inside shape functions
    Position,
    /// Surface normal (`n`), only meaningful inside material functions
    Normal,
    /// Incoming ray direction (`d`), only meaningful inside material functions
    Direction,
    /// Index of the enclosing repetition cell (`cell`), zero outside any repetition
    Cell,
    /// Elapsed time uniform
    Time,
    /// Screen coordinate varying in [-1, 1]
    Uv,
    /// Mouse position uniform
    Mouse,
}

impl Variable {
    /// Identifier in the generated program
    pub fn name(self) -> &'static str {
        match self {
            Variable::Position => "p",
            Variable::Normal => "n",
            Variable::Direction => "d",
            Variable::Cell => "cell",
            Variable::Time => "time",
            Variable::Uv => "uv",
            Variable::Mouse => "mouse",
        }
    }

    /// Value type
    pub fn ty(self) -> Ty {
        match self {
            Variable::Position | Variable::Normal | Variable::Direction | Variable::Cell => Ty::Vec3,
            Variable::Time => Ty::Float,
            Variable::Uv | Variable::Mouse => Ty::Vec2,
        }
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl BinaryOp {
    /// Operator token
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Builtin shading-language functions available to expressions
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Abs,
    Sin,
    Cos,
    Floor,
    Fract,
    Sqrt,
    Normalize,
    Length,
    Dot,
    Cross,
    Min,
    Max,
    Pow,
    Mix,
    Clamp,
    Smoothstep,
}

impl Builtin {
    /// GLSL function name
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Abs => "abs",
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Floor => "floor",
            Builtin::Fract => "fract",
            Builtin::Sqrt => "sqrt",
            Builtin::Normalize => "normalize",
            Builtin::Length => "length",
            Builtin::Dot => "dot",
            Builtin::Cross => "cross",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Pow => "pow",
            Builtin::Mix => "mix",
            Builtin::Clamp => "clamp",
            Builtin::Smoothstep => "smoothstep",
        }
    }

    /// Result type for the given argument types, following GLSL overloads
    pub fn result_ty(self, args: &[Ty]) -> Result<Ty, ExprError> {
        use Ty::Float;
        let result = match (self, args) {
            (
                Builtin::Abs
                | Builtin::Sin
                | Builtin::Cos
                | Builtin::Floor
                | Builtin::Fract
                | Builtin::Sqrt
                | Builtin::Normalize,
                [t],
            ) => Some(*t),
            (Builtin::Length, [_]) => Some(Float),
            (Builtin::Dot, [a, b]) if a == b => Some(Float),
            (Builtin::Cross, [Ty::Vec3, Ty::Vec3]) => Some(Ty::Vec3),
            (Builtin::Min | Builtin::Max, [a, b]) if a == b || *b == Float => Some(*a),
            (Builtin::Pow, [a, b]) if a == b => Some(*a),
            (Builtin::Mix, [a, b, t]) if a == b && (t == a || *t == Float) => Some(*a),
            (Builtin::Clamp, [x, lo, hi]) if lo == hi && (lo == x || *lo == Float) => Some(*x),
            (Builtin::Smoothstep, [e0, e1, x]) if e0 == e1 && (e0 == x || *e0 == Float) => {
                Some(*x)
            }
            _ => None,
        };
        result.ok_or_else(|| ExprError::Arguments {
            function: self.name(),
            args: args
                .iter()
                .map(|t| t.glsl_name())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// A value-producing expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal scalar or vector
    Constant(Value),
    /// Program-provided variable
    Variable(Variable),
    /// Pseudo-random `vec2` from screen position, time and a float seed
    Random(Box<Expression>),
    /// Unary minus
    Negate(Box<Expression>),
    /// Arithmetic composition
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expression>,
        /// Right operand
        rhs: Box<Expression>,
    },
    /// Builtin function call
    Call {
        /// Function
        function: Builtin,
        /// Arguments
        args: Vec<Expression>,
    },
    /// Component selection, e.g. `.x` or `.xz`
    Swizzle {
        /// Vector being selected from
        base: Box<Expression>,
        /// Components (`xyzw` or `rgba`)
        components: String,
    },
    /// Vector constructor, e.g. `vec3(a, b.xy)`
    Construct {
        /// Constructed type
        ty: Ty,
        /// Arguments; a single float broadcasts
        args: Vec<Expression>,
    },
    /// Raw snippet with `{name}` slots filled by rendered bindings
    Raw {
        /// Snippet text
        template: String,
        /// Named sub-expressions
        bindings: Vec<(String, Expression)>,
        /// Declared result type
        ty: Ty,
    },
}

/// Literal vector value: one component broadcasts to `vec3`, two to four
/// components produce `vec2`..`vec4`. Extra components are ignored; an empty
/// slice yields `vec3(0)`.
pub fn value(components: &[f32]) -> Expression {
    let value = match components {
        [] => Value::splat(Ty::Vec3, 0.0),
        [x] => Value::splat(Ty::Vec3, *x),
        [x, y] => Value::vec2(glam::Vec2::new(*x, *y)),
        [x, y, z] => Value::vec3(glam::Vec3::new(*x, *y, *z)),
        [x, y, z, w, ..] => Value::vec4(glam::Vec4::new(*x, *y, *z, *w)),
    };
    Expression::Constant(value)
}

/// Float literal
pub fn scalar(x: f32) -> Expression {
    Expression::Constant(Value::float(x))
}

/// Reproducible pseudo-random `vec2` keyed by screen position, time and `seed`
pub fn random(seed: impl Into<Expression>) -> Expression {
    Expression::Random(Box::new(seed.into()))
}

/// Raw snippet typed as `vec3`, the common case for procedural variation
pub fn raw(template: impl Into<String>, bindings: Vec<(&str, Expression)>) -> Expression {
    Expression::raw(template, bindings, Ty::Vec3)
}

impl Expression {
    /// Raw snippet with explicit result type
    pub fn raw(template: impl Into<String>, bindings: Vec<(&str, Expression)>, ty: Ty) -> Self {
        Expression::Raw {
            template: template.into(),
            bindings: bindings
                .into_iter()
                .map(|(name, e)| (name.to_string(), e))
                .collect(),
            ty,
        }
    }

    /// Query point `p`
    pub fn position() -> Self {
        Expression::Variable(Variable::Position)
    }

    /// Surface normal `n`
    pub fn normal() -> Self {
        Expression::Variable(Variable::Normal)
    }

    /// Incoming direction `d`
    pub fn direction() -> Self {
        Expression::Variable(Variable::Direction)
    }

    /// Enclosing repetition cell index
    pub fn cell() -> Self {
        Expression::Variable(Variable::Cell)
    }

    /// Elapsed time
    pub fn time() -> Self {
        Expression::Variable(Variable::Time)
    }

    /// Screen coordinate
    pub fn uv() -> Self {
        Expression::Variable(Variable::Uv)
    }

    /// Mouse position
    pub fn mouse() -> Self {
        Expression::Variable(Variable::Mouse)
    }

    /// Random `vec2` seeded by the enclosing repetition cell
    pub fn random_cell() -> Self {
        random(Expression::cell().dot(value(&[1.0, 57.0, 113.0])))
    }

    /// Builtin call
    pub fn call(function: Builtin, args: Vec<Expression>) -> Self {
        Expression::Call { function, args }
    }

    /// Vector constructor
    pub fn construct(ty: Ty, args: Vec<Expression>) -> Self {
        Expression::Construct { ty, args }
    }

    /// Component selection
    pub fn swizzle(&self, components: &str) -> Self {
        Expression::Swizzle {
            base: Box::new(self.clone()),
            components: components.to_string(),
        }
    }

    /// First component
    pub fn x(&self) -> Self {
        self.swizzle("x")
    }

    /// Second component
    pub fn y(&self) -> Self {
        self.swizzle("y")
    }

    /// Third component
    pub fn z(&self) -> Self {
        self.swizzle("z")
    }

    /// `dot(self, other)`
    pub fn dot(&self, other: impl Into<Expression>) -> Self {
        Expression::call(Builtin::Dot, vec![self.clone(), other.into()])
    }

    /// `length(self)`
    pub fn length(&self) -> Self {
        Expression::call(Builtin::Length, vec![self.clone()])
    }

    /// `normalize(self)`
    pub fn normalize(&self) -> Self {
        Expression::call(Builtin::Normalize, vec![self.clone()])
    }

    /// `abs(self)`
    pub fn abs(&self) -> Self {
        Expression::call(Builtin::Abs, vec![self.clone()])
    }

    /// `min(self, other)`
    pub fn min(&self, other: impl Into<Expression>) -> Self {
        Expression::call(Builtin::Min, vec![self.clone(), other.into()])
    }

    /// `max(self, other)`
    pub fn max(&self, other: impl Into<Expression>) -> Self {
        Expression::call(Builtin::Max, vec![self.clone(), other.into()])
    }

    /// `sin(self)`
    pub fn sin(&self) -> Self {
        Expression::call(Builtin::Sin, vec![self.clone()])
    }

    /// `cos(self)`
    pub fn cos(&self) -> Self {
        Expression::call(Builtin::Cos, vec![self.clone()])
    }

    /// `smoothstep(edge0, edge1, self)`
    pub fn smoothstep(&self, edge0: impl Into<Expression>, edge1: impl Into<Expression>) -> Self {
        Expression::call(
            Builtin::Smoothstep,
            vec![edge0.into(), edge1.into(), self.clone()],
        )
    }

    /// Infer and check the type of this expression
    pub fn ty(&self) -> Result<Ty, ExprError> {
        match self {
            Expression::Constant(v) => Ok(v.ty()),
            Expression::Variable(v) => Ok(v.ty()),
            Expression::Random(seed) => match seed.ty()? {
                Ty::Float => Ok(Ty::Vec2),
                other => Err(ExprError::Seed(other)),
            },
            Expression::Negate(inner) => inner.ty(),
            Expression::Binary { op, lhs, rhs } => {
                let (a, b) = (lhs.ty()?, rhs.ty()?);
                match (a, b) {
                    _ if a == b => Ok(a),
                    (Ty::Float, t) | (t, Ty::Float) => Ok(t),
                    _ => Err(ExprError::Operands {
                        op: op.symbol(),
                        lhs: a,
                        rhs: b,
                    }),
                }
            }
            Expression::Call { function, args } => {
                let tys = args.iter().map(Expression::ty).collect::<Result<Vec<_>, _>>()?;
                function.result_ty(&tys)
            }
            Expression::Swizzle { base, components } => {
                let base_ty = base.ty()?;
                let err = || ExprError::Swizzle {
                    components: components.clone(),
                    base: base_ty,
                };
                let indices = swizzle_indices(components).ok_or_else(err)?;
                if base_ty == Ty::Float || indices.iter().any(|&i| i >= base_ty.components()) {
                    return Err(err());
                }
                Ty::from_components(indices.len()).ok_or_else(err)
            }
            Expression::Construct { ty, args } => {
                let tys = args.iter().map(Expression::ty).collect::<Result<Vec<_>, _>>()?;
                let actual: usize = tys.iter().map(|t| t.components()).sum();
                if actual == ty.components() || (tys.len() == 1 && tys[0] == Ty::Float) {
                    Ok(*ty)
                } else {
                    Err(ExprError::Construct {
                        ty: *ty,
                        expected: ty.components(),
                        actual,
                    })
                }
            }
            Expression::Raw {
                template,
                bindings,
                ty,
            } => {
                for (_, bound) in bindings {
                    bound.ty()?;
                }
                for slot in template_slots(template) {
                    if !bindings.iter().any(|(name, _)| name == slot) {
                        return Err(ExprError::UnboundSlot(slot.to_string()));
                    }
                }
                Ok(*ty)
            }
        }
    }

    /// True if the expression contains a raw snippet anywhere
    pub fn is_opaque(&self) -> bool {
        match self {
            Expression::Raw { .. } => true,
            Expression::Constant(_) | Expression::Variable(_) => false,
            Expression::Random(e) | Expression::Negate(e) => e.is_opaque(),
            Expression::Swizzle { base, .. } => base.is_opaque(),
            Expression::Binary { lhs, rhs, .. } => lhs.is_opaque() || rhs.is_opaque(),
            Expression::Call { args, .. } | Expression::Construct { args, .. } => {
                args.iter().any(Expression::is_opaque)
            }
        }
    }

    /// True if the expression reads `variable` outside raw snippets
    pub fn reads(&self, variable: Variable) -> bool {
        match self {
            Expression::Variable(v) => *v == variable,
            Expression::Constant(_) => false,
            Expression::Random(e) | Expression::Negate(e) => e.reads(variable),
            Expression::Swizzle { base, .. } => base.reads(variable),
            Expression::Binary { lhs, rhs, .. } => lhs.reads(variable) || rhs.reads(variable),
            Expression::Call { args, .. } | Expression::Construct { args, .. } => {
                args.iter().any(|a| a.reads(variable))
            }
            Expression::Raw { bindings, .. } => bindings.iter().any(|(_, b)| b.reads(variable)),
        }
    }
}

/// Map swizzle letters to component indices
pub(crate) fn swizzle_indices(components: &str) -> Option<Vec<usize>> {
    if components.is_empty() || components.len() > 4 {
        return None;
    }
    components
        .chars()
        .map(|c| match c {
            'x' | 'r' => Some(0),
            'y' | 'g' => Some(1),
            'z' | 'b' => Some(2),
            'w' | 'a' => Some(3),
            _ => None,
        })
        .collect()
}

/// Slot names (`{name}`) referenced by a raw template, in order of appearance
pub(crate) fn template_slots(template: &str) -> Vec<&str> {
    let mut slots = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    slots.push(name);
                }
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    slots
}

impl From<f32> for Expression {
    fn from(x: f32) -> Self {
        scalar(x)
    }
}

impl From<i32> for Expression {
    fn from(x: i32) -> Self {
        scalar(x as f32)
    }
}

impl From<glam::Vec2> for Expression {
    fn from(v: glam::Vec2) -> Self {
        Expression::Constant(Value::vec2(v))
    }
}

impl From<glam::Vec3> for Expression {
    fn from(v: glam::Vec3) -> Self {
        Expression::Constant(Value::vec3(v))
    }
}

impl From<&Expression> for Expression {
    fn from(e: &Expression) -> Self {
        e.clone()
    }
}
