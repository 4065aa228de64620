//! CPU interpretation of expressions

use super::{random, EvalContext, EvalError, Value};
use crate::expression::{swizzle_indices, BinaryOp, Builtin, Expression, Ty, Variable};
use crate::shapes::primitives::fract;

impl Expression {
    /// Evaluate with the program variables in `ctx`
    pub fn eval(&self, ctx: &EvalContext) -> Result<Value, EvalError> {
        match self {
            Expression::Constant(v) => Ok(*v),
            Expression::Variable(v) => Ok(variable(*v, ctx)),
            Expression::Random(seed) => {
                let seed = seed.eval(ctx)?;
                if seed.ty() != Ty::Float {
                    return Err(EvalError::Type(format!("random seed must be float, got {}", seed.ty())));
                }
                Ok(Value::vec2(random(ctx.uv, ctx.time, seed.x())))
            }
            Expression::Negate(inner) => Ok(inner.eval(ctx)?.map(|x| -x)),
            Expression::Binary { op, lhs, rhs } => {
                let f: fn(f32, f32) -> f32 = match op {
                    BinaryOp::Add => |a, b| a + b,
                    BinaryOp::Sub => |a, b| a - b,
                    BinaryOp::Mul => |a, b| a * b,
                    BinaryOp::Div => |a, b| a / b,
                };
                lhs.eval(ctx)?.zip(rhs.eval(ctx)?, op.symbol(), f)
            }
            Expression::Call { function, args } => {
                let values = args.iter().map(|a| a.eval(ctx)).collect::<Result<Vec<_>, _>>()?;
                call(*function, &values)
            }
            Expression::Swizzle { base, components } => {
                let base = base.eval(ctx)?;
                let err = || EvalError::Type(format!("invalid swizzle `.{}` on {}", components, base.ty()));
                let indices = swizzle_indices(components).ok_or_else(err)?;
                let available = base.components();
                if base.ty() == Ty::Float || indices.iter().any(|&i| i >= available.len()) {
                    return Err(err());
                }
                let picked: Vec<f32> = indices.iter().map(|&i| available[i]).collect();
                Value::from_components(&picked).ok_or_else(err)
            }
            Expression::Construct { ty, args } => {
                let values = args.iter().map(|a| a.eval(ctx)).collect::<Result<Vec<_>, _>>()?;
                if let [single] = values.as_slice() {
                    if single.ty() == Ty::Float {
                        return Ok(Value::splat(*ty, single.x()));
                    }
                }
                let flat: Vec<f32> = values.iter().flat_map(|v| v.components().to_vec()).collect();
                if flat.len() != ty.components() {
                    return Err(EvalError::Type(format!(
                        "{} constructor needs {} components, got {}",
                        ty,
                        ty.components(),
                        flat.len()
                    )));
                }
                Value::from_components(&flat)
                    .ok_or_else(|| EvalError::Type(format!("cannot construct {}", ty)))
            }
            Expression::Raw { .. } => Err(EvalError::Opaque),
        }
    }
}

fn variable(v: Variable, ctx: &EvalContext) -> Value {
    match v {
        Variable::Position => Value::vec3(ctx.position),
        Variable::Normal => Value::vec3(ctx.normal),
        Variable::Direction => Value::vec3(ctx.direction),
        Variable::Cell => Value::vec3(ctx.cell),
        Variable::Time => Value::float(ctx.time),
        Variable::Uv => Value::vec2(ctx.uv),
        Variable::Mouse => Value::vec2(ctx.mouse),
    }
}

fn call(function: Builtin, args: &[Value]) -> Result<Value, EvalError> {
    let name = function.name();
    Ok(match (function, args) {
        (Builtin::Abs, [x]) => x.map(f32::abs),
        (Builtin::Sin, [x]) => x.map(f32::sin),
        (Builtin::Cos, [x]) => x.map(f32::cos),
        (Builtin::Floor, [x]) => x.map(f32::floor),
        (Builtin::Fract, [x]) => x.map(fract),
        (Builtin::Sqrt, [x]) => x.map(f32::sqrt),
        (Builtin::Normalize, [x]) => {
            let length = x.length();
            if length > 0.0 {
                x.map(|c| c / length)
            } else {
                *x
            }
        }
        (Builtin::Length, [x]) => Value::float(x.length()),
        (Builtin::Dot, [a, b]) => Value::float(a.dot(b)?),
        (Builtin::Cross, [a, b]) if a.ty() == Ty::Vec3 && b.ty() == Ty::Vec3 => {
            Value::vec3(a.to_vec3().cross(b.to_vec3()))
        }
        (Builtin::Min, [a, b]) => a.zip(*b, name, f32::min)?,
        (Builtin::Max, [a, b]) => a.zip(*b, name, f32::max)?,
        (Builtin::Pow, [a, b]) => a.zip(*b, name, f32::powf)?,
        (Builtin::Mix, [a, b, t]) => {
            let delta = b.zip(*a, name, |b, a| b - a)?;
            let scaled = delta.zip(*t, name, |d, t| d * t)?;
            a.zip(scaled, name, |a, s| a + s)?
        }
        (Builtin::Clamp, [x, lo, hi]) => x.zip(*lo, name, f32::max)?.zip(*hi, name, f32::min)?,
        (Builtin::Smoothstep, [e0, e1, x]) => {
            let num = x.zip(*e0, name, |x, e| x - e)?;
            let den = e1.zip(*e0, name, |a, b| a - b)?;
            let t = num.zip(den, name, |n, d| (n / d).max(0.0).min(1.0))?;
            t.map(|t| t * t * (3.0 - 2.0 * t))
        }
        _ => {
            let tys: Vec<&str> = args.iter().map(|v| v.ty().glsl_name()).collect();
            return Err(EvalError::Type(format!("invalid arguments for `{}`: ({})", name, tys.join(", "))));
        }
    })
}
