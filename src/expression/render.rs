//! GLSL rendering of expressions

use super::{Expression, Ty};
use crate::eval::Value;
use std::fmt;

/// Format a float as a GLSL literal (always with a decimal point or exponent)
pub fn float_literal(x: f32) -> String {
    if x.is_nan() {
        return "0.0".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "1e30" } else { "-1e30" }.to_string();
    }
    let mut s = x.to_string();
    if !s.contains(['.', 'e', 'E']) {
        s.push_str(".0");
    }
    s
}

/// Render an expression read through a scalar slot: floats as-is, vectors by
/// their first component.
pub fn render_scalar(expression: &Expression) -> String {
    match expression.ty() {
        Ok(Ty::Float) => expression.to_string(),
        _ => format!("{}.x", expression),
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    let components = value.components();
    if value.ty() == Ty::Float {
        return f.write_str(&float_literal(components[0]));
    }
    write!(f, "{}(", value.ty())?;
    if components.iter().all(|&c| c == components[0]) {
        f.write_str(&float_literal(components[0]))?;
    } else {
        for (i, c) in components.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&float_literal(*c))?;
        }
    }
    f.write_str(")")
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expression]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(v) => write_value(f, v),
            Expression::Variable(v) => f.write_str(v.name()),
            Expression::Random(seed) => write!(f, "random({})", seed),
            Expression::Negate(e) => write!(f, "(-{})", e),
            Expression::Binary { op, lhs, rhs } => {
                write!(f, "({} {} {})", lhs, op.symbol(), rhs)
            }
            Expression::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expression::Swizzle { base, components } => write!(f, "{}.{}", base, components),
            Expression::Construct { ty, args } => {
                write!(f, "{}(", ty)?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expression::Raw {
                template,
                bindings,
                ty,
            } => {
                let mut text = template.clone();
                for (name, bound) in bindings {
                    text = text.replace(&format!("{{{}}}", name), &format!("({})", bound));
                }
                write!(f, "{}({})", ty, text)
            }
        }
    }
}
