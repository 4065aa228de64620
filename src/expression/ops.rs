//! Arithmetic operator impls for expressions

use super::{BinaryOp, Expression};
use std::ops::{Add, Div, Mul, Neg, Sub};

fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
    Expression::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

macro_rules! impl_binary {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<Expression>> $trait<R> for Expression {
            type Output = Expression;

            fn $method(self, rhs: R) -> Expression {
                binary($op, self, rhs.into())
            }
        }

        impl<R: Into<Expression>> $trait<R> for &Expression {
            type Output = Expression;

            fn $method(self, rhs: R) -> Expression {
                binary($op, self.clone(), rhs.into())
            }
        }

        impl $trait<Expression> for f32 {
            type Output = Expression;

            fn $method(self, rhs: Expression) -> Expression {
                binary($op, self.into(), rhs)
            }
        }
    };
}

impl_binary!(Add, add, BinaryOp::Add);
impl_binary!(Sub, sub, BinaryOp::Sub);
impl_binary!(Mul, mul, BinaryOp::Mul);
impl_binary!(Div, div, BinaryOp::Div);

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::Negate(Box::new(self))
    }
}

impl Neg for &Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::Negate(Box::new(self.clone()))
    }
}
