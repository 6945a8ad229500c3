//! Arithmetic composition over numeric expressions.

use crate::error::Result;
use crate::expr::{ArithOp, Expr, IntoExpr, check_numeric};

fn arith(op: ArithOp, lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Expr> {
    let lhs = lhs.into_expr();
    let rhs = rhs.into_expr();
    check_numeric(&lhs)?;
    check_numeric(&rhs)?;
    Ok(Expr::Arith {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

/// `lhs + rhs`
pub fn add(lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Expr> {
    arith(ArithOp::Add, lhs, rhs)
}

/// `lhs - rhs`
pub fn sub(lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Expr> {
    arith(ArithOp::Sub, lhs, rhs)
}

/// `lhs * rhs`
pub fn mul(lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Expr> {
    arith(ArithOp::Mul, lhs, rhs)
}

/// `lhs / rhs`
pub fn div(lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Expr> {
    arith(ArithOp::Div, lhs, rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::value::{DeclaredType, ScalarType};

    #[test]
    fn arithmetic_rejects_non_numeric_operands() {
        assert!(add(1, 2).is_ok());
        assert!(matches!(mul("a", 2), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn float_operand_widens_the_result() {
        let int_sum = add(1, 2).unwrap();
        assert_eq!(
            int_sum.declared_type(),
            Some(DeclaredType::Scalar(ScalarType::Int))
        );
        let float_sum = add(1, 2.5).unwrap();
        assert_eq!(
            float_sum.declared_type(),
            Some(DeclaredType::Scalar(ScalarType::Float))
        );
    }
}
