//! Comparison predicates and ranges.
//!
//! All constructors type-check at construction time: building an
//! incompatible comparison never reaches the translator, let alone the
//! backend.

use crate::error::{Error, Result};
use crate::expr::{CmpOp, IntoExpr, Predicate, check_comparable};

fn binary(op: CmpOp, lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Predicate> {
    let lhs = lhs.into_expr();
    let rhs = rhs.into_expr();
    check_comparable(&lhs, &rhs)?;
    Ok(Predicate::Cmp { op, lhs, rhs })
}

/// `lhs = rhs`
pub fn eq(lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Predicate> {
    binary(CmpOp::Eq, lhs, rhs)
}

/// `lhs <> rhs`
pub fn ne(lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Predicate> {
    binary(CmpOp::Ne, lhs, rhs)
}

/// `lhs > rhs`
pub fn gt(lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Predicate> {
    binary(CmpOp::Gt, lhs, rhs)
}

/// `lhs >= rhs`
pub fn ge(lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Predicate> {
    binary(CmpOp::Ge, lhs, rhs)
}

/// `lhs < rhs`
pub fn lt(lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Predicate> {
    binary(CmpOp::Lt, lhs, rhs)
}

/// `lhs <= rhs`
pub fn le(lhs: impl IntoExpr, rhs: impl IntoExpr) -> Result<Predicate> {
    binary(CmpOp::Le, lhs, rhs)
}

/// `expr BETWEEN lo AND hi`, both bounds inclusive (the conventional
/// relational default). Use [`between_bounds`] for open bounds.
pub fn between(expr: impl IntoExpr, lo: impl IntoExpr, hi: impl IntoExpr) -> Result<Predicate> {
    between_bounds(expr, lo, hi, true, true)
}

/// Range test with explicit bound inclusivity.
pub fn between_bounds(
    expr: impl IntoExpr,
    lo: impl IntoExpr,
    hi: impl IntoExpr,
    inclusive_lo: bool,
    inclusive_hi: bool,
) -> Result<Predicate> {
    let expr = expr.into_expr();
    let lo = lo.into_expr();
    let hi = hi.into_expr();
    check_comparable(&expr, &lo)
        .and_then(|()| check_comparable(&expr, &hi))
        .map_err(|_| Error::InvalidRange(expr.describe()))?;
    Ok(Predicate::Between {
        expr,
        lo,
        hi,
        inclusive_lo,
        inclusive_hi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn incompatible_operands_are_rejected() {
        assert!(eq(10, 20).is_ok());
        assert!(eq(10, 2.5).is_ok());
        assert!(matches!(eq(10, "ten"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(gt(true, 1), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn null_literal_compares_with_anything() {
        assert!(eq("name", Value::Null).is_ok());
        assert!(eq(Value::Null, 3).is_ok());
    }

    #[test]
    fn between_requires_comparable_bounds() {
        assert!(between(15, 10, 30).is_ok());
        assert!(matches!(
            between(15, "a", 30),
            Err(Error::InvalidRange(_))
        ));
    }
}
