//! NULL tests.

use crate::error::Result;
use crate::expr::{Expr, IntoExpr, Predicate, check_scalar};

fn null_check(expr: impl IntoExpr, negated: bool) -> Result<Predicate> {
    let expr: Expr = expr.into_expr();
    check_scalar(&expr)?;
    Ok(Predicate::IsNull { expr, negated })
}

/// `expr IS NULL`
pub fn is_null(expr: impl IntoExpr) -> Result<Predicate> {
    null_check(expr, false)
}

/// `expr IS NOT NULL`
pub fn is_not_null(expr: impl IntoExpr) -> Result<Predicate> {
    null_check(expr, true)
}
