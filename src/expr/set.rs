//! Membership tests (IN / NOT IN).

use crate::error::Result;
use crate::expr::{Expr, IntoExpr, Predicate, check_comparable};

fn membership<I>(expr: impl IntoExpr, values: I, negated: bool) -> Result<Predicate>
where
    I: IntoIterator,
    I::Item: IntoExpr,
{
    let expr: Expr = expr.into_expr();
    let values: Vec<Expr> = values.into_iter().map(IntoExpr::into_expr).collect();
    for value in &values {
        check_comparable(&expr, value)?;
    }
    Ok(Predicate::InList {
        expr,
        values,
        negated,
    })
}

/// `expr IN (v1, v2, ...)`. An empty value set matches no row.
pub fn in_list<I>(expr: impl IntoExpr, values: I) -> Result<Predicate>
where
    I: IntoIterator,
    I::Item: IntoExpr,
{
    membership(expr, values, false)
}

/// `expr NOT IN (v1, v2, ...)`. An empty value set matches every row.
pub fn not_in_list<I>(expr: impl IntoExpr, values: I) -> Result<Predicate>
where
    I: IntoIterator,
    I::Item: IntoExpr,
{
    membership(expr, values, true)
}
