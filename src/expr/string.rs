//! Pattern-match predicates and string expressions.
//!
//! The pattern text becomes a bind parameter at translation time; the anchor
//! decides where wildcards are added around it, so `contains("mem")` binds
//! `%mem%` rather than inlining anything into the statement.

use compact_str::ToCompactString;

use crate::error::Result;
use crate::expr::{Expr, FuncKind, IntoExpr, PatternAnchor, Predicate, check_text};

fn pattern(
    expr: impl IntoExpr,
    pattern: impl AsRef<str>,
    anchor: PatternAnchor,
) -> Result<Predicate> {
    let expr: Expr = expr.into_expr();
    check_text(&expr)?;
    Ok(Predicate::Like {
        expr,
        pattern: pattern.as_ref().to_compact_string(),
        anchor,
    })
}

/// `expr LIKE pattern` with the caller's own wildcards.
pub fn like(expr: impl IntoExpr, like_pattern: impl AsRef<str>) -> Result<Predicate> {
    pattern(expr, like_pattern, PatternAnchor::Exact)
}

/// Substring match: binds `%needle%`.
pub fn contains(expr: impl IntoExpr, needle: impl AsRef<str>) -> Result<Predicate> {
    pattern(expr, needle, PatternAnchor::Contains)
}

/// Prefix match: binds `needle%`.
pub fn starts_with(expr: impl IntoExpr, needle: impl AsRef<str>) -> Result<Predicate> {
    pattern(expr, needle, PatternAnchor::StartsWith)
}

/// Suffix match: binds `%needle`.
pub fn ends_with(expr: impl IntoExpr, needle: impl AsRef<str>) -> Result<Predicate> {
    pattern(expr, needle, PatternAnchor::EndsWith)
}

fn unary_func(kind: FuncKind, arg: impl IntoExpr) -> Result<Expr> {
    let arg = arg.into_expr();
    check_text(&arg)?;
    Ok(Expr::Func {
        kind,
        args: vec![arg],
    })
}

/// `UPPER(expr)`
pub fn upper(expr: impl IntoExpr) -> Result<Expr> {
    unary_func(FuncKind::Upper, expr)
}

/// `LOWER(expr)`
pub fn lower(expr: impl IntoExpr) -> Result<Expr> {
    unary_func(FuncKind::Lower, expr)
}

/// String concatenation of two or more text expressions.
pub fn concat<I>(parts: I) -> Result<Expr>
where
    I: IntoIterator,
    I::Item: IntoExpr,
{
    let args: Vec<Expr> = parts.into_iter().map(IntoExpr::into_expr).collect();
    for arg in &args {
        check_text(arg)?;
    }
    Ok(Expr::Func {
        kind: FuncKind::Concat,
        args,
    })
}
