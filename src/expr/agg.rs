//! Aggregate expressions.
//!
//! Result-type rules: `count` is always INT; `sum`/`min`/`max` keep their
//! operand's family; `avg` is FLOAT regardless of the operand's
//! integer-ness. Aggregates may appear in select lists, HAVING, and ORDER
//! BY; the query builder rejects them inside WHERE.

use crate::error::Result;
use crate::expr::{AggregateKind, Expr, IntoExpr, check_numeric, check_scalar};

/// `COUNT(*)`, the zero-arity row count.
pub fn count_all() -> Expr {
    Expr::Aggregate {
        kind: AggregateKind::Count,
        operand: None,
    }
}

/// `COUNT(expr)`. Counting an entity path counts by its primary key.
pub fn count(expr: impl IntoExpr) -> Expr {
    Expr::Aggregate {
        kind: AggregateKind::Count,
        operand: Some(Box::new(expr.into_expr())),
    }
}

/// `SUM(expr)` over a numeric operand; the result keeps the operand's family.
pub fn sum(expr: impl IntoExpr) -> Result<Expr> {
    numeric_agg(AggregateKind::Sum, expr)
}

/// `AVG(expr)` over a numeric operand; the result is always FLOAT.
pub fn avg(expr: impl IntoExpr) -> Result<Expr> {
    numeric_agg(AggregateKind::Avg, expr)
}

/// `MIN(expr)` over any scalar operand.
pub fn min(expr: impl IntoExpr) -> Result<Expr> {
    ordered_agg(AggregateKind::Min, expr)
}

/// `MAX(expr)` over any scalar operand.
pub fn max(expr: impl IntoExpr) -> Result<Expr> {
    ordered_agg(AggregateKind::Max, expr)
}

fn numeric_agg(kind: AggregateKind, expr: impl IntoExpr) -> Result<Expr> {
    let operand = expr.into_expr();
    check_numeric(&operand)?;
    Ok(Expr::Aggregate {
        kind,
        operand: Some(Box::new(operand)),
    })
}

fn ordered_agg(kind: AggregateKind, expr: impl IntoExpr) -> Result<Expr> {
    let operand = expr.into_expr();
    check_scalar(&operand)?;
    Ok(Expr::Aggregate {
        kind,
        operand: Some(Box::new(operand)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::value::{DeclaredType, ScalarType};

    #[test]
    fn result_type_rules() {
        assert_eq!(
            count_all().declared_type(),
            Some(DeclaredType::Scalar(ScalarType::Int))
        );
        assert_eq!(
            sum(10).unwrap().declared_type(),
            Some(DeclaredType::Scalar(ScalarType::Int))
        );
        // avg is FLOAT even over an integer operand
        assert_eq!(
            avg(10).unwrap().declared_type(),
            Some(DeclaredType::Scalar(ScalarType::Float))
        );
        assert_eq!(
            max(2.5).unwrap().declared_type(),
            Some(DeclaredType::Scalar(ScalarType::Float))
        );
    }

    #[test]
    fn sum_and_avg_require_numeric_operands() {
        assert!(matches!(sum("name"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(avg(true), Err(Error::TypeMismatch { .. })));
        assert!(min("name").is_ok());
    }
}
