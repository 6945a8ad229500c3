//! ORDER BY specifications with explicit null placement.

use crate::expr::{Expr, IntoExpr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub(crate) const fn sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Where NULLs sort relative to non-NULL values.
///
/// `Default` emits no clause and leaves the placement to the target's own
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPlacement {
    #[default]
    Default,
    First,
    Last,
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    pub expr: Expr,
    pub direction: Direction,
    pub nulls: NullPlacement,
}

impl OrderSpec {
    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullPlacement::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullPlacement::Last;
        self
    }
}

/// Ascending order over `expr`.
pub fn asc(expr: impl IntoExpr) -> OrderSpec {
    OrderSpec {
        expr: expr.into_expr(),
        direction: Direction::Asc,
        nulls: NullPlacement::Default,
    }
}

/// Descending order over `expr`.
pub fn desc(expr: impl IntoExpr) -> OrderSpec {
    OrderSpec {
        expr: expr.into_expr(),
        direction: Direction::Desc,
        nulls: NullPlacement::Default,
    }
}
