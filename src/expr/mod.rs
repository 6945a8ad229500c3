//! Expression and predicate variant families.
//!
//! Both families are closed enums: the translator matches them exhaustively,
//! so adding a variant is a compile-time-checked exercise. Constructors live
//! in the submodules ([`cmp`], [`logical`], [`set`], [`string`], [`null`],
//! [`math`], [`agg`]) and type-check their operands before a node exists;
//! nothing here mutates an existing node.

pub mod agg;
pub mod cmp;
pub mod logical;
pub mod math;
pub mod null;
pub mod set;
pub mod string;

pub use agg::{avg, count, count_all, max, min, sum};
pub use cmp::{between, between_bounds, eq, ge, gt, le, lt, ne};
pub use logical::{and, and2, not, or, or2};
pub use math::{add, div, mul, sub};
pub use null::{is_not_null, is_null};
pub use set::{in_list, not_in_list};
pub use string::{concat, contains, ends_with, like, lower, starts_with, upper};

use compact_str::CompactString;

use crate::error::{Error, Result};
use crate::path::Path;
use crate::value::{DeclaredType, ScalarType, Value};

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub(crate) const fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

/// Scalar functions with a rendering rule per dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
    Upper,
    Lower,
    Concat,
}

/// Aggregate kinds. `Count` with no operand is the zero-arity row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateKind {
    pub(crate) const fn sql_name(self) -> &'static str {
        match self {
            AggregateKind::Count => "COUNT",
            AggregateKind::Sum => "SUM",
            AggregateKind::Avg => "AVG",
            AggregateKind::Min => "MIN",
            AggregateKind::Max => "MAX",
        }
    }
}

/// A typed value-producing node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(Path),
    Literal(Value),
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Func {
        kind: FuncKind,
        args: Vec<Expr>,
    },
    Aggregate {
        kind: AggregateKind,
        operand: Option<Box<Expr>>,
    },
}

impl Expr {
    /// The type this expression produces.
    ///
    /// `None` only for the NULL literal, which is compatible with every
    /// scalar family.
    pub fn declared_type(&self) -> Option<DeclaredType> {
        match self {
            Expr::Path(path) => Some(path.declared_type()),
            Expr::Literal(value) => value.scalar_type().map(DeclaredType::Scalar),
            Expr::Arith { lhs, rhs, .. } => {
                let float = is_float(lhs) || is_float(rhs);
                Some(DeclaredType::Scalar(if float {
                    ScalarType::Float
                } else {
                    ScalarType::Int
                }))
            }
            Expr::Func { .. } => Some(DeclaredType::Scalar(ScalarType::Text)),
            Expr::Aggregate { kind, operand } => Some(DeclaredType::Scalar(match kind {
                AggregateKind::Count => ScalarType::Int,
                AggregateKind::Avg => ScalarType::Float,
                AggregateKind::Sum | AggregateKind::Min | AggregateKind::Max => operand
                    .as_deref()
                    .and_then(Expr::declared_type)
                    .and_then(|ty| ty.as_scalar())
                    .unwrap_or(ScalarType::Int),
            })),
        }
    }

    /// Whether this node is an aggregate at its top level.
    pub const fn is_aggregate(&self) -> bool {
        matches!(self, Expr::Aggregate { .. })
    }

    /// Whether an aggregate occurs anywhere inside this expression.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Path(_) | Expr::Literal(_) => false,
            Expr::Arith { lhs, rhs, .. } => lhs.contains_aggregate() || rhs.contains_aggregate(),
            Expr::Func { args, .. } => args.iter().any(Expr::contains_aggregate),
            Expr::Aggregate { .. } => true,
        }
    }

    /// Short human rendering for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Expr::Path(path) => path.to_string(),
            Expr::Literal(value) => value.to_string(),
            Expr::Arith { op, lhs, rhs } => {
                format!("({} {} {})", lhs.describe(), op.symbol(), rhs.describe())
            }
            Expr::Func { kind, args } => {
                let args: Vec<_> = args.iter().map(Expr::describe).collect();
                format!("{kind:?}({})", args.join(", "))
            }
            Expr::Aggregate { kind, operand } => match operand {
                Some(operand) => format!("{}({})", kind.sql_name(), operand.describe()),
                None => format!("{}(*)", kind.sql_name()),
            },
        }
    }
}

impl From<Path> for Expr {
    fn from(path: Path) -> Self {
        Expr::Path(path)
    }
}

impl From<&Path> for Expr {
    fn from(path: &Path) -> Self {
        Expr::Path(path.clone())
    }
}

/// Conversion into an [`Expr`], implemented for paths, expressions, and
/// literal values. This is what lets `eq(&age, 10)` read naturally.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Expr {
        self.clone()
    }
}

impl IntoExpr for Path {
    fn into_expr(self) -> Expr {
        Expr::Path(self)
    }
}

impl IntoExpr for &Path {
    fn into_expr(self) -> Expr {
        Expr::Path(self.clone())
    }
}

macro_rules! impl_into_expr_for_literals {
    ($($ty:ty),* $(,)?) => { $(
        impl IntoExpr for $ty {
            fn into_expr(self) -> Expr {
                Expr::Literal(self.into())
            }
        }
    )* }
}

impl_into_expr_for_literals!(Value, bool, i32, i64, f64, &str, String, CompactString);

fn is_float(expr: &Expr) -> bool {
    matches!(
        expr.declared_type(),
        Some(DeclaredType::Scalar(ScalarType::Float))
    )
}

fn is_null_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(Value::Null))
}

/// Rejects operand pairs whose declared types are not mutually comparable.
pub(crate) fn check_comparable(lhs: &Expr, rhs: &Expr) -> Result<()> {
    if is_null_literal(lhs) || is_null_literal(rhs) {
        return Ok(());
    }
    match (lhs.declared_type(), rhs.declared_type()) {
        (Some(DeclaredType::Scalar(a)), Some(DeclaredType::Scalar(b))) if a.comparable_with(b) => {
            Ok(())
        }
        _ => Err(Error::TypeMismatch {
            lhs: lhs.describe(),
            rhs: rhs.describe(),
        }),
    }
}

/// Requires a scalar of the numeric family; returns it.
pub(crate) fn check_numeric(expr: &Expr) -> Result<ScalarType> {
    match expr.declared_type() {
        Some(DeclaredType::Scalar(ty)) if ty.is_numeric() => Ok(ty),
        _ => Err(Error::TypeMismatch {
            lhs: expr.describe(),
            rhs: "a numeric expression".to_string(),
        }),
    }
}

/// Requires a text-typed scalar.
pub(crate) fn check_text(expr: &Expr) -> Result<()> {
    match expr.declared_type() {
        Some(DeclaredType::Scalar(ScalarType::Text)) => Ok(()),
        _ => Err(Error::TypeMismatch {
            lhs: expr.describe(),
            rhs: "a text expression".to_string(),
        }),
    }
}

/// Requires any scalar (not a whole entity).
pub(crate) fn check_scalar(expr: &Expr) -> Result<()> {
    match expr.declared_type() {
        Some(DeclaredType::Entity(_)) => Err(Error::TypeMismatch {
            lhs: expr.describe(),
            rhs: "a scalar expression".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CmpOp {
    pub(crate) const fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
        }
    }
}

/// Where a pattern match anchors within the tested value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternAnchor {
    /// The pattern is used verbatim, wildcards included.
    Exact,
    Contains,
    StartsWith,
    EndsWith,
}

/// A node in a boolean expression tree, usable in WHERE, HAVING, and ON.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Cmp {
        op: CmpOp,
        lhs: Expr,
        rhs: Expr,
    },
    Between {
        expr: Expr,
        lo: Expr,
        hi: Expr,
        inclusive_lo: bool,
        inclusive_hi: bool,
    },
    InList {
        expr: Expr,
        values: Vec<Expr>,
        negated: bool,
    },
    Like {
        expr: Expr,
        pattern: CompactString,
        anchor: PatternAnchor,
    },
    IsNull {
        expr: Expr,
        negated: bool,
    },
    /// Flattened conjunction; constructors never nest And inside And.
    And(Vec<Predicate>),
    /// Flattened disjunction; constructors never nest Or inside Or.
    Or(Vec<Predicate>),
    /// Double negation is preserved structurally; rendering is the
    /// translator's decision.
    Not(Box<Predicate>),
}

impl Predicate {
    /// `self AND other`, flattening same-kind combinators.
    pub fn and(self, other: Predicate) -> Predicate {
        and2(self, other)
    }

    /// `self OR other`, flattening same-kind combinators.
    pub fn or(self, other: Predicate) -> Predicate {
        or2(self, other)
    }

    /// Whether any operand anywhere in this tree contains an aggregate.
    pub fn contains_aggregate(&self) -> bool {
        let mut found = false;
        self.for_each_expr(&mut |expr| found |= expr.contains_aggregate());
        found
    }

    /// Visits every expression operand of every leaf predicate.
    pub(crate) fn for_each_expr(&self, f: &mut impl FnMut(&Expr)) {
        match self {
            Predicate::Cmp { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            Predicate::Between { expr, lo, hi, .. } => {
                f(expr);
                f(lo);
                f(hi);
            }
            Predicate::InList { expr, values, .. } => {
                f(expr);
                values.iter().for_each(&mut *f);
            }
            Predicate::Like { expr, .. } | Predicate::IsNull { expr, .. } => f(expr),
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.for_each_expr(f);
                }
            }
            Predicate::Not(child) => child.for_each_expr(f),
        }
    }
}
