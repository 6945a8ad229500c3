use thiserror::Error;

/// Everything that can go wrong between building a query and mapping its rows.
///
/// Construction-time variants (`UnknownField`, `TypeMismatch`, ...) are raised
/// before any statement text exists; translation-time variants are raised
/// before any I/O; execution-time variants carry the rendered statement but
/// never raw parameter values.
#[derive(Debug, Error)]
pub enum Error {
    /// The metamodel has no entry for the requested entity type.
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),

    /// Path construction named a field the entity does not have.
    #[error("`{entity}` has no field `{field}`")]
    UnknownField { entity: String, field: String },

    /// Path construction named a relation the entity does not have.
    #[error("`{entity}` has no relation `{relation}`")]
    UnknownRelation { entity: String, relation: String },

    /// Operands of a comparison or arithmetic operation are not mutually
    /// compatible.
    #[error("type mismatch: {lhs} is not compatible with {rhs}")]
    TypeMismatch { lhs: String, rhs: String },

    /// A range bound is not comparable with the tested expression.
    #[error("range bounds are not comparable with `{0}`")]
    InvalidRange(String),

    /// `offset` / `limit` received a negative value.
    #[error("{clause} must be non-negative, got {value}")]
    InvalidPagination { clause: &'static str, value: i64 },

    /// An aggregate expression was placed in a WHERE predicate.
    #[error("aggregate expressions cannot appear in WHERE")]
    AggregateInWhere,

    /// A HAVING expression is neither a grouping key nor an aggregate.
    #[error("`{0}` appears in HAVING but is neither grouped nor aggregated")]
    UngroupedExpression(String),

    /// A relation path was referenced without a matching join.
    #[error("relation path `{0}` is referenced but never joined")]
    UnjoinedRelation(String),

    /// The active dialect has no rendering rule for a construct.
    #[error("the active dialect cannot render {0}")]
    UnsupportedConstruct(String),

    /// `fetch_one` found no rows.
    #[error("query returned no rows where exactly one was expected")]
    NoResult,

    /// `fetch_one` found more than one row.
    #[error("query returned more than one row where exactly one was expected")]
    NonUniqueResult,

    /// The backend reported a failure. Carries the rendered statement for
    /// diagnostics; bound values are deliberately omitted.
    #[error("backend execution failed: {message} (statement: {statement})")]
    Backend { message: String, statement: String },

    /// Cooperative cancellation was observed.
    #[error("execution cancelled")]
    Cancelled,

    /// A row could not be mapped into the requested result shape.
    #[error("row mapping failed: {0}")]
    Mapping(String),
}

/// Result type for query operations.
pub type Result<T> = core::result::Result<T, Error>;
