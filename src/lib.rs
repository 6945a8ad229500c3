//! Typed query construction and execution over relational entities.
//!
//! Queries are built as immutable values against a runtime [`Metamodel`],
//! translated into parameterized SQL for a [`Dialect`], and executed through
//! a pluggable [`Backend`]. Invalid constructions fail at build or translate
//! time, before any statement reaches a database:
//!
//! ```no_run
//! use std::sync::Arc;
//! use trellis::{EntityDef, Metamodel, Query, Registry, ScalarType, Path};
//! use trellis::expr::{eq, gt, and2};
//!
//! # fn main() -> trellis::Result<()> {
//! let registry = Registry::new().register(
//!     EntityDef::new("Member", "member")
//!         .field("username", ScalarType::Text)
//!         .field("age", ScalarType::Int),
//! );
//! let meta: Arc<dyn Metamodel> = Arc::new(registry);
//!
//! let m = Path::root(meta, "Member", "m")?;
//! let query = Query::select_from(&m)
//!     .r#where(and2(
//!         eq(m.field("username")?, "member1")?,
//!         gt(m.field("age")?, 18)?,
//!     ))?
//!     .order_by([trellis::order::asc(m.field("username")?)])
//!     .limit(10)?;
//! # let _ = query;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod expr;
pub mod join;
pub mod metamodel;
pub mod order;
pub mod path;
pub mod query;
pub mod row;
pub mod sql;
pub mod translate;
pub mod value;

pub use dialect::{Dialect, PlaceholderStyle};
pub use error::{Error, Result};
pub use executor::{Backend, CancelToken, Executor, RowCursor, Rows};
pub use expr::{Expr, IntoExpr, Predicate};
pub use join::JoinKind;
pub use metamodel::{EntityDef, FieldDef, Metamodel, Ownership, Registry, RelationDef};
pub use order::{Direction, NullPlacement, OrderSpec, asc, desc};
pub use path::Path;
pub use query::{Query, QuerySpec, SelectItem, aliased};
pub use row::{EntityRow, ResultRow, SlotValue, TupleRow};
pub use sql::Statement;
pub use translate::{Translated, translate};
pub use value::{DeclaredType, ScalarType, Value};
