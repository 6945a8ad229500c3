//! Query execution over a pluggable backend.
//!
//! [`Backend`] is the seam between the engine and a concrete driver: it
//! reports its dialect and turns a rendered [`Statement`] into a row cursor.
//! [`Executor`] owns the translate-then-run pipeline and the cardinality
//! rules of the fetch variants; results stream through [`Rows`], which pulls
//! one raw row per step and maps it on the spot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::query::QuerySpec;
use crate::row::{Projection, ResultRow};
use crate::sql::Statement;
use crate::translate::{Translated, translate};
use crate::value::Value;

/// Pull-based cursor over the raw rows of one executed statement.
///
/// Implementations release their underlying resources on drop.
pub trait RowCursor {
    /// The next raw row in column order, or `None` once exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

/// A connection-like handle that can run rendered statements.
pub trait Backend {
    type Cursor<'c>: RowCursor + 'c
    where
        Self: 'c;

    /// The dialect statements must be rendered in for this backend.
    fn dialect(&self) -> Dialect;

    /// Runs a read statement, binding its parameters in order.
    fn run<'c>(&'c self, statement: &Statement) -> Result<Self::Cursor<'c>>;
}

/// Cooperative cancellation flag shared between a caller and in-flight
/// fetches.
///
/// Cancelling is a request, not preemption: a fetch observes the flag
/// between rows and stops with [`Error::Cancelled`] at the next step.
/// Clones share one flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Runs query specifications against one backend.
pub struct Executor<'a, B: Backend> {
    backend: &'a B,
    cancel: Option<CancelToken>,
}

impl<'a, B: Backend> Executor<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Executor {
            backend,
            cancel: None,
        }
    }

    /// Attaches a cancellation token checked before the statement runs and
    /// between rows.
    pub fn with_cancel(backend: &'a B, cancel: CancelToken) -> Self {
        Executor {
            backend,
            cancel: Some(cancel),
        }
    }

    /// Translates and runs `spec`, returning a lazy row sequence.
    pub fn rows(&self, spec: &QuerySpec) -> Result<Rows<'a>> {
        self.check_cancelled()?;
        let dialect = self.backend.dialect();
        let Translated {
            statement,
            projection,
        } = translate(spec, &dialect)?;
        let cursor = self.backend.run(&statement)?;
        Ok(Rows {
            cursor: Box::new(cursor),
            projection,
            cancel: self.cancel.clone(),
            done: false,
        })
    }

    /// Drains [`Executor::rows`] into a vector.
    pub fn fetch_all(&self, spec: &QuerySpec) -> Result<Vec<ResultRow>> {
        self.rows(spec)?.collect()
    }

    /// Exactly one row. Zero rows is [`Error::NoResult`]; a second row is
    /// [`Error::NonUniqueResult`], detected without draining the rest.
    pub fn fetch_one(&self, spec: &QuerySpec) -> Result<ResultRow> {
        let mut rows = self.rows(spec)?;
        let first = rows.next().ok_or(Error::NoResult)??;
        match rows.next() {
            None => Ok(first),
            // A cursor failure after the first row is not a second row.
            Some(Err(err)) => Err(err),
            Some(Ok(_)) => Err(Error::NonUniqueResult),
        }
    }

    /// The first row if any; runs with `LIMIT 1` regardless of the spec's
    /// own pagination.
    pub fn fetch_first(&self, spec: &QuerySpec) -> Result<Option<ResultRow>> {
        self.rows(&spec.with_limit(1))?.next().transpose()
    }

    /// The number of rows the spec would produce, via a `COUNT(*)` rewrite
    /// that drops ordering and pagination.
    pub fn fetch_count(&self, spec: &QuerySpec) -> Result<i64> {
        let row = self.fetch_one(&spec.count_rewrite())?;
        let count = row
            .as_scalar()
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::Mapping("COUNT(*) did not produce an integer".to_string()))?;
        debug!(count, "counted rows");
        Ok(count)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Lazy, single-pass sequence of mapped result rows.
///
/// Each `next` pulls exactly one raw row from the backend cursor. Dropping
/// the sequence early drops the cursor and releases its resources; after
/// the first error or the natural end, the sequence is fused.
pub struct Rows<'a> {
    cursor: Box<dyn RowCursor + 'a>,
    projection: Projection,
    cancel: Option<CancelToken>,
    done: bool,
}

impl Iterator for Rows<'_> {
    type Item = Result<ResultRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                self.done = true;
                return Some(Err(Error::Cancelled));
            }
        }
        match self.cursor.next_row() {
            Ok(Some(raw)) => {
                let mapped = self.projection.map_row(raw);
                if mapped.is_err() {
                    self.done = true;
                }
                Some(mapped)
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::metamodel::{EntityDef, Metamodel, Registry};
    use crate::path::Path;
    use crate::query::Query;
    use crate::value::ScalarType;

    #[test]
    fn cancel_token_is_shared_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    /// Replays a scripted row sequence regardless of the statement.
    struct Scripted {
        steps: RefCell<VecDeque<Result<Vec<Value>>>>,
    }

    impl Scripted {
        fn new(steps: impl IntoIterator<Item = Result<Vec<Value>>>) -> Self {
            Scripted {
                steps: RefCell::new(steps.into_iter().collect()),
            }
        }
    }

    struct ScriptedCursor {
        steps: VecDeque<Result<Vec<Value>>>,
    }

    impl RowCursor for ScriptedCursor {
        fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
            self.steps.pop_front().transpose()
        }
    }

    impl Backend for Scripted {
        type Cursor<'c> = ScriptedCursor;

        fn dialect(&self) -> Dialect {
            Dialect::sqlite()
        }

        fn run<'c>(&'c self, _statement: &Statement) -> Result<Self::Cursor<'c>> {
            Ok(ScriptedCursor {
                steps: self.steps.borrow_mut().drain(..).collect(),
            })
        }
    }

    fn single_column_spec() -> QuerySpec {
        let meta: std::sync::Arc<dyn Metamodel> = std::sync::Arc::new(
            Registry::new().register(EntityDef::new("Item", "item").field("id", ScalarType::Int)),
        );
        let item = Path::root(meta, "Item", "i").unwrap();
        Query::new()
            .select([item.field("id").unwrap()])
            .from([item])
            .spec()
            .clone()
    }

    fn cursor_failure() -> Error {
        Error::Backend {
            message: "disk I/O error".to_string(),
            statement: String::new(),
        }
    }

    #[test]
    fn fetch_one_propagates_a_cursor_failure_after_the_first_row() {
        let backend = Scripted::new([Ok(vec![Value::Int(1)]), Err(cursor_failure())]);
        let executor = Executor::new(&backend);
        assert!(matches!(
            executor.fetch_one(&single_column_spec()),
            Err(Error::Backend { .. })
        ));
    }

    #[test]
    fn fetch_one_still_rejects_a_genuine_second_row() {
        let backend = Scripted::new([Ok(vec![Value::Int(1)]), Ok(vec![Value::Int(2)])]);
        let executor = Executor::new(&backend);
        assert!(matches!(
            executor.fetch_one(&single_column_spec()),
            Err(Error::NonUniqueResult)
        ));
    }

    #[test]
    fn rows_fuse_after_a_mapping_failure() {
        // First row has the wrong width; a well-formed row follows it.
        let backend = Scripted::new([
            Ok(vec![Value::Int(1), Value::Int(2)]),
            Ok(vec![Value::Int(3)]),
        ]);
        let executor = Executor::new(&backend);
        let mut rows = executor.rows(&single_column_spec()).unwrap();
        assert!(matches!(rows.next(), Some(Err(Error::Mapping(_)))));
        assert!(rows.next().is_none());
    }
}
