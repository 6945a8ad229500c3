//! The immutable query specification and its fluent builder.
//!
//! Every builder call consumes the previous value and returns a new one;
//! cloning a partially-built [`Query`] and extending both copies yields two
//! independent specifications, so fan-out query variants from a common base
//! are safe across threads.

use compact_str::{CompactString, ToCompactString};

use crate::error::{Error, Result};
use crate::executor::{Backend, Executor, Rows};
use crate::expr::{self, Expr, IntoExpr, Predicate};
use crate::join::{JoinKind, JoinSpec};
use crate::order::OrderSpec;
use crate::path::Path;
use crate::row::ResultRow;

/// One select-list entry: an expression with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<CompactString>,
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        SelectItem { expr, alias: None }
    }
}

impl From<&Expr> for SelectItem {
    fn from(expr: &Expr) -> Self {
        expr.clone().into()
    }
}

impl From<Path> for SelectItem {
    fn from(path: Path) -> Self {
        Expr::Path(path).into()
    }
}

impl From<&Path> for SelectItem {
    fn from(path: &Path) -> Self {
        path.clone().into()
    }
}

/// Attaches an alias to a select-list expression.
pub fn aliased(expr: impl IntoExpr, alias: impl AsRef<str>) -> SelectItem {
    SelectItem {
        expr: expr.into_expr(),
        alias: Some(alias.as_ref().to_compact_string()),
    }
}

/// The full immutable description of one query.
///
/// Constructed incrementally by [`Query`], consumed once by the translator,
/// then discarded; no entity owns a spec across requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub(crate) select: Vec<SelectItem>,
    pub(crate) sources: Vec<Path>,
    pub(crate) joins: Vec<JoinSpec>,
    pub(crate) filter: Option<Predicate>,
    pub(crate) group_by: Vec<Expr>,
    pub(crate) having: Option<Predicate>,
    pub(crate) order_by: Vec<OrderSpec>,
    pub(crate) offset: Option<u64>,
    pub(crate) limit: Option<u64>,
}

impl QuerySpec {
    /// The same query with its select list replaced by `COUNT(*)` and any
    /// ordering and pagination dropped.
    pub(crate) fn count_rewrite(&self) -> QuerySpec {
        let mut spec = self.clone();
        spec.select = vec![expr::count_all().into()];
        spec.order_by.clear();
        spec.offset = None;
        spec.limit = None;
        spec
    }

    pub(crate) fn with_limit(&self, limit: u64) -> QuerySpec {
        let mut spec = self.clone();
        spec.limit = Some(limit);
        spec
    }
}

/// Fluent builder over [`QuerySpec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    spec: QuerySpec,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// `SELECT path.* FROM path`, the common whole-entity query.
    pub fn select_from(path: &Path) -> Self {
        Query::new().select([path]).from([path.clone()])
    }

    /// Appends expressions to the select list.
    pub fn select<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SelectItem>,
    {
        self.spec.select.extend(items.into_iter().map(Into::into));
        self
    }

    /// Appends root sources. More than one root renders a cartesian
    /// product (theta join) to be narrowed by WHERE.
    pub fn from(mut self, roots: impl IntoIterator<Item = Path>) -> Self {
        self.spec.sources.extend(roots);
        self
    }

    /// Inner join on a relationship path.
    pub fn join(self, path: &Path, alias: impl AsRef<str>) -> Self {
        self.add_join(JoinKind::Inner, path, alias, None)
    }

    /// Inner join with an extra ON predicate ANDed onto the key condition.
    pub fn join_on(self, path: &Path, alias: impl AsRef<str>, on: Predicate) -> Self {
        self.add_join(JoinKind::Inner, path, alias, Some(on))
    }

    pub fn left_join(self, path: &Path, alias: impl AsRef<str>) -> Self {
        self.add_join(JoinKind::Left, path, alias, None)
    }

    pub fn left_join_on(self, path: &Path, alias: impl AsRef<str>, on: Predicate) -> Self {
        self.add_join(JoinKind::Left, path, alias, Some(on))
    }

    pub fn right_join(self, path: &Path, alias: impl AsRef<str>) -> Self {
        self.add_join(JoinKind::Right, path, alias, None)
    }

    pub fn right_join_on(self, path: &Path, alias: impl AsRef<str>, on: Predicate) -> Self {
        self.add_join(JoinKind::Right, path, alias, Some(on))
    }

    fn add_join(
        mut self,
        kind: JoinKind,
        path: &Path,
        alias: impl AsRef<str>,
        on: Option<Predicate>,
    ) -> Self {
        self.spec.joins.push(JoinSpec {
            kind,
            path: path.clone(),
            alias: alias.as_ref().to_compact_string(),
            on,
        });
        self
    }

    /// Adds a WHERE predicate. Multiple calls AND-combine.
    ///
    /// WHERE filters pre-aggregation rows, so an aggregate anywhere in the
    /// predicate is rejected here at build time.
    pub fn r#where(mut self, predicate: Predicate) -> Result<Self> {
        if predicate.contains_aggregate() {
            return Err(Error::AggregateInWhere);
        }
        self.spec.filter = Some(match self.spec.filter.take() {
            Some(existing) => expr::and2(existing, predicate),
            None => predicate,
        });
        Ok(self)
    }

    /// Appends grouping keys.
    pub fn group_by<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoExpr,
    {
        self.spec
            .group_by
            .extend(keys.into_iter().map(IntoExpr::into_expr));
        self
    }

    /// Adds a HAVING predicate. Multiple calls AND-combine. Validation that
    /// referenced expressions are grouped or aggregated happens at
    /// translation.
    pub fn having(mut self, predicate: Predicate) -> Self {
        self.spec.having = Some(match self.spec.having.take() {
            Some(existing) => expr::and2(existing, predicate),
            None => predicate,
        });
        self
    }

    /// Appends ordering specifications.
    pub fn order_by(mut self, specs: impl IntoIterator<Item = OrderSpec>) -> Self {
        self.spec.order_by.extend(specs);
        self
    }

    /// Skips the first `n` rows. Negative input is rejected.
    pub fn offset(mut self, n: i64) -> Result<Self> {
        self.spec.offset = Some(non_negative("OFFSET", n)?);
        Ok(self)
    }

    /// Caps the result at `n` rows. Negative input is rejected.
    pub fn limit(mut self, n: i64) -> Result<Self> {
        self.spec.limit = Some(non_negative("LIMIT", n)?);
        Ok(self)
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Lazy, single-pass row sequence. Dropping it early releases the
    /// backend cursor.
    pub fn fetch<'e, B: Backend>(&self, executor: &'e Executor<B>) -> Result<Rows<'e>> {
        executor.rows(&self.spec)
    }

    /// Eager convenience: drains [`Query::fetch`] into a vector.
    pub fn fetch_all<B: Backend>(&self, executor: &Executor<B>) -> Result<Vec<ResultRow>> {
        executor.fetch_all(&self.spec)
    }

    /// Exactly one row, or `NoResult` / `NonUniqueResult`.
    pub fn fetch_one<B: Backend>(&self, executor: &Executor<B>) -> Result<ResultRow> {
        executor.fetch_one(&self.spec)
    }

    /// The first row if any: `limit(1)` plus a zero-tolerant `fetch_one`.
    pub fn fetch_first<B: Backend>(&self, executor: &Executor<B>) -> Result<Option<ResultRow>> {
        executor.fetch_first(&self.spec)
    }

    /// Row count: the select list rewritten to `COUNT(*)`.
    pub fn fetch_count<B: Backend>(&self, executor: &Executor<B>) -> Result<i64> {
        executor.fetch_count(&self.spec)
    }
}

fn non_negative(clause: &'static str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::InvalidPagination { clause, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{avg, count_all, eq};

    #[test]
    fn negative_pagination_is_rejected() {
        assert!(Query::new().offset(0).is_ok());
        assert!(matches!(
            Query::new().offset(-1),
            Err(Error::InvalidPagination {
                clause: "OFFSET",
                ..
            })
        ));
        assert!(matches!(
            Query::new().limit(-5),
            Err(Error::InvalidPagination { clause: "LIMIT", .. })
        ));
    }

    #[test]
    fn aggregates_in_where_fail_at_build_time() {
        let predicate = eq(avg(10).unwrap(), 25.0).unwrap();
        assert!(matches!(
            Query::new().r#where(predicate),
            Err(Error::AggregateInWhere)
        ));
    }

    #[test]
    fn where_calls_and_combine() {
        let q = Query::new()
            .r#where(eq(1, 1).unwrap())
            .unwrap()
            .r#where(eq(2, 2).unwrap())
            .unwrap();
        assert!(matches!(q.spec().filter, Some(Predicate::And(ref c)) if c.len() == 2));
    }

    #[test]
    fn builder_calls_never_mutate_the_shared_base() {
        let base = Query::new().select([count_all()]);
        let with_limit = base.clone().limit(1).unwrap();
        assert_eq!(base.spec().limit, None);
        assert_eq!(with_limit.spec().limit, Some(1));
    }
}
