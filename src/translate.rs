//! Structural translation of a [`QuerySpec`] into a statement plus
//! projection plan.
//!
//! The walk is deterministic and leaf-first, with an exhaustive `match` over
//! both variant families: a construct either has a rendering rule for the
//! active dialect or translation fails with `UnsupportedConstruct` before
//! any I/O happens. Literals never reach the statement text; they become
//! positional bind parameters in emission order.
//!
//! Predicate precedence is NOT over AND over OR. Because `and`/`or`
//! flatten same-kind combinators at construction, parentheses are emitted
//! only where the structure would otherwise be ambiguous: around an OR that
//! sits inside an AND (or an ON conjunction), and around every NOT operand.

use compact_str::{CompactString, ToCompactString, format_compact};
use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::expr::{AggregateKind, Expr, FuncKind, PatternAnchor, Predicate};
use crate::join::JoinKind;
use crate::metamodel::Ownership;
use crate::order::NullPlacement;
use crate::path::Path;
use crate::query::{QuerySpec, SelectItem};
use crate::row::{ProjectedItem, Projection, Shape};
use crate::sql::{Sql, Statement};
use crate::value::Value;

/// A rendered statement plus the projection plan for its rows.
#[derive(Debug, Clone)]
pub struct Translated {
    pub statement: Statement,
    pub projection: Projection,
}

/// Translates one immutable query specification for the given dialect.
///
/// Pure: no external resource access, safe to run concurrently on distinct
/// specs.
pub fn translate(spec: &QuerySpec, dialect: &Dialect) -> Result<Translated> {
    let cx = Context { spec, dialect };
    let (select_sql, projection) = cx.render_select()?;

    let mut sql = Sql::raw("SELECT ")
        .append(select_sql)
        .append(Sql::raw(" FROM "))
        .append(cx.render_sources()?);

    for join in &spec.joins {
        sql = sql.append(Sql::raw(" ")).append(cx.render_join(join)?);
    }

    if let Some(filter) = &spec.filter {
        sql = sql
            .append(Sql::raw(" WHERE "))
            .append(cx.render_predicate(filter)?);
    }

    if !spec.group_by.is_empty() {
        let keys = spec
            .group_by
            .iter()
            .map(|key| cx.render_scalar(key))
            .collect::<Result<Vec<_>>>()?;
        sql = sql
            .append(Sql::raw(" GROUP BY "))
            .append(Sql::join(keys, ", "));
    }

    if let Some(having) = &spec.having {
        cx.validate_having(having)?;
        sql = sql
            .append(Sql::raw(" HAVING "))
            .append(cx.render_predicate(having)?);
    }

    if !spec.order_by.is_empty() {
        let specs = spec
            .order_by
            .iter()
            .map(|order| cx.render_order(order))
            .collect::<Result<Vec<_>>>()?;
        sql = sql
            .append(Sql::raw(" ORDER BY "))
            .append(Sql::join(specs, ", "));
    }

    sql = sql.append(cx.render_pagination());

    let statement = sql.render(dialect);
    debug!(
        statement = %statement.text,
        params = statement.params.len(),
        "translated query"
    );
    Ok(Translated {
        statement,
        projection,
    })
}

struct Context<'a> {
    spec: &'a QuerySpec,
    dialect: &'a Dialect,
}

impl Context<'_> {
    /// Resolves the rendering alias of an entity base: a declared root
    /// source or a joined relation path.
    fn alias_of(&self, base: &Path) -> Result<CompactString> {
        if base.is_root() {
            if self.spec.sources.iter().any(|source| source == base) {
                return Ok(base.root_alias().to_compact_string());
            }
            return Err(Error::UnsupportedConstruct(format!(
                "root `{base}` is not a query source"
            )));
        }
        self.spec
            .joins
            .iter()
            .find(|join| &join.path == base)
            .map(|join| join.alias.clone())
            .ok_or_else(|| Error::UnjoinedRelation(base.to_string()))
    }

    fn render_select(&self) -> Result<(Sql, Projection)> {
        // An empty select list defaults to the whole entity of each source.
        let implicit: Vec<SelectItem>;
        let items: &[SelectItem] = if self.spec.select.is_empty() {
            implicit = self.spec.sources.iter().map(SelectItem::from).collect();
            &implicit
        } else {
            &self.spec.select
        };
        if items.is_empty() {
            return Err(Error::UnsupportedConstruct(
                "a query with an empty select list".to_string(),
            ));
        }

        let mut parts = Vec::with_capacity(items.len());
        let mut projected = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let name = item
                .alias
                .clone()
                .unwrap_or_else(|| format_compact!("c{i}"));
            match &item.expr {
                Expr::Path(path) if path.is_entity() => {
                    let alias = self.alias_of(path)?;
                    let def = path.entity_def()?;
                    let columns = def
                        .fields()
                        .iter()
                        .map(|field| Sql::raw(format!("\"{alias}\".\"{}\"", field.column)));
                    parts.push(Sql::join(columns, ", "));
                    projected.push(ProjectedItem {
                        name,
                        expr: item.expr.clone(),
                        shape: Shape::Entity {
                            entity: def.name().to_compact_string(),
                            fields: def
                                .fields()
                                .iter()
                                .map(|field| (field.name.clone(), field.ty))
                                .collect(),
                        },
                    });
                }
                expr => {
                    let mut sql = self.render_scalar(expr)?;
                    if let Some(alias) = &item.alias {
                        sql = sql.append(Sql::raw(format!(" AS \"{alias}\"")));
                    }
                    parts.push(sql);
                    projected.push(ProjectedItem {
                        name,
                        expr: expr.clone(),
                        shape: Shape::Scalar {
                            ty: expr.declared_type().and_then(|ty| ty.as_scalar()),
                        },
                    });
                }
            }
        }
        Ok((Sql::join(parts, ", "), Projection { items: projected }))
    }

    fn render_sources(&self) -> Result<Sql> {
        if self.spec.sources.is_empty() {
            return Err(Error::UnsupportedConstruct(
                "a query without sources".to_string(),
            ));
        }
        let mut parts = Vec::with_capacity(self.spec.sources.len());
        for source in &self.spec.sources {
            if !source.is_root() {
                return Err(Error::UnsupportedConstruct(format!(
                    "non-root path `{source}` as a query source"
                )));
            }
            let def = source.entity_def()?;
            parts.push(Sql::raw(format!(
                "\"{}\" AS \"{}\"",
                def.table(),
                source.root_alias()
            )));
        }
        Ok(Sql::join(parts, ", "))
    }

    fn render_join(&self, join: &crate::join::JoinSpec) -> Result<Sql> {
        if join.kind == JoinKind::Right && !self.dialect.supports_right_join {
            return Err(Error::UnsupportedConstruct("RIGHT JOIN".to_string()));
        }
        let (parent, relation_name) = join.path.split_relation().ok_or_else(|| {
            Error::UnsupportedConstruct(format!("joining non-relation path `{}`", join.path))
        })?;
        let parent_alias = self.alias_of(&parent)?;
        let parent_def = parent.entity_def()?;
        let relation = parent_def
            .relation_def(&relation_name)
            .ok_or_else(|| Error::UnknownRelation {
                entity: parent_def.name().to_string(),
                relation: relation_name.to_string(),
            })?;
        let target_def = join.path.entity_def()?;

        // Key condition from the metamodel; the user's ON predicate is ANDed
        // onto it.
        let key = match &relation.ownership {
            Ownership::ManyToOne { fk_column } => format!(
                "\"{parent_alias}\".\"{fk_column}\" = \"{}\".\"{}\"",
                join.alias,
                target_def.primary_key_column()
            ),
            Ownership::OneToMany { remote_fk_column } => format!(
                "\"{}\".\"{remote_fk_column}\" = \"{parent_alias}\".\"{}\"",
                join.alias,
                parent_def.primary_key_column()
            ),
        };

        let mut sql = Sql::raw(format!(
            "{} \"{}\" AS \"{}\" ON {key}",
            join.kind.sql(),
            target_def.table(),
            join.alias
        ));
        if let Some(on) = &join.on {
            sql = sql
                .append(Sql::raw(" AND "))
                .append(self.render_conjunct(on)?);
        }
        Ok(sql)
    }

    fn render_scalar(&self, expr: &Expr) -> Result<Sql> {
        match expr {
            Expr::Path(path) => {
                let Some((base, column, _ty)) = path.split_field() else {
                    return Err(Error::UnsupportedConstruct(format!(
                        "entity path `{path}` in scalar position"
                    )));
                };
                let alias = self.alias_of(&base)?;
                Ok(Sql::raw(format!("\"{alias}\".\"{column}\"")))
            }
            Expr::Literal(value) => Ok(Sql::param(value.clone())),
            Expr::Arith { op, lhs, rhs } => Ok(Sql::raw("(")
                .append(self.render_scalar(lhs)?)
                .append(Sql::raw(format!(" {} ", op.symbol())))
                .append(self.render_scalar(rhs)?)
                .append(Sql::raw(")"))),
            Expr::Func { kind, args } => {
                let rendered = args
                    .iter()
                    .map(|arg| self.render_scalar(arg))
                    .collect::<Result<Vec<_>>>()?;
                Ok(match kind {
                    FuncKind::Upper => Sql::raw("UPPER(")
                        .append(Sql::join(rendered, ", "))
                        .append(Sql::raw(")")),
                    FuncKind::Lower => Sql::raw("LOWER(")
                        .append(Sql::join(rendered, ", "))
                        .append(Sql::raw(")")),
                    FuncKind::Concat => Sql::raw("(")
                        .append(Sql::join(rendered, " || "))
                        .append(Sql::raw(")")),
                })
            }
            Expr::Aggregate { kind, operand } => self.render_aggregate(*kind, operand.as_deref()),
        }
    }

    fn render_aggregate(&self, kind: AggregateKind, operand: Option<&Expr>) -> Result<Sql> {
        let Some(operand) = operand else {
            return Ok(Sql::raw("COUNT(*)"));
        };
        // Counting an entity counts its primary key; other aggregates have
        // no entity rendering rule.
        if let Expr::Path(path) = operand {
            if path.is_entity() {
                if kind != AggregateKind::Count {
                    return Err(Error::UnsupportedConstruct(format!(
                        "{} over entity path `{path}`",
                        kind.sql_name()
                    )));
                }
                let alias = self.alias_of(path)?;
                let pk = path.entity_def()?.primary_key_column();
                return Ok(Sql::raw(format!("COUNT(\"{alias}\".\"{pk}\")")));
            }
        }
        Ok(Sql::raw(format!("{}(", kind.sql_name()))
            .append(self.render_scalar(operand)?)
            .append(Sql::raw(")")))
    }

    fn render_predicate(&self, predicate: &Predicate) -> Result<Sql> {
        match predicate {
            Predicate::Cmp { op, lhs, rhs } => Ok(self
                .render_scalar(lhs)?
                .append(Sql::raw(format!(" {} ", op.symbol())))
                .append(self.render_scalar(rhs)?)),
            Predicate::Between {
                expr,
                lo,
                hi,
                inclusive_lo,
                inclusive_hi,
            } => {
                if *inclusive_lo && *inclusive_hi {
                    return Ok(self
                        .render_scalar(expr)?
                        .append(Sql::raw(" BETWEEN "))
                        .append(self.render_scalar(lo)?)
                        .append(Sql::raw(" AND "))
                        .append(self.render_scalar(hi)?));
                }
                // Open bounds fall back to an explicit conjunction, kept
                // atomic with parentheses.
                let lo_op = if *inclusive_lo { " >= " } else { " > " };
                let hi_op = if *inclusive_hi { " <= " } else { " < " };
                Ok(Sql::raw("(")
                    .append(self.render_scalar(expr)?)
                    .append(Sql::raw(lo_op))
                    .append(self.render_scalar(lo)?)
                    .append(Sql::raw(" AND "))
                    .append(self.render_scalar(expr)?)
                    .append(Sql::raw(hi_op))
                    .append(self.render_scalar(hi)?)
                    .append(Sql::raw(")")))
            }
            Predicate::InList {
                expr,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // IN () has no grammar; the empty set matches nothing.
                    return Ok(Sql::raw(if *negated { "1 = 1" } else { "1 = 0" }));
                }
                let rendered = values
                    .iter()
                    .map(|value| self.render_scalar(value))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self
                    .render_scalar(expr)?
                    .append(Sql::raw(if *negated { " NOT IN (" } else { " IN (" }))
                    .append(Sql::join(rendered, ", "))
                    .append(Sql::raw(")")))
            }
            Predicate::Like {
                expr,
                pattern,
                anchor,
            } => Ok(self
                .render_scalar(expr)?
                .append(Sql::raw(" LIKE "))
                .append(Sql::param(like_value(pattern, *anchor)))),
            Predicate::IsNull { expr, negated } => Ok(self.render_scalar(expr)?.append(Sql::raw(
                if *negated { " IS NOT NULL" } else { " IS NULL" },
            ))),
            Predicate::And(children) => {
                if children.is_empty() {
                    return Ok(Sql::raw("1 = 1"));
                }
                let rendered = children
                    .iter()
                    .map(|child| self.render_conjunct(child))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Sql::join(rendered, " AND "))
            }
            Predicate::Or(children) => {
                if children.is_empty() {
                    return Ok(Sql::raw("1 = 0"));
                }
                let rendered = children
                    .iter()
                    .map(|child| self.render_predicate(child))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Sql::join(rendered, " OR "))
            }
            Predicate::Not(child) => Ok(Sql::raw("NOT (")
                .append(self.render_predicate(child)?)
                .append(Sql::raw(")"))),
        }
    }

    /// Renders a predicate that sits inside a conjunction: ORs get
    /// parenthesized, everything else binds tightly enough already.
    fn render_conjunct(&self, predicate: &Predicate) -> Result<Sql> {
        let sql = self.render_predicate(predicate)?;
        if matches!(predicate, Predicate::Or(children) if children.len() != 1) {
            return Ok(Sql::raw("(").append(sql).append(Sql::raw(")")));
        }
        Ok(sql)
    }

    fn render_order(&self, order: &crate::order::OrderSpec) -> Result<Sql> {
        let mut sql = self
            .render_scalar(&order.expr)?
            .append(Sql::raw(format!(" {}", order.direction.sql())));
        match order.nulls {
            NullPlacement::Default => {}
            NullPlacement::First | NullPlacement::Last => {
                if !self.dialect.supports_null_ordering {
                    return Err(Error::UnsupportedConstruct(
                        "explicit NULLS ordering".to_string(),
                    ));
                }
                sql = sql.append(Sql::raw(if order.nulls == NullPlacement::First {
                    " NULLS FIRST"
                } else {
                    " NULLS LAST"
                }));
            }
        }
        Ok(sql)
    }

    fn render_pagination(&self) -> Sql {
        match (self.spec.limit, self.spec.offset) {
            (Some(limit), Some(offset)) => Sql::raw(" LIMIT ")
                .append(Sql::param(Value::Int(limit as i64)))
                .append(Sql::raw(" OFFSET "))
                .append(Sql::param(Value::Int(offset as i64))),
            (Some(limit), None) => Sql::raw(" LIMIT ").append(Sql::param(Value::Int(limit as i64))),
            (None, Some(offset)) => {
                let prefix = if self.dialect.requires_limit_with_offset {
                    // Grammar wants a LIMIT; -1 is the no-limit sentinel,
                    // not a user literal.
                    " LIMIT -1 OFFSET "
                } else {
                    " OFFSET "
                };
                Sql::raw(prefix).append(Sql::param(Value::Int(offset as i64)))
            }
            (None, None) => Sql::empty(),
        }
    }

    /// HAVING filters post-aggregation groups: every referenced expression
    /// must resolve per group.
    fn validate_having(&self, having: &Predicate) -> Result<()> {
        let mut offending: Option<String> = None;
        having.for_each_expr(&mut |expr| {
            if offending.is_none() && !self.resolves_per_group(expr) {
                offending = Some(expr.describe());
            }
        });
        match offending {
            Some(description) => Err(Error::UngroupedExpression(description)),
            None => Ok(()),
        }
    }

    fn resolves_per_group(&self, expr: &Expr) -> bool {
        if self.spec.group_by.iter().any(|key| key == expr) {
            return true;
        }
        match expr {
            Expr::Literal(_) | Expr::Aggregate { .. } => true,
            Expr::Arith { lhs, rhs, .. } => {
                self.resolves_per_group(lhs) && self.resolves_per_group(rhs)
            }
            Expr::Func { args, .. } => args.iter().all(|arg| self.resolves_per_group(arg)),
            Expr::Path(_) => false,
        }
    }
}

fn like_value(pattern: &str, anchor: PatternAnchor) -> Value {
    match anchor {
        PatternAnchor::Exact => Value::from(pattern),
        PatternAnchor::Contains => Value::from(format!("%{pattern}%")),
        PatternAnchor::StartsWith => Value::from(format!("{pattern}%")),
        PatternAnchor::EndsWith => Value::from(format!("%{pattern}")),
    }
}
