//! Result shapes: how raw backend rows project back into typed values.
//!
//! The translator plans a [`Projection`] alongside the statement; the
//! executor replays that plan over each raw row. One select item maps to one
//! slot, except entity items, which span one column per mapped field.

use compact_str::CompactString;

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::value::{ScalarType, Value};

/// A fully-populated entity instance, field name to value.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    entity: CompactString,
    values: Vec<(CompactString, Value)>,
}

impl EntityRow {
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

/// One tuple slot: a scalar cell or a whole entity.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Scalar(Value),
    Entity(EntityRow),
}

impl SlotValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            SlotValue::Scalar(value) => Some(value),
            SlotValue::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityRow> {
        match self {
            SlotValue::Entity(row) => Some(row),
            SlotValue::Scalar(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    name: CompactString,
    expr: Expr,
    value: SlotValue,
}

/// A heterogeneous result row of named, typed slots.
///
/// Slots are addressable positionally, by alias (or its positional fallback
/// name), or by the originating expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleRow {
    slots: Vec<Slot>,
}

impl TupleRow {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&SlotValue> {
        self.slots.get(index).map(|slot| &slot.value)
    }

    pub fn get(&self, name: &str) -> Option<&SlotValue> {
        self.slots
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| &slot.value)
    }

    pub fn get_expr(&self, expr: &Expr) -> Option<&SlotValue> {
        self.slots
            .iter()
            .find(|slot| &slot.expr == expr)
            .map(|slot| &slot.value)
    }
}

/// One mapped result row in the shape the select list requested.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultRow {
    Entity(EntityRow),
    Scalar(Value),
    Tuple(TupleRow),
}

impl ResultRow {
    pub fn as_entity(&self) -> Option<&EntityRow> {
        match self {
            ResultRow::Entity(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ResultRow::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleRow> {
        match self {
            ResultRow::Tuple(row) => Some(row),
            _ => None,
        }
    }
}

/// How one select item consumes raw columns.
#[derive(Debug, Clone)]
pub(crate) enum Shape {
    /// One column per field, in field order.
    Entity {
        entity: CompactString,
        fields: Vec<(CompactString, ScalarType)>,
    },
    /// Exactly one column. `ty` is `None` when the declared type is unknown
    /// (NULL literal); no coercion is applied then.
    Scalar { ty: Option<ScalarType> },
}

impl Shape {
    fn width(&self) -> usize {
        match self {
            Shape::Entity { fields, .. } => fields.len(),
            Shape::Scalar { .. } => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ProjectedItem {
    pub(crate) name: CompactString,
    pub(crate) expr: Expr,
    pub(crate) shape: Shape,
}

/// The executor's plan for turning raw rows into [`ResultRow`]s.
#[derive(Debug, Clone)]
pub struct Projection {
    pub(crate) items: Vec<ProjectedItem>,
}

impl Projection {
    fn width(&self) -> usize {
        self.items.iter().map(|item| item.shape.width()).sum()
    }

    pub(crate) fn map_row(&self, raw: Vec<Value>) -> Result<ResultRow> {
        if raw.len() != self.width() {
            return Err(Error::Mapping(format!(
                "expected {} columns, backend produced {}",
                self.width(),
                raw.len()
            )));
        }

        let mut cells = raw.into_iter();
        let mut slots = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let value = match &item.shape {
                Shape::Entity { entity, fields } => SlotValue::Entity(EntityRow {
                    entity: entity.clone(),
                    values: fields
                        .iter()
                        .map(|(name, ty)| {
                            let cell = cells.next().expect("width checked");
                            (name.clone(), coerce(cell, Some(*ty)))
                        })
                        .collect(),
                }),
                Shape::Scalar { ty } => {
                    let cell = cells.next().expect("width checked");
                    SlotValue::Scalar(coerce(cell, *ty))
                }
            };
            slots.push(Slot {
                name: item.name.clone(),
                expr: item.expr.clone(),
                value,
            });
        }

        if slots.len() == 1 {
            return Ok(match slots.pop().expect("len checked").value {
                SlotValue::Entity(row) => ResultRow::Entity(row),
                SlotValue::Scalar(value) => ResultRow::Scalar(value),
            });
        }
        Ok(ResultRow::Tuple(TupleRow { slots }))
    }
}

/// Nudges a backend cell toward its declared scalar family. Backends that
/// have no boolean or that return integer averages stay observable as the
/// declared type.
fn coerce(value: Value, ty: Option<ScalarType>) -> Value {
    match (value, ty) {
        (Value::Int(i), Some(ScalarType::Float)) => Value::Float(i as f64),
        (Value::Int(i), Some(ScalarType::Bool)) => Value::Bool(i != 0),
        (other, _) => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::count_all;

    #[test]
    fn declared_float_survives_integer_cells() {
        assert_eq!(
            coerce(Value::Int(25), Some(ScalarType::Float)),
            Value::Float(25.0)
        );
        assert_eq!(coerce(Value::Null, Some(ScalarType::Float)), Value::Null);
        assert_eq!(
            coerce(Value::Int(1), Some(ScalarType::Bool)),
            Value::Bool(true)
        );
    }

    #[test]
    fn width_mismatch_is_a_mapping_error() {
        let projection = Projection {
            items: vec![ProjectedItem {
                name: "c0".into(),
                expr: count_all(),
                shape: Shape::Scalar {
                    ty: Some(ScalarType::Int),
                },
            }],
        };
        assert!(matches!(
            projection.map_row(vec![Value::Int(1), Value::Int(2)]),
            Err(Error::Mapping(_))
        ));
        assert_eq!(
            projection.map_row(vec![Value::Int(4)]).unwrap(),
            ResultRow::Scalar(Value::Int(4))
        );
    }
}
