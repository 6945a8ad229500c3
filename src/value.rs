//! Runtime values and the scalar type families used for construction-time
//! type checking.

use core::fmt;

use compact_str::{CompactString, ToCompactString};

/// A runtime value: a bound parameter going out, or a cell coming back.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(CompactString),
    Bytes(Vec<u8>),
}

impl Value {
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The scalar family of this value, or `None` for NULL.
    pub const fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ScalarType::Bool),
            Value::Int(_) => Some(ScalarType::Int),
            Value::Float(_) => Some(ScalarType::Float),
            Value::Text(_) => Some(ScalarType::Text),
            Value::Bytes(_) => Some(ScalarType::Bytes),
        }
    }

    #[inline]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the numeric value widened to `f64` for INT and FLOAT.
    #[inline]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            Value::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_ref()),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => write!(f, "'{value}'"),
            Value::Bytes(value) => write!(f, "<{} bytes>", value.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_compact_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(CompactString::from(value))
    }
}

impl From<CompactString> for Value {
    fn from(value: CompactString) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Scalar type families. INT and FLOAT form one numeric family for
/// comparability purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
}

impl ScalarType {
    #[inline]
    pub const fn is_numeric(self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Float)
    }

    /// Whether two scalar families may appear on opposite sides of a
    /// comparison.
    pub const fn comparable_with(self, other: ScalarType) -> bool {
        matches!(
            (self, other),
            (ScalarType::Bool, ScalarType::Bool)
                | (ScalarType::Text, ScalarType::Text)
                | (ScalarType::Bytes, ScalarType::Bytes)
        ) || (self.is_numeric() && other.is_numeric())
    }

    pub const fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "BOOL",
            ScalarType::Int => "INT",
            ScalarType::Float => "FLOAT",
            ScalarType::Text => "TEXT",
            ScalarType::Bytes => "BYTES",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a path or expression produces: a scalar cell or a whole entity row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    Scalar(ScalarType),
    Entity(CompactString),
}

impl DeclaredType {
    #[inline]
    pub const fn as_scalar(&self) -> Option<ScalarType> {
        match self {
            DeclaredType::Scalar(ty) => Some(*ty),
            DeclaredType::Entity(_) => None,
        }
    }

    #[inline]
    pub const fn is_entity(&self) -> bool {
        matches!(self, DeclaredType::Entity(_))
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Scalar(ty) => write!(f, "{ty}"),
            DeclaredType::Entity(name) => write!(f, "entity `{name}`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_families_are_mutually_comparable() {
        assert!(ScalarType::Int.comparable_with(ScalarType::Float));
        assert!(ScalarType::Float.comparable_with(ScalarType::Int));
        assert!(!ScalarType::Int.comparable_with(ScalarType::Text));
        assert!(!ScalarType::Bool.comparable_with(ScalarType::Int));
    }

    #[test]
    fn null_has_no_scalar_type() {
        assert_eq!(Value::Null.scalar_type(), None);
        assert_eq!(Value::from(Some(3)).scalar_type(), Some(ScalarType::Int));
        assert_eq!(Value::from(None::<i64>).scalar_type(), None);
    }
}
