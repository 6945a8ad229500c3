//! Typed handles to entity roots, columns, and relationship traversals.
//!
//! A [`Path`] is an immutable value: extending it returns a new path, and two
//! paths built from identical arguments are structurally equal regardless of
//! which metamodel handle they carry.

use core::fmt;
use std::sync::Arc;

use compact_str::{CompactString, ToCompactString};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::metamodel::{EntityDef, Metamodel};
use crate::value::{DeclaredType, ScalarType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    /// Traversal to a related entity.
    Relation {
        name: CompactString,
        target: CompactString,
    },
    /// Terminal scalar field. Nothing can be appended after this.
    Field {
        name: CompactString,
        column: CompactString,
        ty: ScalarType,
    },
}

/// A typed location: a root entity, a relationship traversal, or a column.
#[derive(Clone)]
pub struct Path {
    meta: Arc<dyn Metamodel>,
    root_entity: CompactString,
    alias: CompactString,
    segments: SmallVec<[Segment; 2]>,
}

impl Path {
    /// Creates a root path over `entity`, aliased for rendering.
    pub fn root(meta: Arc<dyn Metamodel>, entity: &str, alias: &str) -> Result<Path> {
        if meta.describe(entity).is_none() {
            return Err(Error::UnknownEntity(entity.to_string()));
        }
        Ok(Path {
            meta,
            root_entity: entity.to_compact_string(),
            alias: alias.to_compact_string(),
            segments: SmallVec::new(),
        })
    }

    /// Extends this path with a scalar field of the current entity.
    pub fn field(&self, name: &str) -> Result<Path> {
        let def = self.entity_def_or(|| Error::UnknownField {
            entity: self.to_string(),
            field: name.to_string(),
        })?;
        let field = def.field_def(name).ok_or_else(|| Error::UnknownField {
            entity: def.name().to_string(),
            field: name.to_string(),
        })?;
        let mut path = self.clone();
        path.segments.push(Segment::Field {
            name: field.name.clone(),
            column: field.column.clone(),
            ty: field.ty,
        });
        Ok(path)
    }

    /// Extends this path with a relationship traversal. The result's declared
    /// type is the related entity type.
    pub fn relate(&self, name: &str) -> Result<Path> {
        let def = self.entity_def_or(|| Error::UnknownRelation {
            entity: self.to_string(),
            relation: name.to_string(),
        })?;
        let relation = def
            .relation_def(name)
            .ok_or_else(|| Error::UnknownRelation {
                entity: def.name().to_string(),
                relation: name.to_string(),
            })?;
        let mut path = self.clone();
        path.segments.push(Segment::Relation {
            name: relation.name.clone(),
            target: relation.target.clone(),
        });
        Ok(path)
    }

    /// The entity type or scalar family this path produces.
    pub fn declared_type(&self) -> DeclaredType {
        match self.segments.last() {
            Some(Segment::Field { ty, .. }) => DeclaredType::Scalar(*ty),
            Some(Segment::Relation { target, .. }) => DeclaredType::Entity(target.clone()),
            None => DeclaredType::Entity(self.root_entity.clone()),
        }
    }

    /// Whether this path denotes a whole entity (root or relation traversal).
    pub fn is_entity(&self) -> bool {
        !matches!(self.segments.last(), Some(Segment::Field { .. }))
    }

    /// The alias of the root this path hangs off.
    pub fn root_alias(&self) -> &str {
        &self.alias
    }

    pub fn root_entity(&self) -> &str {
        &self.root_entity
    }

    /// Name of the entity this path currently points at, `None` if it has
    /// already descended to a scalar field.
    fn current_entity(&self) -> Option<&str> {
        match self.segments.last() {
            Some(Segment::Field { .. }) => None,
            Some(Segment::Relation { target, .. }) => Some(target),
            None => Some(&self.root_entity),
        }
    }

    /// Definition of the entity this path points at.
    pub(crate) fn entity_def(&self) -> Result<&EntityDef> {
        self.entity_def_or(|| {
            Error::UnsupportedConstruct(format!("scalar path `{self}` used as an entity"))
        })
    }

    fn entity_def_or(&self, err: impl FnOnce() -> Error) -> Result<&EntityDef> {
        let Some(entity) = self.current_entity() else {
            return Err(err());
        };
        self.meta
            .describe(entity)
            .ok_or_else(|| Error::UnknownEntity(entity.to_string()))
    }

    /// Splits a scalar path into its entity base plus column and type.
    pub(crate) fn split_field(&self) -> Option<(Path, CompactString, ScalarType)> {
        match self.segments.last() {
            Some(Segment::Field { column, ty, .. }) => {
                let mut base = self.clone();
                base.segments.pop();
                Some((base, column.clone(), *ty))
            }
            _ => None,
        }
    }

    /// Splits a relation path into its parent plus the relation name.
    pub(crate) fn split_relation(&self) -> Option<(Path, CompactString)> {
        match self.segments.last() {
            Some(Segment::Relation { name, .. }) => {
                let mut parent = self.clone();
                parent.segments.pop();
                Some((parent, name.clone()))
            }
            _ => None,
        }
    }

    pub(crate) fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl PartialEq for Path {
    /// Structural equality: same root and traversal chain. The metamodel
    /// handle does not participate.
    fn eq(&self, other: &Self) -> bool {
        self.root_entity == other.root_entity
            && self.alias == other.alias
            && self.segments == other.segments
    }
}

impl Eq for Path {}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.alias)?;
        for segment in &self.segments {
            match segment {
                Segment::Relation { name, .. } | Segment::Field { name, .. } => {
                    write!(f, ".{name}")?;
                }
            }
        }
        Ok(())
    }
}
