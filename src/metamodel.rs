//! External metamodel the engine consumes: entities, their fields, and their
//! relationships.
//!
//! The engine never generates this description; the surrounding application
//! supplies it, usually once at startup. [`Registry`] is a plain in-memory
//! implementation of the [`Metamodel`] provider trait for applications (and
//! tests) that assemble the description by hand.

use std::sync::Arc;

use compact_str::{CompactString, ToCompactString};
use hashbrown::HashMap;

use crate::value::ScalarType;

/// A scalar field of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: CompactString,
    pub column: CompactString,
    pub ty: ScalarType,
}

/// Which side of a relationship holds the foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// This entity holds the FK column referencing the target's primary key.
    ManyToOne { fk_column: CompactString },
    /// The target entity holds the FK column referencing this entity's
    /// primary key.
    OneToMany { remote_fk_column: CompactString },
}

/// A named relationship to another entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    pub name: CompactString,
    pub target: CompactString,
    pub ownership: Ownership,
}

/// Static description of one entity type: table, primary key, fields,
/// relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDef {
    name: CompactString,
    table: CompactString,
    primary_key: CompactString,
    fields: Vec<FieldDef>,
    relations: Vec<RelationDef>,
}

impl EntityDef {
    /// Starts a definition. The primary key defaults to `id`; override with
    /// [`EntityDef::primary_key`].
    pub fn new(name: impl AsRef<str>, table: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_compact_string(),
            table: table.as_ref().to_compact_string(),
            primary_key: CompactString::const_new("id"),
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn primary_key(mut self, column: impl AsRef<str>) -> Self {
        self.primary_key = column.as_ref().to_compact_string();
        self
    }

    /// Adds a field whose column name equals its field name.
    pub fn field(self, name: impl AsRef<str>, ty: ScalarType) -> Self {
        let column = name.as_ref().to_compact_string();
        self.field_as(name, column, ty)
    }

    /// Adds a field with an explicit column name.
    pub fn field_as(
        mut self,
        name: impl AsRef<str>,
        column: impl AsRef<str>,
        ty: ScalarType,
    ) -> Self {
        self.fields.push(FieldDef {
            name: name.as_ref().to_compact_string(),
            column: column.as_ref().to_compact_string(),
            ty,
        });
        self
    }

    /// Adds an owning relationship: this entity carries `fk_column`.
    pub fn many_to_one(
        mut self,
        name: impl AsRef<str>,
        target: impl AsRef<str>,
        fk_column: impl AsRef<str>,
    ) -> Self {
        self.relations.push(RelationDef {
            name: name.as_ref().to_compact_string(),
            target: target.as_ref().to_compact_string(),
            ownership: Ownership::ManyToOne {
                fk_column: fk_column.as_ref().to_compact_string(),
            },
        });
        self
    }

    /// Adds an inverse relationship: the target carries `remote_fk_column`.
    pub fn one_to_many(
        mut self,
        name: impl AsRef<str>,
        target: impl AsRef<str>,
        remote_fk_column: impl AsRef<str>,
    ) -> Self {
        self.relations.push(RelationDef {
            name: name.as_ref().to_compact_string(),
            target: target.as_ref().to_compact_string(),
            ownership: Ownership::OneToMany {
                remote_fk_column: remote_fk_column.as_ref().to_compact_string(),
            },
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key_column(&self) -> &str {
        &self.primary_key
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn relations(&self) -> &[RelationDef] {
        &self.relations
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relation_def(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// Read-only provider of entity descriptions.
///
/// Queried during path construction and entity-result mapping. Implementations
/// must be cheap to call; the engine performs no caching of its own.
pub trait Metamodel: Send + Sync {
    fn describe(&self, entity: &str) -> Option<&EntityDef>;
}

impl<M: Metamodel + ?Sized> Metamodel for Arc<M> {
    fn describe(&self, entity: &str) -> Option<&EntityDef> {
        (**self).describe(entity)
    }
}

/// In-memory [`Metamodel`] built by registering [`EntityDef`]s.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entities: HashMap<CompactString, EntityDef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, def: EntityDef) -> Self {
        self.entities.insert(def.name.clone(), def);
        self
    }
}

impl Metamodel for Registry {
    fn describe(&self, entity: &str) -> Option<&EntityDef> {
        self.entities.get(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_by_entity_name() {
        let registry = Registry::new().register(
            EntityDef::new("Member", "member")
                .field("id", ScalarType::Int)
                .field("username", ScalarType::Text)
                .many_to_one("team", "Team", "team_id"),
        );

        let member = registry.describe("Member").unwrap();
        assert_eq!(member.table(), "member");
        assert_eq!(member.field_def("username").unwrap().ty, ScalarType::Text);
        assert_eq!(member.relation_def("team").unwrap().target, "Team");
        assert!(registry.describe("Order").is_none());
    }
}
