//! Static entity metadata: descriptors are built once at startup (usually
//! as `static` items) and referenced by queries for the life of the
//! process. No runtime reflection is involved anywhere.

use crate::{error::Error, expr::Column, value::ValueKind};
use serde::Serialize;

///
/// EntityModel
///
/// Immutable description of one storage entity: its name, typed fields,
/// primary-key field, and association paths to other entities.
///

#[derive(Debug, Eq, PartialEq, Serialize)]
pub struct EntityModel {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub fields: &'static [EntityFieldModel],
    pub associations: &'static [AssociationModel],
}

impl EntityModel {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&EntityFieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First declared association whose target is `entity_name`.
    #[must_use]
    pub fn association_to(&self, entity_name: &str) -> Option<&AssociationModel> {
        self.associations.iter().find(|a| a.target == entity_name)
    }
}

///
/// EntityFieldModel
///

#[derive(Debug, Eq, PartialEq, Serialize)]
pub struct EntityFieldModel {
    pub name: &'static str,
    pub kind: ValueKind,
}

///
/// AssociationModel
///
/// A foreign-key-backed path from this entity to another. Joins without
/// such a path must carry an explicit ON predicate.
///

#[derive(Debug, Eq, PartialEq, Serialize)]
pub struct AssociationModel {
    pub name: &'static str,
    /// Entity name of the association target.
    pub target: &'static str,
    /// Field on the declaring entity.
    pub local_field: &'static str,
    /// Field on the target entity.
    pub foreign_field: &'static str,
}

///
/// EntityRef
///
/// Aliased reference to an entity within one query. The alias scopes
/// column references, so the same entity can appear twice (self-joins,
/// subqueries) under distinct aliases.
///

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EntityRef {
    pub model: &'static EntityModel,
    pub alias: &'static str,
}

impl EntityRef {
    /// Reference an entity under its own name as the alias.
    #[must_use]
    pub const fn new(model: &'static EntityModel) -> Self {
        Self {
            model,
            alias: model.name,
        }
    }

    /// Reference an entity under an explicit alias.
    #[must_use]
    pub const fn aliased(model: &'static EntityModel, alias: &'static str) -> Self {
        Self { model, alias }
    }

    /// Every declared field as a typed column under this alias, in
    /// declaration order.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        self.model
            .fields
            .iter()
            .map(|f| Column::new(self.alias, f.name, f.kind))
            .collect()
    }

    /// Resolve a typed column for `field`, or fail if the entity does
    /// not declare it. Hand-written descriptors wrap this per field.
    pub fn column(&self, field: &str) -> Result<Column, Error> {
        self.model
            .field(field)
            .map(|f| Column::new(self.alias, f.name, f.kind))
            .ok_or_else(|| Error::UnknownField {
                entity: self.model.name,
                field: field.to_string(),
            })
    }
}
