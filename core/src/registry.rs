//! Relation registry: where entity schemas come from.

use indexmap::IndexMap;

use crate::error::{PluckError, Result};
use crate::schema::{EntitySchema, RelationBinding};
use crate::Name;

/// Source of entity and relation metadata.
///
/// Only [`entity`](RelationRegistry::entity) is required; the lookups the
/// engine performs are provided on top of it.
pub trait RelationRegistry {
    fn entity(&self, name: &str) -> Option<&EntitySchema>;

    fn require(&self, name: &str) -> Result<&EntitySchema> {
        self.entity(name)
            .ok_or_else(|| PluckError::UnknownEntity(Name::from(name)))
    }

    fn relations_of(&self, name: &str) -> Result<&IndexMap<Name, RelationBinding>> {
        self.require(name).map(|e| &e.relations)
    }

    fn scalar_fields_of(&self, name: &str) -> Result<&[Name]> {
        self.require(name).map(|e| e.fields.as_slice())
    }
}

impl<R: RelationRegistry + ?Sized> RelationRegistry for &R {
    fn entity(&self, name: &str) -> Option<&EntitySchema> {
        (**self).entity(name)
    }
}

/// A registry held in memory, filled from [`EntitySchema`] builders.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: IndexMap<Name, EntitySchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    pub fn insert(&mut self, entity: EntitySchema) -> Option<EntitySchema> {
        self.entities.insert(entity.name.clone(), entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entities.values()
    }
}

impl RelationRegistry for SchemaRegistry {
    fn entity(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.get(name)
    }
}

#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    registry: SchemaRegistry,
}

impl SchemaRegistryBuilder {
    pub fn entity(mut self, entity: EntitySchema) -> Self {
        self.registry.insert(entity);
        self
    }

    pub fn build(self) -> SchemaRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entities_are_reported_by_name() {
        let registry = SchemaRegistry::builder()
            .entity(EntitySchema::new("Author", "authors").fields(["name"]))
            .build();

        assert_eq!(
            registry.scalar_fields_of("Author").unwrap(),
            &[Name::from("id"), Name::from("name")]
        );
        let err = registry.relations_of("Editor").unwrap_err();
        assert!(matches!(err, PluckError::UnknownEntity(ref n) if n == "Editor"));
    }
}
