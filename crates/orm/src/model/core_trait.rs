//! Core Entity Trait - Base definition for persisted entity types
//!
//! An entity type exposes its frozen schema and table and wraps an
//! [`EntityInstance`] holding the current values.

use std::sync::Arc;

use crate::entity::EntityInstance;
use crate::error::ModelResult;
use crate::schema::{EntitySchema, TableDefinition};

/// Core trait for entity types stored in a single table
pub trait Entity: Sized + Send + Sync {
    /// Schema shared by every instance of this type
    fn schema() -> ModelResult<Arc<EntitySchema>>;

    /// Table this type is stored in
    fn table() -> ModelResult<Arc<TableDefinition>>;

    /// Wrap an instance materialized by the ORM
    fn from_instance(instance: EntityInstance) -> ModelResult<Self>;

    fn instance(&self) -> &EntityInstance;

    fn instance_mut(&mut self) -> &mut EntityInstance;

    /// Entity name as declared in the schema
    fn entity_name() -> ModelResult<String> {
        Ok(Self::schema()?.entity_name().to_string())
    }
}
