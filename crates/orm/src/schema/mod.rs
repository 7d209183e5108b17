//! Schema Registry
//!
//! - `key`: key definitions, projections and key components
//! - `builder`: declaration operations producing an immutable schema
//! - `entity_schema`: the frozen per-entity schema and its key arrays
//! - `table`: table definitions and create/delete metadata
//! - `cell`: static storage for frozen definitions

pub mod builder;
pub mod cell;
pub mod entity_schema;
pub mod key;
pub mod table;

pub use builder::{SchemaBuilder, DEFAULT_PRIORITY};
pub use cell::DefinitionCell;
pub use entity_schema::{EntitySchema, KeyArray};
pub use key::{KeyComponent, KeyDefinition, Projection, DEFAULT_CAPACITY};
pub use table::TableDefinition;
