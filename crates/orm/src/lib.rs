//! # dynamap-orm: single-table key mapping for DynamoDB
//!
//! Declare once how an entity's fields compose into partition and sort
//! keys, then let the ORM keep attribute values and key strings in sync and
//! pick the key or secondary index that can answer a lookup.
//!
//! - `schema`: entity schemas, key definitions and tables
//! - `codec`: composite key encoding and decoding
//! - `entity`: entity instances and their synchronization rules
//! - `planner`: index selection for exact-match lookups
//! - `query`: key-condition queries and their execution
//! - `model`: the `Entity` trait and lifecycle operations
//! - `backends`: the storage backend contract and an in-memory backend

pub mod backends;
pub mod codec;
pub mod config;
pub mod entity;
pub mod error;
pub mod model;
pub mod planner;
pub mod query;
pub mod schema;
pub mod value;

// Re-export core traits and types
pub use backends::{MemoryBackend, QueryOutput, QueryRequest, StorageBackend};
pub use config::{SortKeyRule, TableConfig, TableConfigBuilder};
pub use entity::EntityInstance;
pub use error::*;
pub use model::*;
pub use planner::{select_key, IndexPlanner, KeyPlan, PlanResult};
pub use schema::*;
pub use value::{AttributeValue, Item};
