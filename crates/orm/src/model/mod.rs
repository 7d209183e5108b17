//! Model System - entity trait and lifecycle operations
//!
//! - `core_trait`: the `Entity` trait implemented by entity types
//! - `crud_operations`: create, find, find_one, count, save and remove

pub mod core_trait;
pub mod crud_operations;

pub use core_trait::Entity;
pub use crud_operations::{EntityOperations, FindOptions, FindResult};
