//! Query building and execution

pub mod condition;
pub mod executor;

pub use condition::{KeyConditionBuilder, HASH_PLACEHOLDER, RANGE_PLACEHOLDER};
pub use executor::QueryExecutor;
