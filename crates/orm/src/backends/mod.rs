//! Storage Backend Abstractions
//!
//! The ORM talks to storage through [`StorageBackend`]. An in-memory
//! implementation is provided for tests and local development.

pub mod core;
pub mod memory;

pub use self::core::*;
pub use memory::MemoryBackend;
