//! Process-wide storage for frozen definitions
//!
//! Entity types keep their schema and table in a static `DefinitionCell`,
//! initialized on first use and shared afterwards.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::ModelResult;

/// Lazily initialized, immutable definition shared by an entity type
#[derive(Debug)]
pub struct DefinitionCell<T> {
    inner: OnceCell<Arc<T>>,
}

impl<T> DefinitionCell<T> {
    pub const fn new() -> Self {
        Self {
            inner: OnceCell::new(),
        }
    }

    /// Return the definition, building it on first access.
    ///
    /// A failed build is not cached; the next access retries it.
    pub fn get_or_try_init<F>(&self, init: F) -> ModelResult<Arc<T>>
    where
        F: FnOnce() -> ModelResult<T>,
    {
        self.inner
            .get_or_try_init(|| init().map(Arc::new))
            .map(Arc::clone)
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.inner.get().cloned()
    }
}

impl<T> Default for DefinitionCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
