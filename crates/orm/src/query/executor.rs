//! Query Executor
//!
//! Turns a key plan into a key-condition query and sends it, together with
//! item writes, to the storage backend. Each backend call is bounded by the
//! table's request timeout and is never retried here.

use std::future::Future;

use tracing::{debug, error, warn};

use crate::backends::{QueryOutput, QueryRequest, StorageBackend};
use crate::error::{BackendError, ModelResult, QueryError};
use crate::planner::KeyPlan;
use crate::query::condition::KeyConditionBuilder;
use crate::schema::TableDefinition;
use crate::value::{AttributeValue, Item};

/// Executes requests for one table against a backend
pub struct QueryExecutor<'a, B: StorageBackend + ?Sized> {
    backend: &'a B,
    table: &'a TableDefinition,
}

impl<'a, B: StorageBackend + ?Sized> QueryExecutor<'a, B> {
    pub fn new(backend: &'a B, table: &'a TableDefinition) -> Self {
        Self { backend, table }
    }

    /// Build a query equating every key of `plan` to its known value
    pub fn build_request(
        &self,
        plan: &KeyPlan,
        known: &Item,
        limit: Option<usize>,
        count_only: bool,
    ) -> ModelResult<QueryRequest> {
        let value_of = |key: &str| -> ModelResult<AttributeValue> {
            known
                .get(key)
                .filter(|value| !value.is_null())
                .cloned()
                .ok_or_else(|| QueryError::NoQueryableKey.into())
        };

        let partition_key = plan.partition_key().ok_or(QueryError::NoQueryableKey)?;
        let mut builder =
            KeyConditionBuilder::new().with_partition_key(partition_key, value_of(partition_key)?);
        if let Some(sort_key) = plan.sort_key() {
            builder = builder.with_sort_key(sort_key, value_of(sort_key)?);
        }
        let (key_condition_expression, expression_attribute_values) = builder.build();

        Ok(QueryRequest {
            table_name: self.table.name().to_string(),
            index_name: plan.index.clone(),
            key_condition_expression,
            expression_attribute_values,
            limit,
            count_only,
        })
    }

    pub async fn query(&self, request: QueryRequest) -> ModelResult<QueryOutput> {
        debug!(
            "Querying {} (index {:?}): {}",
            request.table_name, request.index_name, request.key_condition_expression
        );
        self.bounded(self.backend.query(request)).await
    }

    pub async fn put(&self, item: Item) -> ModelResult<()> {
        debug!("Putting item with {} attributes into {}", item.len(), self.table.name());
        self.bounded(self.backend.put_item(self.table.name(), item)).await
    }

    pub async fn delete(&self, key: Item) -> ModelResult<()> {
        debug!("Deleting item from {}", self.table.name());
        self.bounded(self.backend.delete_item(self.table.name(), key)).await
    }

    /// Re-read a row from a partial index through the table's primary key.
    ///
    /// Returns the row unchanged when its primary key values are not all
    /// present or the item no longer exists.
    pub async fn reselect(&self, row: Item) -> ModelResult<Item> {
        let primary = self.table.primary_key()?;
        let mut keys = vec![primary.key_name.clone()];
        keys.extend(primary.sort_key_name.clone());
        let plan = KeyPlan {
            keys,
            index: None,
            reselection: false,
        };

        let request = match self.build_request(&plan, &row, Some(1), false) {
            Ok(request) => request,
            Err(_) => {
                warn!(
                    "Index row on {} lacks primary key values, returning it as is",
                    self.table.name()
                );
                return Ok(row);
            }
        };
        let output = self.query(request).await?;
        match output.items.into_iter().next() {
            Some(item) => Ok(item),
            None => {
                warn!("Item vanished from {} before reselection", self.table.name());
                Ok(row)
            }
        }
    }

    async fn bounded<T, F>(&self, request: F) -> ModelResult<T>
    where
        F: Future<Output = ModelResult<T>>,
    {
        let timeout = *self.table.config().get_request_timeout();
        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("Backend request on {} failed: {}", self.table.name(), e);
                Err(e)
            }
            Err(_) => {
                error!("Backend request on {} timed out after {:?}", self.table.name(), timeout);
                Err(BackendError::Timeout { after: timeout }.into())
            }
        }
    }
}
