//! CRUD Operations - lifecycle operations for entities
//!
//! Lookups build a transient instance from the predicate so keys get
//! encoded, plan them against the table's keys and run a key-condition
//! query. Writes replace the whole item.

use tracing::warn;

use crate::backends::StorageBackend;
use crate::entity::EntityInstance;
use crate::error::{ModelResult, QueryError};
use crate::model::core_trait::Entity;
use crate::planner::{IndexPlanner, PlanResult};
use crate::query::QueryExecutor;
use crate::value::{AttributeValue, Item};

/// Options for [`EntityOperations::find`]
#[derive(Debug, Clone, PartialEq)]
pub struct FindOptions {
    /// Exact-match predicate on attribute values
    pub conditions: Item,
    pub limit: Option<usize>,
    /// Return only the number of matching items
    pub count: bool,
    /// Re-read rows served by a partial-projection index through the primary key
    pub reselect: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            conditions: Item::new(),
            limit: None,
            count: false,
            reselect: true,
        }
    }
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a predicate
    pub fn filter<I, K, V>(conditions: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        Self {
            conditions: conditions
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Add an equality condition
    pub fn where_eq(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.conditions.insert(name.into(), value.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn count_only(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn without_reselect(mut self) -> Self {
        self.reselect = false;
        self
    }
}

/// Result of [`EntityOperations::find`]
#[derive(Debug)]
pub enum FindResult<T> {
    Items(Vec<T>),
    Count(usize),
}

impl<T> FindResult<T> {
    /// Materialized entities, empty for count results
    pub fn into_items(self) -> Vec<T> {
        match self {
            FindResult::Items(items) => items,
            FindResult::Count(_) => Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            FindResult::Items(items) => items.len(),
            FindResult::Count(count) => *count,
        }
    }
}

/// Trait providing lifecycle operations for entities
#[allow(async_fn_in_trait)]
pub trait EntityOperations: Entity {
    /// Build an entity from attribute values without touching storage
    fn build<I, K, V>(values: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        Self::from_instance(EntityInstance::from_values(Self::schema()?, values)?)
    }

    /// Build an entity from attribute values and store it
    async fn create<B, I, K, V>(backend: &B, values: I) -> ModelResult<Self>
    where
        B: StorageBackend + ?Sized,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        let entity = Self::build(values)?;
        entity.save(backend).await?;
        Ok(entity)
    }

    /// Look up entities matching `options.conditions`
    async fn find<B>(backend: &B, options: FindOptions) -> ModelResult<FindResult<Self>>
    where
        B: StorageBackend + ?Sized,
    {
        let schema = Self::schema()?;
        let table = Self::table()?;

        let probe = EntityInstance::from_values(schema.clone(), options.conditions)?;
        let known = probe.attributes();

        let plan = match IndexPlanner::new(&table, &schema).select_key(&known)? {
            PlanResult::Plan(plan) => plan,
            PlanResult::NoPlan => return Err(QueryError::NoQueryableKey.into()),
        };

        let executor = QueryExecutor::new(backend, &table);
        let request = executor.build_request(&plan, &known, options.limit, options.count)?;
        let output = executor.query(request).await?;

        if options.count {
            return Ok(FindResult::Count(output.count));
        }

        let mut items = output.items;
        if plan.reselection && options.reselect {
            let mut full = Vec::with_capacity(items.len());
            for row in items {
                full.push(executor.reselect(row).await?);
            }
            items = full;
        }

        items
            .into_iter()
            .map(|item| {
                EntityInstance::from_item(schema.clone(), item).and_then(Self::from_instance)
            })
            .collect::<ModelResult<Vec<Self>>>()
            .map(FindResult::Items)
    }

    /// Look up entities and return them
    async fn find_all<B>(backend: &B, options: FindOptions) -> ModelResult<Vec<Self>>
    where
        B: StorageBackend + ?Sized,
    {
        let options = FindOptions { count: false, ..options };
        Ok(Self::find(backend, options).await?.into_items())
    }

    /// Look up the single entity matching `conditions`.
    ///
    /// Fails with `AmbiguousResult` when the predicate matches more than one.
    async fn find_one<B>(backend: &B, conditions: Item) -> ModelResult<Option<Self>>
    where
        B: StorageBackend + ?Sized,
    {
        let options = FindOptions {
            conditions,
            limit: Some(2),
            ..FindOptions::default()
        };
        let mut items = Self::find_all(backend, options).await?;
        match items.len() {
            0 => Ok(None),
            1 => Ok(items.pop()),
            count => {
                warn!("find_one matched {} items", count);
                Err(QueryError::AmbiguousResult { count }.into())
            }
        }
    }

    /// Count entities matching `conditions`
    async fn count<B>(backend: &B, conditions: Item) -> ModelResult<usize>
    where
        B: StorageBackend + ?Sized,
    {
        let options = FindOptions {
            conditions,
            count: true,
            ..FindOptions::default()
        };
        Ok(Self::find(backend, options).await?.count())
    }

    /// Write the full attribute snapshot as a single upsert
    async fn save<B>(&self, backend: &B) -> ModelResult<()>
    where
        B: StorageBackend + ?Sized,
    {
        let table = Self::table()?;
        QueryExecutor::new(backend, &table)
            .put(self.instance().attributes())
            .await
    }

    /// Delete this entity's item, addressed by its primary key values
    async fn remove<B>(&self, backend: &B) -> ModelResult<()>
    where
        B: StorageBackend + ?Sized,
    {
        let table = Self::table()?;
        let primary = table.primary_key()?;

        let mut key = Item::new();
        for name in std::iter::once(&primary.key_name).chain(primary.sort_key_name.as_ref()) {
            let value = self
                .instance()
                .get(name)
                .ok_or(QueryError::NoQueryableKey)?;
            key.insert(name.clone(), value);
        }

        QueryExecutor::new(backend, &table).delete(key).await
    }
}

impl<T: Entity> EntityOperations for T {}
