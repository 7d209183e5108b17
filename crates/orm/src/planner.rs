//! Index selection
//!
//! Given the attribute values known for a lookup, pick the key that can
//! answer it with an equality key condition:
//!
//! 1. the primary key, when its pair resolves
//! 2. secondary indexes with an `ALL` projection
//! 3. secondary indexes with a partial projection, flagged for reselection
//!
//! Indexes are tried in descending read weight. The weight is the capacity
//! declared at design time, not a measured cost; it only breaks ties.

use tracing::debug;

use crate::error::ModelResult;
use crate::schema::{EntitySchema, KeyDefinition, TableDefinition};
use crate::value::Item;

pub use crate::config::SortKeyRule;

/// Keys chosen to answer a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPlan {
    /// Partition key, then the sort key if the pair uses one
    pub keys: Vec<String>,
    /// Secondary index to query, `None` for the primary key
    pub index: Option<String>,
    /// Rows may lack attributes and need a follow-up full-item fetch
    pub reselection: bool,
}

impl KeyPlan {
    pub fn partition_key(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.keys.get(1).map(String::as_str)
    }

    pub fn uses_primary_key(&self) -> bool {
        self.index.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanResult {
    Plan(KeyPlan),
    NoPlan,
}

impl PlanResult {
    pub fn into_plan(self) -> Option<KeyPlan> {
        match self {
            PlanResult::Plan(plan) => Some(plan),
            PlanResult::NoPlan => None,
        }
    }
}

/// Chooses a key of `table` for lookups on entities of `schema`
#[derive(Debug, Clone, Copy)]
pub struct IndexPlanner<'a> {
    table: &'a TableDefinition,
    schema: &'a EntitySchema,
    rule: SortKeyRule,
}

impl<'a> IndexPlanner<'a> {
    pub fn new(table: &'a TableDefinition, schema: &'a EntitySchema) -> Self {
        Self {
            table,
            schema,
            rule: *table.config().get_sort_key_rule(),
        }
    }

    pub fn with_rule(mut self, rule: SortKeyRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn select_key(&self, known: &Item) -> ModelResult<PlanResult> {
        let primary = self.table.primary_key()?;
        if let Some(keys) = self.try_pair(primary, known) {
            debug!("Planner chose primary key {:?} on {}", keys, self.table.name());
            return Ok(PlanResult::Plan(KeyPlan {
                keys,
                index: None,
                reselection: false,
            }));
        }

        let indexes = self.table.secondary_indexes();
        let full = indexes.iter().filter(|k| k.projection.is_full());
        let partial = indexes.iter().filter(|k| !k.projection.is_full());

        let candidates = full.map(|k| (k, false)).chain(partial.map(|k| (k, true)));
        for (definition, reselection) in candidates {
            if let Some(keys) = self.try_pair(definition, known) {
                debug!(
                    "Planner chose index {:?} with keys {:?} on {} (reselection: {})",
                    definition.index_name,
                    keys,
                    self.table.name(),
                    reselection
                );
                return Ok(PlanResult::Plan(KeyPlan {
                    keys,
                    index: definition.index_name.clone(),
                    reselection,
                }));
            }
        }

        debug!("Planner found no key for {} on {}", self.schema.entity_name(), self.table.name());
        Ok(PlanResult::NoPlan)
    }

    fn try_pair(&self, definition: &KeyDefinition, known: &Item) -> Option<Vec<String>> {
        if !is_known(known, &definition.key_name) {
            return None;
        }
        let partition = definition.key_name.clone();
        let sort_key = match &definition.sort_key_name {
            None => return Some(vec![partition]),
            Some(sort_key) => sort_key,
        };
        let sort_known = is_known(known, sort_key);

        match self.rule {
            SortKeyRule::AsObserved if self.schema.is_key(sort_key) => {
                sort_known.then(|| vec![partition, sort_key.clone()])
            }
            SortKeyRule::AsObserved => (!sort_known).then(|| vec![partition]),
            SortKeyRule::PartitionFallback if sort_known => Some(vec![partition, sort_key.clone()]),
            SortKeyRule::PartitionFallback => Some(vec![partition]),
        }
    }
}

/// Plan a lookup with the table's configured sort key rule
pub fn select_key(
    table: &TableDefinition,
    schema: &EntitySchema,
    known: &Item,
) -> ModelResult<PlanResult> {
    IndexPlanner::new(table, schema).select_key(known)
}

fn is_known(known: &Item, name: &str) -> bool {
    known.get(name).is_some_and(|value| !value.is_null())
}
