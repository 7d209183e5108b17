//! In-memory storage backend
//!
//! Keeps tables in process memory with DynamoDB-like semantics: items are
//! addressed by their primary key, secondary indexes are sparse and apply
//! their projection to returned rows.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::backends::core::{
    key_attribute, CreateTableRequest, KeySchemaElement, KeyType, ProjectionSpec, QueryOutput,
    QueryRequest, StorageBackend,
};
use crate::error::{BackendError, ModelResult};
use crate::schema::Projection;
use crate::value::{AttributeValue, Item};

type PrimaryKey = (String, String);

#[derive(Debug)]
struct MemoryTable {
    definition: CreateTableRequest,
    items: RwLock<BTreeMap<PrimaryKey, Item>>,
}

impl MemoryTable {
    fn primary_key_of(&self, item: &Item) -> ModelResult<PrimaryKey> {
        let schema = &self.definition.key_schema;
        let hash_name = key_attribute(schema, KeyType::Hash).ok_or_else(|| {
            BackendError::InvalidRequest(format!(
                "table '{}' has no partition key",
                self.definition.table_name
            ))
        })?;
        let hash = required_key_value(item, hash_name)?;
        let range = match key_attribute(schema, KeyType::Range) {
            Some(range_name) => required_key_value(item, range_name)?,
            None => String::new(),
        };
        Ok((hash, range))
    }

    // Table key attributes plus the index keys, plus included attributes
    fn projected_attributes(
        &self,
        index_schema: &[KeySchemaElement],
        projection: &ProjectionSpec,
    ) -> HashSet<String> {
        self.definition
            .key_schema
            .iter()
            .chain(index_schema.iter())
            .map(|element| element.attribute_name.clone())
            .chain(match projection.projection_type {
                Projection::Include => projection.non_key_attributes.clone(),
                _ => Vec::new(),
            })
            .collect()
    }
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: DashMap<String, Arc<MemoryTable>>,
    latency: Option<Duration>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every query by `latency`, to exercise request timeouts
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of items stored in a table
    pub fn item_count(&self, table_name: &str) -> ModelResult<usize> {
        Ok(self.table(table_name)?.items.read().len())
    }

    pub fn has_table(&self, table_name: &str) -> bool {
        self.tables.contains_key(table_name)
    }

    fn table(&self, table_name: &str) -> ModelResult<Arc<MemoryTable>> {
        self.tables
            .get(table_name)
            .map(|table| Arc::clone(table.value()))
            .ok_or_else(|| BackendError::TableNotFound(table_name.to_string()).into())
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn put_item(&self, table_name: &str, item: Item) -> ModelResult<()> {
        self.simulate_latency().await;
        let table = self.table(table_name)?;
        let key = table.primary_key_of(&item)?;
        debug!("Memory put into {}: {:?}", table_name, key);
        table.items.write().insert(key, item);
        Ok(())
    }

    async fn delete_item(&self, table_name: &str, key: Item) -> ModelResult<()> {
        self.simulate_latency().await;
        let table = self.table(table_name)?;
        let key = table.primary_key_of(&key)?;
        debug!("Memory delete from {}: {:?}", table_name, key);
        table.items.write().remove(&key);
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> ModelResult<QueryOutput> {
        self.simulate_latency().await;
        let table = self.table(&request.table_name)?;

        let (key_schema, projection) = match &request.index_name {
            Some(index_name) => {
                let index = table.definition.index(index_name).ok_or_else(|| {
                    BackendError::InvalidRequest(format!(
                        "table '{}' has no index '{}'",
                        request.table_name, index_name
                    ))
                })?;
                (index.key_schema.clone(), Some(index.projection.clone()))
            }
            None => (table.definition.key_schema.clone(), None),
        };

        let conditions = parse_key_condition(
            &request.key_condition_expression,
            &request.expression_attribute_values,
        )?;
        validate_conditions(&conditions, &key_schema)?;

        let range_name = key_attribute(&key_schema, KeyType::Range).map(str::to_string);
        let mut matches: Vec<Item> = {
            let items = table.items.read();
            items
                .values()
                .filter(|item| {
                    key_schema
                        .iter()
                        .all(|element| is_present(item, &element.attribute_name))
                })
                .filter(|item| {
                    conditions
                        .iter()
                        .all(|(name, value)| item.get(name) == Some(value))
                })
                .cloned()
                .collect()
        };

        if request.index_name.is_some() {
            if let Some(range_name) = &range_name {
                matches.sort_by_key(|item| item.get(range_name).map(|v| v.to_string()));
            }
        }
        if let Some(limit) = request.limit {
            matches.truncate(limit);
        }

        let count = matches.len();
        debug!(
            "Memory query on {} (index {:?}) matched {} items",
            request.table_name, request.index_name, count
        );

        if request.count_only {
            return Ok(QueryOutput { items: Vec::new(), count });
        }

        let items = match projection {
            Some(projection) if !projection.projection_type.is_full() => {
                let keep = table.projected_attributes(&key_schema, &projection);
                matches
                    .into_iter()
                    .map(|item| {
                        item.into_iter()
                            .filter(|(name, _)| keep.contains(name))
                            .collect::<Item>()
                    })
                    .collect::<Vec<Item>>()
            }
            _ => matches,
        };

        Ok(QueryOutput { items, count })
    }

    async fn create_table(&self, request: CreateTableRequest) -> ModelResult<()> {
        if self.tables.contains_key(&request.table_name) {
            return Err(BackendError::TableExists(request.table_name).into());
        }
        if key_attribute(&request.key_schema, KeyType::Hash).is_none() {
            return Err(BackendError::InvalidRequest(format!(
                "table '{}' needs a partition key",
                request.table_name
            ))
            .into());
        }
        let name = request.table_name.clone();
        self.tables.insert(
            name,
            Arc::new(MemoryTable {
                definition: request,
                items: RwLock::new(BTreeMap::new()),
            }),
        );
        Ok(())
    }

    async fn delete_table(&self, table_name: &str) -> ModelResult<()> {
        self.tables
            .remove(table_name)
            .map(|_| ())
            .ok_or_else(|| BackendError::TableNotFound(table_name.to_string()).into())
    }
}

fn is_present(item: &Item, name: &str) -> bool {
    item.get(name).is_some_and(|value| !value.is_null())
}

fn required_key_value(item: &Item, name: &str) -> ModelResult<String> {
    item.get(name)
        .filter(|value| !value.is_null())
        .map(|value| value.to_string())
        .ok_or_else(|| {
            BackendError::InvalidRequest(format!("missing key attribute '{}'", name)).into()
        })
}

/// Parse `name = :placeholder [AND name = :placeholder]`
fn parse_key_condition(
    expression: &str,
    values: &HashMap<String, AttributeValue>,
) -> ModelResult<Vec<(String, AttributeValue)>> {
    let tokens: Vec<&str> = expression.split_whitespace().collect();
    let mut conditions = Vec::new();

    for clause in tokens.split(|token| token.eq_ignore_ascii_case("and")) {
        match clause {
            [name, "=", placeholder] => {
                let value = values.get(*placeholder).ok_or_else(|| {
                    BackendError::InvalidRequest(format!(
                        "no value for placeholder '{}'",
                        placeholder
                    ))
                })?;
                conditions.push((name.to_string(), value.clone()));
            }
            _ => {
                return Err(BackendError::InvalidRequest(format!(
                    "unsupported key condition '{}'",
                    expression
                ))
                .into())
            }
        }
    }
    Ok(conditions)
}

fn validate_conditions(
    conditions: &[(String, AttributeValue)],
    key_schema: &[KeySchemaElement],
) -> ModelResult<()> {
    for (name, _) in conditions {
        if !key_schema.iter().any(|element| &element.attribute_name == name) {
            return Err(BackendError::InvalidRequest(format!(
                "'{}' is not a key attribute of the queried table or index",
                name
            ))
            .into());
        }
    }
    let hash = key_attribute(key_schema, KeyType::Hash);
    if !conditions.iter().any(|(name, _)| Some(name.as_str()) == hash) {
        return Err(BackendError::InvalidRequest(
            "key condition must constrain the partition key".to_string(),
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::schema::{KeyDefinition, TableDefinition};

    fn item(pairs: &[(&str, &str)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), AttributeValue::from(*v)))
            .collect()
    }

    async fn backend() -> MemoryBackend {
        let table = TableDefinition::new("T")
            .key(KeyDefinition::new("PK").with_sort_key("SK").primary())
            .unwrap()
            .key(
                KeyDefinition::new("GPK")
                    .with_index("ByName")
                    .with_projection(Projection::KeysOnly),
            )
            .unwrap();
        let backend = MemoryBackend::new();
        backend
            .create_table(table.create_table_request().unwrap())
            .await
            .unwrap();
        backend
    }

    fn query(expression: &str, values: &[(&str, &str)], index: Option<&str>) -> QueryRequest {
        QueryRequest {
            table_name: "T".to_string(),
            index_name: index.map(str::to_string),
            key_condition_expression: expression.to_string(),
            expression_attribute_values: values
                .iter()
                .map(|(k, v)| (k.to_string(), AttributeValue::from(*v)))
                .collect(),
            limit: None,
            count_only: false,
        }
    }

    #[test]
    fn test_parse_key_condition() {
        let values: HashMap<String, AttributeValue> = [
            (":hash_value".to_string(), AttributeValue::from("a")),
            (":range_value".to_string(), AttributeValue::from("b")),
        ]
        .into_iter()
        .collect();
        let conditions =
            parse_key_condition("PK = :hash_value AND SK = :range_value", &values).unwrap();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[1], ("SK".to_string(), AttributeValue::from("b")));

        assert!(parse_key_condition("PK > :hash_value", &values).is_err());
        assert!(parse_key_condition("PK = :missing", &values).is_err());
        assert!(parse_key_condition("", &values).is_err());
    }

    #[tokio::test]
    async fn test_put_and_query_primary() {
        let backend = backend().await;
        backend
            .put_item("T", item(&[("PK", "A"), ("SK", "1"), ("name", "x")]))
            .await
            .unwrap();
        backend
            .put_item("T", item(&[("PK", "A"), ("SK", "2")]))
            .await
            .unwrap();
        backend
            .put_item("T", item(&[("PK", "B"), ("SK", "1")]))
            .await
            .unwrap();

        let output = backend
            .query(query("PK = :hash_value", &[(":hash_value", "A")], None))
            .await
            .unwrap();
        assert_eq!(output.count, 2);
        assert_eq!(output.items[0]["SK"], AttributeValue::from("1"));

        let mut counting = query("PK = :hash_value", &[(":hash_value", "A")], None);
        counting.count_only = true;
        let output = backend.query(counting).await.unwrap();
        assert_eq!(output.count, 2);
        assert!(output.items.is_empty());
    }

    #[tokio::test]
    async fn test_put_replaces_item() {
        let backend = backend().await;
        backend
            .put_item("T", item(&[("PK", "A"), ("SK", "1"), ("name", "x")]))
            .await
            .unwrap();
        backend
            .put_item("T", item(&[("PK", "A"), ("SK", "1"), ("name", "y")]))
            .await
            .unwrap();
        assert_eq!(backend.item_count("T").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_requires_key_attributes() {
        let backend = backend().await;
        let err = backend
            .put_item("T", item(&[("PK", "A")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Backend(BackendError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_sparse_keys_only_index() {
        let backend = backend().await;
        backend
            .put_item(
                "T",
                item(&[("PK", "A"), ("SK", "1"), ("GPK", "N#x"), ("name", "x")]),
            )
            .await
            .unwrap();
        backend
            .put_item("T", item(&[("PK", "B"), ("SK", "1"), ("name", "y")]))
            .await
            .unwrap();

        let output = backend
            .query(query("GPK = :hash_value", &[(":hash_value", "N#x")], Some("ByName")))
            .await
            .unwrap();
        assert_eq!(output.count, 1);
        let row = &output.items[0];
        assert!(row.contains_key("PK"));
        assert!(row.contains_key("SK"));
        assert!(row.contains_key("GPK"));
        assert!(!row.contains_key("name"));
    }

    #[tokio::test]
    async fn test_query_rejects_non_key_condition() {
        let backend = backend().await;
        let err = backend
            .query(query("name = :hash_value", &[(":hash_value", "x")], None))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Backend(BackendError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_table_lifecycle() {
        let backend = backend().await;
        assert!(backend.has_table("T"));

        let again = TableDefinition::new("T")
            .key(KeyDefinition::new("PK").primary())
            .unwrap();
        let err = backend
            .create_table(again.create_table_request().unwrap())
            .await
            .unwrap_err();
        assert_eq!(err, ModelError::Backend(BackendError::TableExists("T".into())));

        backend.delete_table("T").await.unwrap();
        assert!(!backend.has_table("T"));
        let err = backend
            .query(query("PK = :hash_value", &[(":hash_value", "A")], None))
            .await
            .unwrap_err();
        assert_eq!(err, ModelError::Backend(BackendError::TableNotFound("T".into())));
    }
}
