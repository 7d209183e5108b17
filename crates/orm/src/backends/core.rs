//! Core Storage Backend Traits
//!
//! The key-value store behind the ORM is an external collaborator. This
//! module defines the requests the ORM issues and the trait a store must
//! implement to answer them.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::schema::Projection;
use crate::value::{AttributeValue, Item};

/// Abstract key-value storage backend
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Insert or replace a whole item
    async fn put_item(&self, table_name: &str, item: Item) -> ModelResult<()>;

    /// Delete the item identified by its primary key attributes
    async fn delete_item(&self, table_name: &str, key: Item) -> ModelResult<()>;

    /// Run a key-condition query against the table or one of its indexes
    async fn query(&self, request: QueryRequest) -> ModelResult<QueryOutput>;

    /// Create a table with its key schema and secondary indexes
    async fn create_table(&self, request: CreateTableRequest) -> ModelResult<()>;

    /// Delete a table and its items
    async fn delete_table(&self, table_name: &str) -> ModelResult<()>;
}

/// Key-condition query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub table_name: String,
    pub index_name: Option<String>,
    pub key_condition_expression: String,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    pub limit: Option<usize>,
    pub count_only: bool,
}

/// Query result. `items` is empty for count-only queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
    pub items: Vec<Item>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    Hash,
    Range,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Hash => write!(f, "HASH"),
            KeyType::Range => write!(f, "RANGE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

/// Attribute declared in a table's key schema. Key attributes are strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: String,
}

impl AttributeDefinition {
    pub fn string(name: &str) -> Self {
        Self {
            attribute_name: name.to_string(),
            attribute_type: "S".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedThroughput {
    pub read_capacity_units: u32,
    pub write_capacity_units: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionSpec {
    pub projection_type: Projection,
    pub non_key_attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSecondaryIndex {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: ProjectionSpec,
    pub provisioned_throughput: ProvisionedThroughput,
}

/// Table creation request derived from a table's key definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTableRequest {
    pub table_name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    pub provisioned_throughput: ProvisionedThroughput,
    pub global_secondary_indexes: Vec<GlobalSecondaryIndex>,
    pub stream_enabled: bool,
}

impl CreateTableRequest {
    pub fn index(&self, index_name: &str) -> Option<&GlobalSecondaryIndex> {
        self.global_secondary_indexes
            .iter()
            .find(|gsi| gsi.index_name == index_name)
    }
}

/// Attribute name of the given role within a key schema
pub fn key_attribute(schema: &[KeySchemaElement], key_type: KeyType) -> Option<&str> {
    schema
        .iter()
        .find(|element| element.key_type == key_type)
        .map(|element| element.attribute_name.as_str())
}
