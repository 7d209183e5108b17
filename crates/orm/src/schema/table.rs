//! Table definitions
//!
//! A table owns the list of keys declared on it and derives the metadata a
//! storage backend needs to create or delete it.

use tracing::{error, info};

use crate::backends::{
    AttributeDefinition, CreateTableRequest, GlobalSecondaryIndex, KeySchemaElement, KeyType,
    ProjectionSpec, ProvisionedThroughput, StorageBackend,
};
use crate::config::TableConfig;
use crate::error::{ModelResult, SchemaError};
use crate::schema::key::KeyDefinition;

/// A table and the keys declared on it
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    name: String,
    keys: Vec<KeyDefinition>,
    config: TableConfig,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
            config: TableConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a key definition. At most one may be primary.
    pub fn declare_key_definition(&mut self, definition: KeyDefinition) -> ModelResult<&mut Self> {
        if definition.is_primary && self.keys.iter().any(|k| k.is_primary) {
            return Err(SchemaError::DuplicatePrimaryKey {
                table: self.name.clone(),
            }
            .into());
        }
        self.keys.push(definition);
        Ok(self)
    }

    /// Chaining form of [`declare_key_definition`](Self::declare_key_definition)
    pub fn key(mut self, definition: KeyDefinition) -> ModelResult<Self> {
        self.declare_key_definition(definition)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key definitions in declaration order
    pub fn keys(&self) -> &[KeyDefinition] {
        &self.keys
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn primary_key(&self) -> ModelResult<&KeyDefinition> {
        self.keys.iter().find(|k| k.is_primary).ok_or_else(|| {
            SchemaError::MissingPrimaryKey {
                table: self.name.clone(),
            }
            .into()
        })
    }

    /// Secondary indexes ordered by descending read weight, ties in declaration order
    pub fn secondary_indexes(&self) -> Vec<&KeyDefinition> {
        let mut indexes: Vec<&KeyDefinition> =
            self.keys.iter().filter(|k| k.is_secondary_index()).collect();
        indexes.sort_by(|a, b| b.read_weight.cmp(&a.read_weight));
        indexes
    }

    pub fn key_definition(&self, key_name: &str) -> Option<&KeyDefinition> {
        self.keys.iter().find(|k| k.key_name == key_name)
    }

    pub fn index(&self, index_name: &str) -> Option<&KeyDefinition> {
        self.keys
            .iter()
            .find(|k| k.index_name.as_deref() == Some(index_name))
    }

    /// Build the backend request that creates this table
    pub fn create_table_request(&self) -> ModelResult<CreateTableRequest> {
        let primary = self.primary_key()?;

        let global_secondary_indexes: Vec<GlobalSecondaryIndex> = self
            .keys
            .iter()
            .filter(|k| k.is_secondary_index())
            .filter_map(|k| {
                k.index_name.as_ref().map(|index_name| GlobalSecondaryIndex {
                    index_name: index_name.clone(),
                    key_schema: key_schema(k),
                    projection: ProjectionSpec {
                        projection_type: k.projection,
                        non_key_attributes: k.projected_attributes.clone(),
                    },
                    provisioned_throughput: throughput(k),
                })
            })
            .collect();

        // Only attributes used by some key schema may be defined
        let mut attribute_definitions: Vec<AttributeDefinition> = Vec::new();
        let key_schemas = std::iter::once(key_schema(primary))
            .chain(global_secondary_indexes.iter().map(|gsi| gsi.key_schema.clone()));
        for element in key_schemas.flatten() {
            if !attribute_definitions
                .iter()
                .any(|d| d.attribute_name == element.attribute_name)
            {
                attribute_definitions.push(AttributeDefinition::string(&element.attribute_name));
            }
        }

        Ok(CreateTableRequest {
            table_name: self.name.clone(),
            attribute_definitions,
            key_schema: key_schema(primary),
            provisioned_throughput: throughput(primary),
            global_secondary_indexes,
            stream_enabled: *self.config.get_stream_enabled(),
        })
    }

    /// Create this table on the backend
    pub async fn create<B: StorageBackend + ?Sized>(&self, backend: &B) -> ModelResult<()> {
        let request = self.create_table_request()?;
        match backend.create_table(request).await {
            Ok(()) => {
                info!("Created table: {}", self.name);
                Ok(())
            }
            Err(e) => {
                error!("Error creating table {}: {}", self.name, e);
                Err(e)
            }
        }
    }

    /// Delete this table from the backend
    pub async fn delete<B: StorageBackend + ?Sized>(&self, backend: &B) -> ModelResult<()> {
        match backend.delete_table(&self.name).await {
            Ok(()) => {
                info!("Deleted table: {}", self.name);
                Ok(())
            }
            Err(e) => {
                error!("Error deleting table {}: {}", self.name, e);
                Err(e)
            }
        }
    }
}

fn key_schema(definition: &KeyDefinition) -> Vec<KeySchemaElement> {
    let mut schema = vec![KeySchemaElement {
        attribute_name: definition.key_name.clone(),
        key_type: KeyType::Hash,
    }];
    if let Some(sort_key) = &definition.sort_key_name {
        schema.push(KeySchemaElement {
            attribute_name: sort_key.clone(),
            key_type: KeyType::Range,
        });
    }
    schema
}

fn throughput(definition: &KeyDefinition) -> ProvisionedThroughput {
    ProvisionedThroughput {
        read_capacity_units: definition.read_weight,
        write_capacity_units: definition.write_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::schema::key::Projection;

    fn single_table() -> TableDefinition {
        TableDefinition::new("TestTable")
            .key(KeyDefinition::new("PK").with_sort_key("SK").primary())
            .unwrap()
            .key(KeyDefinition::new("SK").with_sort_key("PK").with_index("InvertedIndex"))
            .unwrap()
            .key(
                KeyDefinition::new("GPK")
                    .with_sort_key("GSK")
                    .with_index("GSIOne")
                    .with_projection(Projection::KeysOnly)
                    .with_capacity(5, 2),
            )
            .unwrap()
            .key(KeyDefinition::new("GSK"))
            .unwrap()
    }

    #[test]
    fn test_duplicate_primary_key_fails() {
        let err = TableDefinition::new("T")
            .key(KeyDefinition::new("PK").primary())
            .unwrap()
            .key(KeyDefinition::new("PK2").primary())
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::Schema(SchemaError::DuplicatePrimaryKey { table: "T".into() })
        );
    }

    #[test]
    fn test_missing_primary_key() {
        let table = TableDefinition::new("T")
            .key(KeyDefinition::new("GPK").with_index("GSI"))
            .unwrap();
        assert!(matches!(
            table.primary_key(),
            Err(ModelError::Schema(SchemaError::MissingPrimaryKey { .. }))
        ));
        assert!(table.create_table_request().is_err());
    }

    #[test]
    fn test_secondary_index_order() {
        let table = TableDefinition::new("T")
            .key(KeyDefinition::new("PK").primary())
            .unwrap()
            .key(KeyDefinition::new("A").with_index("IA").with_capacity(5, 1))
            .unwrap()
            .key(KeyDefinition::new("B").with_index("IB").with_capacity(10, 1))
            .unwrap()
            .key(KeyDefinition::new("C").with_index("IC").with_capacity(5, 1))
            .unwrap();
        let names: Vec<&str> = table
            .secondary_indexes()
            .into_iter()
            .map(|k| k.key_name.as_str())
            .collect();
        assert_eq!(names, ["B", "A", "C"]);
    }

    #[test]
    fn test_create_table_request() {
        let request = single_table().create_table_request().unwrap();
        assert_eq!(request.table_name, "TestTable");
        assert_eq!(request.attribute_definitions.len(), 4);
        assert_eq!(request.key_schema.len(), 2);
        assert_eq!(request.key_schema[0].attribute_name, "PK");
        assert_eq!(request.key_schema[0].key_type, KeyType::Hash);
        assert_eq!(request.key_schema[1].key_type, KeyType::Range);
        assert_eq!(request.provisioned_throughput.read_capacity_units, 3);

        assert_eq!(request.global_secondary_indexes.len(), 2);
        let gsi = &request.global_secondary_indexes[1];
        assert_eq!(gsi.index_name, "GSIOne");
        assert_eq!(gsi.projection.projection_type, Projection::KeysOnly);
        assert_eq!(gsi.provisioned_throughput.read_capacity_units, 5);
        assert_eq!(gsi.provisioned_throughput.write_capacity_units, 2);
        assert!(!request.stream_enabled);
    }

    #[test]
    fn test_stream_flag_comes_from_config() {
        let config = crate::config::TableConfigBuilder::new()
            .stream_enabled(true)
            .build_with_defaults()
            .unwrap();
        let request = single_table()
            .with_config(config)
            .create_table_request()
            .unwrap();
        assert!(request.stream_enabled);
    }

    #[test]
    fn test_unindexed_keys_are_not_defined() {
        let request = single_table()
            .key(KeyDefinition::new("Spare"))
            .unwrap()
            .create_table_request()
            .unwrap();
        let names: Vec<&str> = request
            .attribute_definitions
            .iter()
            .map(|d| d.attribute_name.as_str())
            .collect();
        assert_eq!(names, ["PK", "SK", "GPK", "GSK"]);
    }
}
