//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use dynamap_orm::{
    AttributeValue, DefinitionCell, Entity, EntityInstance, EntitySchema, KeyDefinition,
    MemoryBackend, ModelResult, Projection, SchemaBuilder, TableDefinition,
};

static TABLE: DefinitionCell<TableDefinition> = DefinitionCell::new();
static USER_SCHEMA: DefinitionCell<EntitySchema> = DefinitionCell::new();
static GOOGLE_LOGIN_SCHEMA: DefinitionCell<EntitySchema> = DefinitionCell::new();

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Single table shared by `User` and `GoogleLogin`
pub fn test_table() -> ModelResult<TableDefinition> {
    TableDefinition::new("TestTable")
        .key(KeyDefinition::new("PK").with_sort_key("SK").primary())?
        .key(
            KeyDefinition::new("SK")
                .with_sort_key("PK")
                .with_index("InvertedIndex"),
        )?
        .key(KeyDefinition::new("GPK").with_index("GSIOne"))?
        .key(
            KeyDefinition::new("EPK")
                .with_index("EmailIndex")
                .with_projection(Projection::KeysOnly),
        )
}

/// Fresh backend with the test table created
pub async fn backend() -> MemoryBackend {
    init_tracing();
    let backend = MemoryBackend::new();
    let table = test_table().expect("valid test table");
    table.create(&backend).await.expect("table created");
    backend
}

pub fn item<const N: usize>(pairs: [(&str, &str); N]) -> dynamap_orm::Item {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), AttributeValue::from(v)))
        .collect()
}

fn snake_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone)]
pub struct User {
    instance: EntityInstance,
}

impl User {
    pub fn user_id(&self) -> Option<String> {
        self.string("userId")
    }

    pub fn username(&self) -> Option<String> {
        self.string("username")
    }

    pub fn name(&self) -> Option<String> {
        self.string("name")
    }

    /// Usernames are stored snake_cased
    pub fn set_username(&mut self, value: &str) -> ModelResult<()> {
        self.instance.set_component("username", snake_case(value))
    }

    fn string(&self, name: &str) -> Option<String> {
        self.instance.get(name).map(|value| value.to_string())
    }
}

impl Entity for User {
    fn schema() -> ModelResult<Arc<EntitySchema>> {
        USER_SCHEMA.get_or_try_init(|| {
            Ok(SchemaBuilder::new("User")
                .component("SK", "userId", Some("#METADATA#USER"))?
                .component("PK", "userId", Some("USER"))?
                .component("GPK", "username", Some("USERNAME"))?
                .component("EPK", "email", Some("EMAIL"))?
                .attribute("name")
                .build())
        })
    }

    fn table() -> ModelResult<Arc<TableDefinition>> {
        TABLE.get_or_try_init(test_table)
    }

    fn from_instance(instance: EntityInstance) -> ModelResult<Self> {
        Ok(Self { instance })
    }

    fn instance(&self) -> &EntityInstance {
        &self.instance
    }

    fn instance_mut(&mut self) -> &mut EntityInstance {
        &mut self.instance
    }
}

#[derive(Debug, Clone)]
pub struct GoogleLogin {
    instance: EntityInstance,
}

impl Entity for GoogleLogin {
    fn schema() -> ModelResult<Arc<EntitySchema>> {
        GOOGLE_LOGIN_SCHEMA.get_or_try_init(|| {
            Ok(SchemaBuilder::new("GoogleLogin")
                .component("PK", "userId", Some("METADATA"))?
                .component("SK", "facebookId", Some("FACEBOOK"))?
                .attribute("profile")
                .build())
        })
    }

    fn table() -> ModelResult<Arc<TableDefinition>> {
        TABLE.get_or_try_init(test_table)
    }

    fn from_instance(instance: EntityInstance) -> ModelResult<Self> {
        Ok(Self { instance })
    }

    fn instance(&self) -> &EntityInstance {
        &self.instance
    }

    fn instance_mut(&mut self) -> &mut EntityInstance {
        &mut self.instance
    }
}
