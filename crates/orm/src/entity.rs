//! Entity instances
//!
//! An `EntityInstance` holds the current attribute values of one entity and
//! keeps component variables and composite key strings in sync:
//!
//! - writing a component re-encodes every key that includes it
//! - writing a key string decodes it into its components, unless one of them
//!   already has a value
//! - reading a component without a direct value decodes it from a key string

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::codec;
use crate::error::{KeyError, ModelResult};
use crate::schema::EntitySchema;
use crate::value::{AttributeValue, Item};

/// Current attribute values of one entity
#[derive(Debug, Clone)]
pub struct EntityInstance {
    schema: Arc<EntitySchema>,
    values: HashMap<String, AttributeValue>,
    key_values: HashMap<String, String>,
}

impl EntityInstance {
    /// Create an instance with no values
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        Self {
            schema,
            values: HashMap::new(),
            key_values: HashMap::new(),
        }
    }

    /// Create an instance from attribute values, encoding keys as components are set
    pub fn from_values<I, K, V>(schema: Arc<EntitySchema>, values: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        let mut instance = Self::new(schema);
        for (name, value) in values {
            instance.set(name.as_ref(), value)?;
        }
        Ok(instance)
    }

    /// Materialize a raw storage item.
    ///
    /// Key strings are applied before components so that components present
    /// in the item win over decoded values.
    pub fn from_item(schema: Arc<EntitySchema>, item: Item) -> ModelResult<Self> {
        for name in item.keys() {
            schema.validate_attribute(name)?;
        }

        let mut instance = Self::new(schema);
        let (keys, rest): (Vec<_>, Vec<_>) = item
            .into_iter()
            .partition(|(name, _)| instance.schema.is_key(name));

        for (name, value) in keys {
            instance.set(&name, value)?;
        }
        for (name, value) in rest {
            instance.set(&name, value)?;
        }
        Ok(instance)
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// Write any declared attribute, routing components and keys through
    /// their synchronization rules
    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) -> ModelResult<()> {
        self.schema.validate_attribute(name)?;
        let value = value.into();

        if self.schema.is_key(name) {
            let key_value = match value {
                AttributeValue::Null => None,
                AttributeValue::String(s) => Some(s),
                other => Some(other.to_string()),
            };
            self.set_key_string(name, key_value)
        } else if self.schema.is_component(name) {
            self.set_component(name, value)
        } else {
            self.store(name, value);
            Ok(())
        }
    }

    /// Write a component variable and re-encode every key that includes it
    pub fn set_component(
        &mut self,
        variable: &str,
        value: impl Into<AttributeValue>,
    ) -> ModelResult<()> {
        self.schema.validate_attribute(variable)?;
        self.store(variable, value.into());

        // The written variable must not be decoded back out of its own stale keys.
        let schema = Arc::clone(&self.schema);
        for key in schema.keys_for_variable(variable) {
            let encoded = codec::compute_key_value(&schema, key, |name| {
                if name == variable {
                    self.values.get(name).cloned()
                } else {
                    self.get(name)
                }
            })?;
            match encoded {
                Some(key_value) => {
                    self.key_values.insert(key.to_string(), key_value);
                }
                None => {
                    self.key_values.remove(key);
                }
            }
        }
        Ok(())
    }

    /// Write a key string directly.
    ///
    /// When none of the key's components has a value yet, they are populated
    /// from the string, which in turn re-encodes any other key they belong to.
    pub fn set_key_string(&mut self, key: &str, key_value: Option<String>) -> ModelResult<()> {
        if !self.schema.is_key(key) {
            return Err(KeyError::UnknownKey { key: key.to_string() }.into());
        }

        let key_value = match key_value.filter(|v| !v.is_empty()) {
            Some(key_value) => key_value,
            None => {
                self.key_values.remove(key);
                return Ok(());
            }
        };

        let decoded = codec::decode_key(&self.schema, key, &key_value)?;
        let has_components = self
            .schema
            .key_array(key)
            .unwrap_or_default()
            .iter()
            .any(|variable| self.has_direct_value(variable));

        self.key_values.insert(key.to_string(), key_value.clone());
        if !has_components {
            for (variable, value) in decoded {
                self.set_component(&variable, value)?;
            }
            // A partial key string cannot be re-encoded; keep what was written.
            self.key_values.insert(key.to_string(), key_value);
        }
        Ok(())
    }

    /// Read an attribute.
    ///
    /// Components without a direct value are decoded from the first key
    /// string that carries them. Reading never modifies the instance.
    pub fn get(&self, name: &str) -> Option<AttributeValue> {
        if let Some(key_value) = self.key_values.get(name) {
            return Some(AttributeValue::String(key_value.clone()));
        }
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if !self.schema.is_component(name) {
            return None;
        }

        self.schema.keys_for_variable(name).find_map(|key| {
            let key_value = self.key_values.get(key)?;
            codec::compute_value_from_key(&self.schema, key, key_value, name)
                .ok()
                .flatten()
                .map(AttributeValue::String)
        })
    }

    /// Current string of a composite key
    pub fn key_string(&self, key: &str) -> Option<&str> {
        self.key_values.get(key).map(String::as_str)
    }

    /// Write every component that is only known through a key string back
    /// onto the instance
    pub fn materialize_components(&mut self) -> ModelResult<()> {
        let pending: Vec<(String, AttributeValue)> = self
            .schema
            .components()
            .iter()
            .map(|c| c.variable_name.as_str())
            .filter(|variable| !self.has_direct_value(variable))
            .filter_map(|variable| self.get(variable).map(|value| (variable.to_string(), value)))
            .collect();

        for (variable, value) in pending {
            self.set_component(&variable, value)?;
        }
        Ok(())
    }

    /// Snapshot of every attribute that currently has a value
    pub fn attributes(&self) -> Item {
        self.schema
            .attributes()
            .iter()
            .filter_map(|name| self.get(name).map(|value| (name.clone(), value)))
            .collect()
    }

    pub fn to_json(&self) -> JsonValue {
        let map: serde_json::Map<String, JsonValue> = self
            .schema
            .attributes()
            .iter()
            .filter_map(|name| self.get(name).map(|value| (name.clone(), value.to_json())))
            .collect();
        JsonValue::Object(map)
    }

    fn has_direct_value(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn store(&mut self, name: &str, value: AttributeValue) {
        if value.is_null() {
            self.values.remove(name);
        } else {
            self.values.insert(name.to_string(), value);
        }
    }
}

impl fmt::Display for EntityInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = serde_json::to_string_pretty(&self.to_json()).map_err(|_| fmt::Error)?;
        write!(f, "{} {}", self.schema.entity_name(), body)
    }
}
