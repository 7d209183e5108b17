//! Immutable per-entity schema
//!
//! Produced once by [`SchemaBuilder`](super::SchemaBuilder) and shared by
//! every instance of the entity type.

use crate::error::{KeyError, ModelResult, SchemaError};
use crate::schema::key::KeyComponent;

/// Resolved iteration order of the variables composing one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyArray {
    pub key_name: String,
    pub variables: Vec<String>,
}

/// Attribute set, key components and derived key arrays of one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    pub(crate) entity_name: String,
    pub(crate) attributes: Vec<String>,
    pub(crate) components: Vec<KeyComponent>,
    pub(crate) key_arrays: Vec<KeyArray>,
}

impl EntitySchema {
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Declared attributes in declaration order
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    /// Fail with `UnknownAttribute` unless `name` is declared
    pub fn validate_attribute(&self, name: &str) -> ModelResult<()> {
        if self.has_attribute(name) {
            Ok(())
        } else {
            Err(SchemaError::UnknownAttribute {
                entity: self.entity_name.clone(),
                attribute: name.to_string(),
            }
            .into())
        }
    }

    /// Key components in declaration order
    pub fn components(&self) -> &[KeyComponent] {
        &self.components
    }

    pub fn component(&self, key: &str, variable: &str) -> Option<&KeyComponent> {
        self.components
            .iter()
            .find(|c| c.key_name == key && c.variable_name == variable)
    }

    pub fn key_arrays(&self) -> &[KeyArray] {
        &self.key_arrays
    }

    /// Ordered variables of `key`, if the entity contributes to it
    pub fn key_array(&self, key: &str) -> Option<&[String]> {
        self.key_arrays
            .iter()
            .find(|k| k.key_name == key)
            .map(|k| k.variables.as_slice())
    }

    /// Whether `name` is a composite key of this entity type
    pub fn is_key(&self, name: &str) -> bool {
        self.key_arrays.iter().any(|k| k.key_name == name)
    }

    /// Whether `name` contributes to at least one key
    pub fn is_component(&self, name: &str) -> bool {
        self.components.iter().any(|c| c.variable_name == name)
    }

    /// Keys that include `variable` as a component
    pub fn keys_for_variable<'a>(
        &'a self,
        variable: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.key_arrays
            .iter()
            .filter(move |k| k.variables.iter().any(|v| v == variable))
            .map(|k| k.key_name.as_str())
    }

    /// Position of `variable` within the resolved order of `key`
    pub fn position(&self, key: &str, variable: &str) -> Option<usize> {
        self.key_array(key)?.iter().position(|v| v == variable)
    }

    /// Prefix of `key`, carried by its first component
    pub fn prefix(&self, key: &str) -> ModelResult<&str> {
        let first = self
            .key_array(key)
            .and_then(|variables| variables.first())
            .ok_or_else(|| KeyError::EmptyKey { key: key.to_string() })?;

        self.component(key, first)
            .filter(|c| c.has_prefix())
            .and_then(|c| c.prefix.as_deref())
            .ok_or_else(|| KeyError::MissingPrefix { key: key.to_string() }.into())
    }
}
