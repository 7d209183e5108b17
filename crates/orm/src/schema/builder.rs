//! Schema builder
//!
//! Entity schemas are declared once, before first use, and frozen into an
//! [`EntitySchema`]. Declaration errors surface immediately.

use std::cmp::Ordering;

use tracing::debug;

use crate::error::{ModelResult, SchemaError};
use crate::schema::entity_schema::{EntitySchema, KeyArray};
use crate::schema::key::KeyComponent;

/// Default component priority
pub const DEFAULT_PRIORITY: i32 = 1;

/// Incremental builder for an [`EntitySchema`]
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    entity_name: String,
    attributes: Vec<String>,
    components: Vec<KeyComponent>,
    key_arrays: Vec<KeyArray>,
}

impl SchemaBuilder {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            attributes: Vec::new(),
            components: Vec::new(),
            key_arrays: Vec::new(),
        }
    }

    /// Add `name` to the attribute set. Re-declaring is a no-op.
    pub fn declare_attribute(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.attributes.contains(&name) {
            self.attributes.push(name);
        }
        self
    }

    /// Register `variable` as a component of `key`.
    ///
    /// Both names become attributes. The key's resolved order is recomputed.
    pub fn declare_key_component(
        &mut self,
        key: impl Into<String>,
        variable: impl Into<String>,
        prefix: Option<&str>,
        priority: i32,
    ) -> ModelResult<&mut Self> {
        let key = key.into();
        let variable = variable.into();

        if self
            .components
            .iter()
            .any(|c| c.key_name == key && c.variable_name == variable)
        {
            return Err(SchemaError::DuplicateComponent { key, variable }.into());
        }

        let component = KeyComponent {
            key_name: key.clone(),
            variable_name: variable.clone(),
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            priority,
        };

        let prefixed = self
            .components
            .iter()
            .filter(|c| c.key_name == key && c.has_prefix())
            .count();
        if component.has_prefix() && prefixed > 0 {
            return Err(SchemaError::MultiplePrefixes { key }.into());
        }

        self.declare_attribute(key.clone());
        self.declare_attribute(variable.clone());
        self.components.push(component);
        self.resolve_key_array(&key);

        debug!(
            "Declared component '{}' of key '{}' on entity '{}'",
            variable, key, self.entity_name
        );
        Ok(self)
    }

    /// Chaining form of [`declare_attribute`](Self::declare_attribute)
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.declare_attribute(name);
        self
    }

    /// Chaining form of [`declare_key_component`](Self::declare_key_component)
    /// with the default priority
    pub fn component(
        self,
        key: impl Into<String>,
        variable: impl Into<String>,
        prefix: Option<&str>,
    ) -> ModelResult<Self> {
        self.weighted_component(key, variable, prefix, DEFAULT_PRIORITY)
    }

    pub fn weighted_component(
        mut self,
        key: impl Into<String>,
        variable: impl Into<String>,
        prefix: Option<&str>,
        priority: i32,
    ) -> ModelResult<Self> {
        self.declare_key_component(key, variable, prefix, priority)?;
        Ok(self)
    }

    /// Freeze the declarations
    pub fn build(self) -> EntitySchema {
        EntitySchema {
            entity_name: self.entity_name,
            attributes: self.attributes,
            components: self.components,
            key_arrays: self.key_arrays,
        }
    }

    // Prefixed component first, then descending priority. The sort is
    // stable so ties keep declaration order.
    fn resolve_key_array(&mut self, key: &str) {
        let mut components: Vec<&KeyComponent> =
            self.components.iter().filter(|c| c.key_name == key).collect();
        components.sort_by(|a, b| match (a.has_prefix(), b.has_prefix()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => b.priority.cmp(&a.priority),
        });
        let variables: Vec<String> = components
            .into_iter()
            .map(|c| c.variable_name.clone())
            .collect();

        match self.key_arrays.iter_mut().find(|k| k.key_name == key) {
            Some(array) => array.variables = variables,
            None => self.key_arrays.push(KeyArray {
                key_name: key.to_string(),
                variables,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{KeyError, ModelError};

    #[test]
    fn test_attribute_declaration_is_idempotent() {
        let schema = SchemaBuilder::new("User")
            .attribute("name")
            .attribute("name")
            .build();
        assert_eq!(schema.attributes(), ["name"]);
    }

    #[test]
    fn test_component_registers_attributes() {
        let schema = SchemaBuilder::new("User")
            .component("PK", "userId", Some("USER"))
            .unwrap()
            .build();
        assert_eq!(schema.attributes(), ["PK", "userId"]);
        assert!(schema.is_key("PK"));
        assert!(schema.is_component("userId"));
        assert!(!schema.is_key("userId"));
    }

    #[test]
    fn test_priority_ordering() {
        let schema = SchemaBuilder::new("Order")
            .weighted_component("SK", "a", None, 3)
            .unwrap()
            .weighted_component("SK", "b", None, 1)
            .unwrap()
            .weighted_component("SK", "c", None, 2)
            .unwrap()
            .build();
        assert_eq!(schema.key_array("SK").unwrap(), ["a", "c", "b"]);
    }

    #[test]
    fn test_prefixed_component_sorts_first() {
        let schema = SchemaBuilder::new("Order")
            .weighted_component("PK", "high", None, 10)
            .unwrap()
            .weighted_component("PK", "tenant", Some("TENANT"), 1)
            .unwrap()
            .build();
        assert_eq!(schema.key_array("PK").unwrap(), ["tenant", "high"]);
        assert_eq!(schema.prefix("PK").unwrap(), "TENANT");
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let schema = SchemaBuilder::new("Order")
            .component("PK", "tenant", Some("T"))
            .unwrap()
            .component("PK", "first", None)
            .unwrap()
            .component("PK", "second", None)
            .unwrap()
            .component("PK", "third", None)
            .unwrap()
            .build();
        assert_eq!(
            schema.key_array("PK").unwrap(),
            ["tenant", "first", "second", "third"]
        );
    }

    #[test]
    fn test_duplicate_component_fails() {
        let err = SchemaBuilder::new("User")
            .component("PK", "userId", Some("USER"))
            .unwrap()
            .component("PK", "userId", None)
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::Schema(SchemaError::DuplicateComponent {
                key: "PK".into(),
                variable: "userId".into()
            })
        );
    }

    #[test]
    fn test_multiple_prefixes_fail() {
        let err = SchemaBuilder::new("User")
            .component("PK", "userId", Some("USER"))
            .unwrap()
            .component("PK", "tenantId", Some("TENANT"))
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::Schema(SchemaError::MultiplePrefixes { key: "PK".into() })
        );
    }

    #[test]
    fn test_empty_prefix_is_no_prefix() {
        let schema = SchemaBuilder::new("User")
            .component("PK", "userId", Some("USER"))
            .unwrap()
            .component("PK", "tenantId", Some(""))
            .unwrap()
            .build();
        assert_eq!(schema.key_array("PK").unwrap(), ["userId", "tenantId"]);
    }

    #[test]
    fn test_prefix_errors() {
        let schema = SchemaBuilder::new("User")
            .component("GSK", "createdAt", None)
            .unwrap()
            .build();
        assert_eq!(
            schema.prefix("GSK").unwrap_err(),
            ModelError::Key(KeyError::MissingPrefix { key: "GSK".into() })
        );
        assert_eq!(
            schema.prefix("LSK").unwrap_err(),
            ModelError::Key(KeyError::EmptyKey { key: "LSK".into() })
        );
    }

    #[test]
    fn test_same_variable_in_several_keys() {
        let schema = SchemaBuilder::new("User")
            .component("SK", "userId", Some("#METADATA#USER"))
            .unwrap()
            .component("PK", "userId", Some("USER"))
            .unwrap()
            .build();
        let keys: Vec<&str> = schema.keys_for_variable("userId").collect();
        assert_eq!(keys, ["SK", "PK"]);
    }
}
