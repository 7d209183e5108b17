//! Key condition expression builder

use std::collections::HashMap;

use crate::value::AttributeValue;

pub const HASH_PLACEHOLDER: &str = ":hash_value";
pub const RANGE_PLACEHOLDER: &str = ":range_value";

/// Builds `PK = :hash_value AND SK = :range_value` style key conditions
#[derive(Debug, Clone, Default)]
pub struct KeyConditionBuilder {
    expression: String,
    values: HashMap<String, AttributeValue>,
}

impl KeyConditionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partition_key(self, field: &str, value: AttributeValue) -> Self {
        self.with_clause(field, HASH_PLACEHOLDER, value)
    }

    pub fn with_sort_key(self, field: &str, value: AttributeValue) -> Self {
        self.with_clause(field, RANGE_PLACEHOLDER, value)
    }

    pub fn build(self) -> (String, HashMap<String, AttributeValue>) {
        (self.expression, self.values)
    }

    fn with_clause(mut self, field: &str, placeholder: &str, value: AttributeValue) -> Self {
        if !self.expression.is_empty() {
            self.expression.push_str(" AND ");
        }
        self.expression.push_str(&format!("{} = {}", field, placeholder));
        self.values.insert(placeholder.to_string(), value);
        self
    }
}
