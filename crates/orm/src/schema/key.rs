//! Key definitions and key components
//!
//! A `KeyDefinition` describes one key of a table (the primary key or a
//! secondary index). A `KeyComponent` records that an entity variable
//! contributes to a composite key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default read/write capacity hint for a key definition
pub const DEFAULT_CAPACITY: u32 = 3;

/// Which attributes a secondary index carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Projection {
    #[default]
    All,
    KeysOnly,
    Include,
}

impl Projection {
    /// Whether rows read through this projection carry every attribute
    pub fn is_full(&self) -> bool {
        matches!(self, Projection::All)
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::All => write!(f, "ALL"),
            Projection::KeysOnly => write!(f, "KEYS_ONLY"),
            Projection::Include => write!(f, "INCLUDE"),
        }
    }
}

/// One key of a table: partition key name, optional sort key, optional index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDefinition {
    pub key_name: String,
    pub sort_key_name: Option<String>,
    pub index_name: Option<String>,
    pub is_primary: bool,
    pub projection: Projection,
    pub projected_attributes: Vec<String>,
    /// Declared read capacity. Used by the planner only to order indexes.
    pub read_weight: u32,
    pub write_weight: u32,
}

impl KeyDefinition {
    /// Create a non-primary key definition with default projection and capacity
    pub fn new(key_name: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            sort_key_name: None,
            index_name: None,
            is_primary: false,
            projection: Projection::All,
            projected_attributes: Vec::new(),
            read_weight: DEFAULT_CAPACITY,
            write_weight: DEFAULT_CAPACITY,
        }
    }

    /// Pair this key with a sort key
    pub fn with_sort_key(mut self, sort_key_name: impl Into<String>) -> Self {
        self.sort_key_name = Some(sort_key_name.into());
        self
    }

    /// Expose this key through a secondary index
    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Mark this key as the table's primary key
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Use an `INCLUDE` projection carrying the given non-key attributes
    pub fn including<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Projection::Include;
        self.projected_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_capacity(mut self, read_weight: u32, write_weight: u32) -> Self {
        self.read_weight = read_weight;
        self.write_weight = write_weight;
        self
    }

    /// Whether this definition describes a secondary index
    pub fn is_secondary_index(&self) -> bool {
        !self.is_primary && self.index_name.is_some()
    }
}

/// A variable contributing to a composite key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyComponent {
    pub key_name: String,
    pub variable_name: String,
    pub prefix: Option<String>,
    pub priority: i32,
}

impl KeyComponent {
    pub fn has_prefix(&self) -> bool {
        self.prefix.as_deref().is_some_and(|p| !p.is_empty())
    }
}
