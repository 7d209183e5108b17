//! Table configuration types and builders

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use service_builder::builder;

use crate::error::{ModelError, ModelResult};

pub const DEFAULT_REGION: &str = "ap-south-1";
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:8000";

/// How the planner treats a primary key's sort key.
///
/// `AsObserved` requires a known value when the sort key is itself a key of
/// the entity, and requires it to be unknown otherwise. `PartitionFallback`
/// uses the sort key whenever its value is known and falls back to a
/// partition-only lookup when it is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKeyRule {
    #[default]
    AsObserved,
    PartitionFallback,
}

/// Configuration for a table and the requests issued against it.
///
/// Fields are read through the generated `get_*` accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder]
pub struct TableConfig {
    /// Region the table lives in
    #[builder(getter, default = "DEFAULT_REGION.to_string()")]
    pub region: String,

    /// Explicit endpoint, overriding region and local resolution
    #[builder(getter, default)]
    pub endpoint: Option<String>,

    /// Talk to a local DynamoDB instance
    #[builder(getter, default)]
    pub use_local: bool,

    /// Enable the change stream when creating the table
    #[builder(getter, default)]
    pub stream_enabled: bool,

    /// Upper bound on a single backend request
    #[builder(getter, default = "Duration::from_secs(5)")]
    pub request_timeout: Duration,

    /// Sort key handling for primary key lookups
    #[builder(getter, default)]
    pub sort_key_rule: SortKeyRule,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            use_local: false,
            stream_enabled: false,
            request_timeout: Duration::from_secs(5),
            sort_key_rule: SortKeyRule::AsObserved,
        }
    }
}

impl TableConfig {
    /// Load configuration from `DYNAMAP_*` environment variables, falling
    /// back to defaults for unset ones
    pub fn from_env() -> ModelResult<Self> {
        let mut config = Self::default();

        if let Ok(region) = env::var("DYNAMAP_REGION") {
            config.region = region;
        }
        if let Ok(endpoint) = env::var("DYNAMAP_ENDPOINT") {
            config.endpoint = Some(endpoint).filter(|e| !e.is_empty());
        }
        if let Ok(value) = env::var("DYNAMAP_USE_LOCAL") {
            config.use_local = parse_bool("DYNAMAP_USE_LOCAL", &value)?;
        }
        if let Ok(value) = env::var("DYNAMAP_STREAM_ENABLED") {
            config.stream_enabled = parse_bool("DYNAMAP_STREAM_ENABLED", &value)?;
        }
        if let Ok(value) = env::var("DYNAMAP_REQUEST_TIMEOUT_MS") {
            let millis: u64 = value.parse().map_err(|_| {
                ModelError::Configuration(format!(
                    "DYNAMAP_REQUEST_TIMEOUT_MS must be a number of milliseconds, got '{}'",
                    value
                ))
            })?;
            config.request_timeout = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.region.is_empty() {
            return Err(ModelError::Configuration("region must not be empty".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(ModelError::Configuration(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Endpoint requests should be sent to
    pub fn resolved_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None if self.use_local => DEFAULT_LOCAL_ENDPOINT.to_string(),
            None => format!("https://dynamodb.{}.amazonaws.com", self.region),
        }
    }
}

impl TableConfigBuilder {
    /// Configuration for a local DynamoDB instance
    pub fn local() -> Self {
        TableConfigBuilder::new().use_local(true)
    }
}

fn parse_bool(name: &str, value: &str) -> ModelResult<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ModelError::Configuration(format!(
            "{} must be a boolean, got '{}'",
            name, value
        ))),
    }
}
