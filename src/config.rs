//! Dispatcher configuration.
//!
//! The base origin and endpoint table are passed in explicitly at
//! construction. A host that keeps them in its own config source can decode
//! them with [`DispatcherConfig::from_json`]:
//!
//! ```
//! use endpoint_dispatch::{DispatcherConfig, PlaceholderPolicy};
//!
//! let config = DispatcherConfig::from_json(
//!     r#"{"base_url":"https://api.example.com","endpoints":{"getModel":"/user/{id}"},"placeholder_policy":"strict"}"#,
//! )
//! .unwrap();
//! assert_eq!(config.placeholder_policy, PlaceholderPolicy::Strict);
//! ```

use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointTable;
use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.example.com";

/// What to do when a template still holds `{name}` tokens after substitution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderPolicy {
    /// Send the URL with the literal tokens left in place.
    #[default]
    Permissive,
    /// Fail the call before any request is sent.
    Strict,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    pub base_url: String,
    #[serde(default)]
    pub endpoints: EndpointTable,
    #[serde(default)]
    pub placeholder_policy: PlaceholderPolicy,
}

impl DispatcherConfig {
    /// Config with the given origin and no endpoints.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoints: EndpointTable::empty(),
            placeholder_policy: PlaceholderPolicy::default(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            sonic_rs::from_str(raw).map_err(|err| ConfigError::Malformed(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_endpoint(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.endpoints = self.endpoints.with_endpoint(key, template);
        self
    }

    pub fn with_endpoints(mut self, endpoints: EndpointTable) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_placeholder_policy(mut self, policy: PlaceholderPolicy) -> Self {
        self.placeholder_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        if self.base_url.is_empty() {
            return Err(invalid("empty"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(invalid("scheme must be http or https"));
        }
        if self.base_url.ends_with('/') {
            return Err(invalid("trailing slash"));
        }

        for (key, template) in self.endpoints.iter() {
            if !template.starts_with('/') {
                return Err(ConfigError::InvalidTemplate {
                    key: key.to_owned(),
                    template: template.to_owned(),
                });
            }
        }
        Ok(())
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            endpoints: EndpointTable::default(),
            placeholder_policy: PlaceholderPolicy::default(),
        }
    }
}
