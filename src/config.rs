//! Engine configuration
//!
//! Loaded from a TOML file; environment variables take precedence.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`KAMELET_NAMESPACE`, then `NAMESPACE`)
//! 2. Config file
//! 3. Defaults

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BindingError, Result};

pub const DEFAULT_CLUSTER_DOMAIN: &str = "svc.cluster.local";
pub const DEFAULT_DATA_TYPE_ACTION: &str = "data-type-action";

/// Pipe metadata key overriding the data-type adapter template
pub const DATA_TYPE_ACTION_LABEL: &str = "camel.apache.org/kamelet.data.type";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Namespace holding shared Kamelets, readable from every pipe
    pub global_template_namespace: Option<String>,

    /// DNS suffix of in-cluster services
    pub cluster_domain: String,

    /// Kamelet used to build data-type adapter steps
    pub data_type_action: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            global_template_namespace: None,
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
            data_type_action: DEFAULT_DATA_TYPE_ACTION.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| BindingError::Config {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BindingError::Config {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Merge with environment variables
    pub fn with_env(mut self) -> Self {
        for var in ["KAMELET_NAMESPACE", "NAMESPACE"] {
            if let Ok(ns) = std::env::var(var) {
                if !ns.is_empty() {
                    self.global_template_namespace = Some(ns);
                    break;
                }
            }
        }
        self
    }

    pub fn global_template_namespace(&self) -> Option<&str> {
        self.global_template_namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
    }
}
