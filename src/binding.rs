//! Binding model - the resolved output and the resolution environment
//!
//! A [`Binding`] is what a resolver hands back to the reconciler: a URI or
//! an inline step, plus trait overrides and namespaced application
//! properties that cannot be expressed in the URI itself.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterClient;
use crate::config::EngineConfig;
use crate::error::BindingError;
use crate::policy::{AccessPolicy, DenyAll};

/// Inline route fragment emitted for actions and data-type adapters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// `{"kamelet": {"name": "<template>/<id>"}}`
    Kamelet { name: String },
    /// `{"pipeline": {"id": "<id>-pipeline", "steps": [...]}}`
    Pipeline { id: String, steps: Vec<Step> },
}

impl Step {
    pub fn kamelet(name: impl Into<String>) -> Self {
        Step::Kamelet { name: name.into() }
    }
}

/// Knative trait overrides a binding may require
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnativeTrait {
    /// Event filters (`key=value`) for broker subscriptions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
    /// `false` when no event type is known and the default filter must be off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_event_type: Option<bool>,
    /// Serialized static service environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink_binding: Option<bool>,
}

/// Partial trait configuration to merge into the workload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Traits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knative: Option<KnativeTrait>,
}

impl Traits {
    pub fn is_empty(&self) -> bool {
        self.knative.is_none()
    }
}

/// Resolved form of an endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Step>,
    #[serde(default, skip_serializing_if = "Traits::is_empty")]
    pub traits: Traits,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub application_properties: BTreeMap<String, String>,
}

impl Binding {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }
}

/// Deployment profile of the target platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Kubernetes,
    Knative,
    OpenShift,
}

impl Profile {
    /// Whether the platform runs an eventing layer that can wrap HTTP sinks
    pub fn eventing_enabled(&self) -> bool {
        matches!(self, Profile::Knative)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Kubernetes => write!(f, "kubernetes"),
            Profile::Knative => write!(f, "knative"),
            Profile::OpenShift => write!(f, "openshift"),
        }
    }
}

impl FromStr for Profile {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kubernetes" => Ok(Profile::Kubernetes),
            "knative" => Ok(Profile::Knative),
            "openshift" => Ok(Profile::OpenShift),
            other => Err(BindingError::Config {
                reason: format!("unknown profile '{other}' (expected kubernetes, knative or openshift)"),
            }),
        }
    }
}

/// Resolution environment shared by every endpoint of one pipe
#[derive(Clone)]
pub struct BindingContext {
    /// The pipe's own namespace
    pub namespace: String,
    /// Identity used to authorize cross-namespace references
    pub service_account_name: Option<String>,
    pub profile: Profile,
    pub client: Arc<dyn ClusterClient>,
    pub policy: Arc<dyn AccessPolicy>,
    pub config: Arc<EngineConfig>,
    /// Pipe annotations/labels consulted by resolvers
    pub metadata: BTreeMap<String, String>,
}

impl BindingContext {
    pub fn new(namespace: &str, client: Arc<dyn ClusterClient>) -> Self {
        Self {
            namespace: namespace.to_string(),
            service_account_name: None,
            profile: Profile::default(),
            client,
            policy: Arc::new(DenyAll),
            config: Arc::new(EngineConfig::default()),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_service_account(mut self, name: &str) -> Self {
        self.service_account_name = Some(name.to_string()).filter(|n| !n.is_empty());
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(mut self, config: Arc<EngineConfig>) -> Self {
        self.config = config;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

impl fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("namespace", &self.namespace)
            .field("service_account_name", &self.service_account_name)
            .field("profile", &self.profile)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
