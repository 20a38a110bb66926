//! Error types with fix suggestions
//!
//! Error code ranges:
//! - BIND-000-009: Endpoint shape errors
//! - BIND-010-019: Authorization gate errors
//! - BIND-020-029: Backend availability errors
//! - BIND-030-039: Cluster service errors
//! - BIND-040-049: Streaming backend errors
//! - BIND-050-059: URI / descriptor errors
//! - BIND-060-069: Pipe-level errors
//! - BIND-070-079: Configuration errors
//!
//! Transient cluster failures are not given a code: they travel as
//! [`ClusterError`] so the caller's reconcile loop can back off and retry.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BindingError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Failure reported by a [`ClusterClient`](crate::cluster::ClusterClient) read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("cluster API request failed: {message}")]
    Api { message: String },

    #[error("cluster API throttled the request: {message}")]
    Throttled { message: String },
}

#[derive(Error, Debug)]
pub enum BindingError {
    // ═══════════════════════════════════════════
    // ENDPOINT SHAPE (000-009)
    // ═══════════════════════════════════════════
    #[error("[BIND-001] Malformed endpoint: {reason}")]
    MalformedEndpoint { reason: String },

    #[error("[BIND-002] Invalid apiVersion '{api_version}' on reference '{name}'")]
    InvalidApiVersion { api_version: String, name: String },

    // ═══════════════════════════════════════════
    // AUTHORIZATION GATE (010-019)
    // ═══════════════════════════════════════════
    #[error("[BIND-010] Cross-namespace reference to {kind} '{name}' in namespace '{namespace}' is not allowed: {reason}")]
    CrossNamespaceDenied {
        kind: String,
        name: String,
        namespace: String,
        reason: String,
    },

    #[error("[BIND-011] Cross-namespace reference to {kind} '{name}' in namespace '{namespace}' requires a service account")]
    MissingAuthorization {
        kind: String,
        name: String,
        namespace: String,
    },

    // ═══════════════════════════════════════════
    // BACKEND AVAILABILITY (020-029)
    // ═══════════════════════════════════════════
    #[error("[BIND-020] Endpoint '{name}' references {api_version}/{kind}, which is not installed on the cluster")]
    BackendUnavailable {
        api_version: String,
        kind: String,
        name: String,
    },

    // ═══════════════════════════════════════════
    // CLUSTER SERVICE (030-039)
    // ═══════════════════════════════════════════
    #[error("[BIND-030] Could not load a {kind} with name {name} in namespace {namespace}")]
    ResourceNotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    #[error("[BIND-031] Service '{name}' has type {service_type}, only ClusterIP is supported")]
    UnsupportedServiceType { name: String, service_type: String },

    // ═══════════════════════════════════════════
    // STREAMING BACKEND (040-049)
    // ═══════════════════════════════════════════
    #[error("[BIND-040] Kafka endpoint '{cluster}' is missing the 'topic' property")]
    MissingTopic { cluster: String },

    #[error("[BIND-041] Could not find any KafkaTopic with either name or topicName '{topic}' in namespace '{namespace}'")]
    TopicNotFound { topic: String, namespace: String },

    #[error("[BIND-042] Kafka cluster '{cluster}' has no bootstrap servers in listener '{listener}'")]
    NoBootstrapServers { cluster: String, listener: String },

    #[error("[BIND-043] KafkaTopic '{topic}' has no '{label}' label")]
    MissingClusterLabel { topic: String, label: String },

    // ═══════════════════════════════════════════
    // URI / DESCRIPTOR (050-059)
    // ═══════════════════════════════════════════
    #[error("[BIND-050] Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("[BIND-051] Cannot serialize {what}: {reason}")]
    Serialization { what: String, reason: String },

    #[error("[BIND-052] Cluster object {kind} '{name}' does not match its schema: {reason}")]
    InvalidResource {
        kind: String,
        name: String,
        reason: String,
    },

    // ═══════════════════════════════════════════
    // PIPE (060-069)
    // ═══════════════════════════════════════════
    #[error("[BIND-060] No resolver matched the {role} endpoint {endpoint}")]
    NoResolverMatched { role: String, endpoint: String },

    #[error("[BIND-061] Invalid pipe manifest: {reason}")]
    InvalidManifest { reason: String },

    // ═══════════════════════════════════════════
    // CONFIG (070-079)
    // ═══════════════════════════════════════════
    #[error("[BIND-070] Configuration error: {reason}")]
    Config { reason: String },

    // ═══════════════════════════════════════════
    // TRANSIENT
    // ═══════════════════════════════════════════
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

impl BindingError {
    /// Stable error code, e.g. `BIND-010`
    pub fn code(&self) -> &'static str {
        match self {
            BindingError::MalformedEndpoint { .. } => "BIND-001",
            BindingError::InvalidApiVersion { .. } => "BIND-002",
            BindingError::CrossNamespaceDenied { .. } => "BIND-010",
            BindingError::MissingAuthorization { .. } => "BIND-011",
            BindingError::BackendUnavailable { .. } => "BIND-020",
            BindingError::ResourceNotFound { .. } => "BIND-030",
            BindingError::UnsupportedServiceType { .. } => "BIND-031",
            BindingError::MissingTopic { .. } => "BIND-040",
            BindingError::TopicNotFound { .. } => "BIND-041",
            BindingError::NoBootstrapServers { .. } => "BIND-042",
            BindingError::MissingClusterLabel { .. } => "BIND-043",
            BindingError::InvalidUri { .. } => "BIND-050",
            BindingError::Serialization { .. } => "BIND-051",
            BindingError::InvalidResource { .. } => "BIND-052",
            BindingError::NoResolverMatched { .. } => "BIND-060",
            BindingError::InvalidManifest { .. } => "BIND-061",
            BindingError::Config { .. } => "BIND-070",
            BindingError::Cluster(_) => "BIND-CLUSTER",
        }
    }

    /// Only cluster I/O failures are worth another reconcile attempt
    /// without a manifest or cluster change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BindingError::Cluster(_))
    }
}

impl FixSuggestion for BindingError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BindingError::MalformedEndpoint { .. } => {
                Some("Set exactly one of 'ref' or 'uri' on the endpoint")
            }
            BindingError::InvalidApiVersion { .. } => {
                Some("Use 'group/version' or 'version' for core resources (e.g. 'v1')")
            }
            BindingError::CrossNamespaceDenied { .. } => {
                Some("Reference a resource in the pipe's own namespace")
            }
            BindingError::MissingAuthorization { .. } => Some(
                "Set serviceAccountName on the pipe and grant it access to the referenced namespace",
            ),
            BindingError::BackendUnavailable { .. } => {
                Some("Install the backend (e.g. Knative Eventing/Serving) on the cluster")
            }
            BindingError::ResourceNotFound { .. } => {
                Some("Check the referenced name and namespace exist")
            }
            BindingError::UnsupportedServiceType { .. } => {
                Some("Reference a ClusterIP Service or use an explicit 'uri'")
            }
            BindingError::MissingTopic { .. } => Some("Add a 'topic' property to the endpoint"),
            BindingError::TopicNotFound { .. } => {
                Some("Create the KafkaTopic or reference it by its resource name")
            }
            BindingError::NoBootstrapServers { .. } => {
                Some("Enable the 'plain' listener on the Kafka cluster or set 'brokers' explicitly")
            }
            BindingError::MissingClusterLabel { .. } => {
                Some("Label the KafkaTopic with strimzi.io/cluster=<cluster name>")
            }
            BindingError::InvalidUri { .. } => Some("Use an absolute http(s) URL"),
            BindingError::Serialization { .. } => None,
            BindingError::InvalidResource { .. } => {
                Some("Fix the object on the cluster; retrying will not change the result")
            }
            BindingError::NoResolverMatched { .. } => {
                Some("Reference a supported kind or set an explicit 'uri'")
            }
            BindingError::InvalidManifest { .. } => {
                Some("Check the YAML syntax and that the pipe has a 'source' and a 'sink'")
            }
            BindingError::Config { .. } => Some("Check the TOML syntax of the config file"),
            BindingError::Cluster(_) => Some("Transient cluster error, the next reconcile retries"),
        }
    }
}
