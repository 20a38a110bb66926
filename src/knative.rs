//! Knative kind tables and the static service environment
//!
//! The tables list the eventing/serving kinds an endpoint reference may
//! point at. Channels and brokers are also addressable endpoints; lookup
//! order (channel, broker, endpoint) decides the shape of a reference.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::cluster::{ApiResource, GroupVersion, GroupVersionKind};
use crate::error::{BindingError, Result};

pub const KNATIVE_SCHEME: &str = "knative";

/// Metadata keys understood by the runtime's knative component
pub const META_ENDPOINT_KIND: &str = "camel.endpoint.kind";
pub const META_API_VERSION: &str = "knative.apiVersion";
pub const META_KIND: &str = "knative.kind";
pub const META_SERVICE_PATH: &str = "service.path";

/// Shape of a knative endpoint URI (`knative:<shape>/...`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    /// Point-to-point addressable
    Endpoint,
    /// Fan-out channel
    Channel,
    /// Broadcast broker
    Event,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceType::Endpoint => write!(f, "endpoint"),
            ServiceType::Channel => write!(f, "channel"),
            ServiceType::Event => write!(f, "event"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownKind {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub resource: &'static str,
}

impl KnownKind {
    const fn new(
        group: &'static str,
        version: &'static str,
        kind: &'static str,
        resource: &'static str,
    ) -> Self {
        Self {
            group,
            version,
            kind,
            resource,
        }
    }

    fn matches(&self, group: &str, kind: &str) -> bool {
        self.group == group && self.kind == kind
    }

    /// Resource served for this entry, with its registered plural
    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(self.group, self.version, self.kind),
            self.resource,
        )
    }
}

pub const CHANNEL_KINDS: &[KnownKind] = &[
    KnownKind::new("messaging.knative.dev", "v1", "Channel", "channels"),
    KnownKind::new("messaging.knative.dev", "v1beta1", "Channel", "channels"),
    KnownKind::new("messaging.knative.dev", "v1", "InMemoryChannel", "inmemorychannels"),
    KnownKind::new("messaging.knative.dev", "v1beta1", "InMemoryChannel", "inmemorychannels"),
    KnownKind::new("messaging.knative.dev", "v1beta1", "KafkaChannel", "kafkachannels"),
    KnownKind::new("messaging.knative.dev", "v1alpha1", "KafkaChannel", "kafkachannels"),
    KnownKind::new("messaging.knative.dev", "v1alpha1", "NatssChannel", "natsschannels"),
];

pub const SERVING_KINDS: &[KnownKind] = &[
    KnownKind::new("serving.knative.dev", "v1", "Service", "services"),
    KnownKind::new("serving.knative.dev", "v1beta1", "Service", "services"),
    KnownKind::new("serving.knative.dev", "v1alpha1", "Service", "services"),
];

pub const BROKER_KINDS: &[KnownKind] = &[
    KnownKind::new("eventing.knative.dev", "v1", "Broker", "brokers"),
    KnownKind::new("eventing.knative.dev", "v1beta1", "Broker", "brokers"),
];

/// Every addressable kind: serving services, then channels, then brokers
pub fn endpoint_kinds() -> impl Iterator<Item = &'static KnownKind> {
    SERVING_KINDS
        .iter()
        .chain(CHANNEL_KINDS.iter())
        .chain(BROKER_KINDS.iter())
}

/// Whether `(group, kind)` is any known knative kind
pub fn is_known_kind(group: &str, kind: &str) -> bool {
    endpoint_kinds().any(|k| k.matches(group, kind))
}

/// Shape of a reference, `None` when the kind is not a knative kind
pub fn service_type(group: &str, kind: &str) -> Option<ServiceType> {
    if CHANNEL_KINDS.iter().any(|k| k.matches(group, kind)) {
        return Some(ServiceType::Channel);
    }
    if BROKER_KINDS.iter().any(|k| k.matches(group, kind)) {
        return Some(ServiceType::Event);
    }
    if endpoint_kinds().any(|k| k.matches(group, kind)) {
        return Some(ServiceType::Endpoint);
    }
    None
}

/// Shape and table entry of a reference.
///
/// The entry at the reference's own version is preferred; otherwise the
/// first entry for the group and kind stands in for it.
pub fn lookup(
    group_version: &GroupVersion,
    kind: &str,
) -> Option<(ServiceType, &'static KnownKind)> {
    let service_type = service_type(&group_version.group, kind)?;
    let known = endpoint_kinds()
        .filter(|k| k.matches(&group_version.group, kind))
        .min_by_key(|k| k.version != group_version.version)?;
    Some((service_type, known))
}

const ENDPOINT_KIND_SINK: &str = "sink";

/// One service entry of the static knative environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub url: String,
    pub path: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub metadata: BTreeMap<String, String>,
}

impl ServiceDefinition {
    /// Describe an external HTTP(S) URL as a knative sink.
    ///
    /// Fails with `InvalidUri` when `raw` is not an absolute URL.
    pub fn for_url(name: &str, service_type: ServiceType, raw: &str) -> Result<Self> {
        let parsed = url::Url::parse(raw).map_err(|e| BindingError::InvalidUri {
            uri: raw.to_string(),
            reason: e.to_string(),
        })?;
        let path = parsed.path().to_string();

        let mut metadata = BTreeMap::new();
        metadata.insert(META_ENDPOINT_KIND.to_string(), ENDPOINT_KIND_SINK.to_string());
        metadata.insert(META_API_VERSION.to_string(), String::new());
        metadata.insert(META_KIND.to_string(), String::new());
        metadata.insert(META_SERVICE_PATH.to_string(), path.clone());

        Ok(Self {
            name: name.to_string(),
            url: raw.to_string(),
            path,
            service_type,
            metadata,
        })
    }
}

/// Static service environment injected into the knative trait
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub services: Vec<ServiceDefinition>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service: ServiceDefinition) -> Self {
        self.services.push(service);
        self
    }

    pub fn serialize(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| BindingError::Serialization {
            what: "knative environment".to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn shapes() {
        assert_eq!(
            service_type("messaging.knative.dev", "Channel"),
            Some(ServiceType::Channel)
        );
        assert_eq!(
            service_type("messaging.knative.dev", "KafkaChannel"),
            Some(ServiceType::Channel)
        );
        assert_eq!(service_type("eventing.knative.dev", "Broker"), Some(ServiceType::Event));
        assert_eq!(
            service_type("serving.knative.dev", "Service"),
            Some(ServiceType::Endpoint)
        );
        assert_eq!(service_type("", "Service"), None);
        assert_eq!(service_type("eventing.knative.dev", "Trigger"), None);
    }

    #[test]
    fn known_kinds() {
        assert!(is_known_kind("eventing.knative.dev", "Broker"));
        assert!(!is_known_kind("camel.apache.org", "Kamelet"));
        assert_eq!(endpoint_kinds().count(), 12);
    }

    #[test]
    fn lookup_prefers_the_referenced_version() {
        let gv: GroupVersion = "messaging.knative.dev/v1beta1".parse().unwrap();
        let (shape, known) = lookup(&gv, "InMemoryChannel").unwrap();
        assert_eq!(shape, ServiceType::Channel);
        let resource = known.api_resource();
        assert_eq!(resource.api_version, "messaging.knative.dev/v1beta1");
        assert_eq!(resource.plural, "inmemorychannels");

        let unknown_version: GroupVersion = "eventing.knative.dev/v2".parse().unwrap();
        let (shape, known) = lookup(&unknown_version, "Broker").unwrap();
        assert_eq!(shape, ServiceType::Event);
        assert_eq!(known.api_resource().api_version, "eventing.knative.dev/v1");

        let core: GroupVersion = "v1".parse().unwrap();
        assert!(lookup(&core, "Service").is_none());
    }

    #[test]
    fn environment_serialization() {
        let def = ServiceDefinition::for_url("sink", ServiceType::Endpoint, "https://myurl/hey").unwrap();
        let env = Environment::new().with_service(def);
        let value: serde_json::Value = serde_json::from_str(&env.serialize().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "services": [{
                    "name": "sink",
                    "url": "https://myurl/hey",
                    "path": "/hey",
                    "type": "endpoint",
                    "metadata": {
                        "camel.endpoint.kind": "sink",
                        "knative.apiVersion": "",
                        "knative.kind": "",
                        "service.path": "/hey"
                    }
                }]
            })
        );
    }

    #[test]
    fn relative_url_is_rejected() {
        let err = ServiceDefinition::for_url("sink", ServiceType::Endpoint, "/x").unwrap_err();
        assert_eq!(err.code(), "BIND-050");
    }
}
