//! Typed views over the cluster objects resolvers read
//!
//! Core objects use the `k8s-openapi` types. Strimzi resources have no
//! published bindings, so only the status fields the resolvers need are
//! declared here.

use k8s_openapi::api::core::v1::Service;
use serde::Deserialize;

pub const SERVICE_TYPE_CLUSTER_IP: &str = "ClusterIP";

/// Declared type of a Service; the API server defaults it to ClusterIP
pub fn service_type(service: &Service) -> &str {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.type_.as_deref())
        .filter(|t| !t.is_empty())
        .unwrap_or(SERVICE_TYPE_CLUSTER_IP)
}

pub fn first_port(service: &Service) -> Option<i32> {
    service.spec.as_ref()?.ports.as_ref()?.first().map(|p| p.port)
}

/// Strimzi `Kafka` cluster, status only
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KafkaCluster {
    #[serde(default)]
    pub status: KafkaStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KafkaStatus {
    #[serde(default)]
    pub listeners: Vec<KafkaListener>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaListener {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bootstrap_servers: String,
}

impl KafkaCluster {
    pub fn listener(&self, name: &str) -> Option<&KafkaListener> {
        self.status.listeners.iter().find(|l| l.name == name)
    }
}
