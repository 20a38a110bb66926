//! # Cluster Client Seam
//!
//! Resolvers read cluster state through the narrow [`ClusterClient`] trait:
//! fetch one object, list objects by field, and ask whether an API kind is
//! served. All operations are read-only.
//!
//! Objects travel as kube [`DynamicObject`]s addressed by an
//! [`ApiResource`], and are decoded into typed resources with [`decode`]
//! where a resolver needs structure.
//!
//! ```rust
//! use pipe_bindings::cluster::{ApiResource, ClusterClient, DynamicObject, InMemoryCluster};
//! use k8s_openapi::api::core::v1::Service;
//!
//! # tokio_test_block(async {
//! let services = ApiResource::erase::<Service>(&());
//! let cluster = InMemoryCluster::new()
//!     .with_object(DynamicObject::new("my-svc", &services).within("test"));
//! let svc = cluster.get(&services, "test", "my-svc").await.unwrap();
//! assert!(svc.is_some());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod memory;
pub mod types;

use std::fmt;

use async_trait::async_trait;
use kube::core::ResourceExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{BindingError, ClusterError};

pub use kube::core::{ApiResource, DynamicObject, GroupVersion, GroupVersionKind};
pub use memory::InMemoryCluster;

/// Read-only access to cluster objects
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch one object; `Ok(None)` when it does not exist
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>, ClusterError>;

    /// List objects of a kind in a namespace matching a field selector
    async fn list(
        &self,
        resource: &ApiResource,
        namespace: &str,
        selector: &FieldSelector,
    ) -> Result<Vec<DynamicObject>, ClusterError>;

    /// Whether the API server serves the resource's kind at its version
    async fn is_installed(&self, resource: &ApiResource) -> Result<bool, ClusterError>;
}

/// Resource descriptor for `kind` at a parsed group/version
pub fn api_resource(group_version: &GroupVersion, kind: &str) -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(
        &group_version.group,
        &group_version.version,
        kind,
    ))
}

/// Value at a dotted path of the object body, such as `status.topicName`
pub fn field<'a>(object: &'a DynamicObject, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(&object.data, |value, segment| value.get(segment))
}

/// Decode a dynamic object into a typed resource.
///
/// A schema mismatch is a property of the object, so it surfaces as
/// `InvalidResource` and never as a retryable cluster error.
pub fn decode<T: DeserializeOwned>(object: &DynamicObject) -> crate::error::Result<T> {
    serde_json::to_value(object)
        .and_then(serde_json::from_value::<T>)
        .map_err(|e| BindingError::InvalidResource {
            kind: object
                .types
                .as_ref()
                .map(|types| types.kind.clone())
                .unwrap_or_default(),
            name: object.name_any(),
            reason: e.to_string(),
        })
}

/// Equality selector on a dotted field path (`status.topicName=x`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    pub path: String,
    pub value: String,
}

impl FieldSelector {
    pub fn equals(path: &str, value: &str) -> Self {
        Self {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    pub fn matches(&self, object: &DynamicObject) -> bool {
        field(object, &self.path).and_then(Value::as_str) == Some(self.value.as_str())
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.path, self.value)
    }
}
