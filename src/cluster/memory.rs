//! In-memory cluster
//!
//! Backs the CLI's offline mode and the test suites. Objects are matched by
//! API group and kind, so any served version of a group finds them.

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::{ApiResource, ClusterClient, DynamicObject, FieldSelector, GroupVersion};
use crate::error::ClusterError;

#[derive(Debug, Clone, Default)]
pub struct InMemoryCluster {
    objects: Vec<DynamicObject>,
    /// `(apiVersion, kind)` pairs served by the API server
    apis: BTreeSet<(String, String)>,
    /// Every call fails with this error when set
    failure: Option<ClusterError>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object; its API kind is marked as installed
    pub fn with_object(mut self, object: DynamicObject) -> Self {
        if let Some(types) = &object.types {
            self.apis
                .insert((types.api_version.clone(), types.kind.clone()));
        }
        self.objects.push(object);
        self
    }

    pub fn with_api(mut self, api_version: &str, kind: &str) -> Self {
        self.apis.insert((api_version.to_string(), kind.to_string()));
        self
    }

    /// Make every read fail, to exercise transient error propagation
    pub fn failing(mut self, error: ClusterError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Load objects from YAML: a sequence of objects or a `List` with `items`
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        use serde_yaml::Value;

        let doc: Value = serde_yaml::from_str(content)?;
        let items = match doc {
            Value::Sequence(items) => items,
            Value::Mapping(mut map) => match map.remove("items") {
                Some(Value::Sequence(items)) => items,
                _ => vec![Value::Mapping(map)],
            },
            Value::Null => Vec::new(),
            other => vec![other],
        };
        items
            .into_iter()
            .map(serde_yaml::from_value::<DynamicObject>)
            .try_fold(Self::new(), |cluster, object| object.map(|o| cluster.with_object(o)))
    }

    pub fn objects(&self) -> &[DynamicObject] {
        &self.objects
    }

    fn check(&self) -> Result<(), ClusterError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn same_kind(object: &DynamicObject, resource: &ApiResource) -> bool {
        object.types.as_ref().is_some_and(|types| {
            types.kind == resource.kind
                && types
                    .api_version
                    .parse::<GroupVersion>()
                    .is_ok_and(|gv| gv.group == resource.group)
        })
    }

    fn located(object: &DynamicObject, namespace: &str) -> bool {
        object.metadata.namespace.as_deref() == Some(namespace)
    }
}

#[async_trait]
impl ClusterClient for InMemoryCluster {
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>, ClusterError> {
        self.check()?;
        Ok(self
            .objects
            .iter()
            .find(|o| {
                Self::same_kind(o, resource)
                    && Self::located(o, namespace)
                    && o.metadata.name.as_deref() == Some(name)
            })
            .cloned())
    }

    async fn list(
        &self,
        resource: &ApiResource,
        namespace: &str,
        selector: &FieldSelector,
    ) -> Result<Vec<DynamicObject>, ClusterError> {
        self.check()?;
        Ok(self
            .objects
            .iter()
            .filter(|o| {
                Self::same_kind(o, resource) && Self::located(o, namespace) && selector.matches(o)
            })
            .cloned()
            .collect())
    }

    async fn is_installed(&self, resource: &ApiResource) -> Result<bool, ClusterError> {
        self.check()?;
        Ok(self
            .apis
            .contains(&(resource.api_version.clone(), resource.kind.clone())))
    }
}
