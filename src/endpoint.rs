//! Endpoint model - the declarative input of a binding
//!
//! An [`Endpoint`] is either a reference to a cluster object or an explicit
//! URI, plus a property bag and optional data-type hints. The
//! [`EndpointContext`] carries the role the endpoint plays in a pipe.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cluster::GroupVersion;
use crate::error::{BindingError, Result};

pub use k8s_openapi::api::core::v1::ObjectReference;

/// Reference to `kind` named `name` under `api_version`, in the pipe namespace
pub fn object_ref(api_version: &str, kind: &str, name: &str) -> ObjectReference {
    ObjectReference {
        api_version: Some(api_version.to_string()),
        kind: Some(kind.to_string()),
        name: Some(name.to_string()),
        ..ObjectReference::default()
    }
}

/// Endpoint-side view of an [`ObjectReference`]: unset fields read as empty
pub trait ReferenceExt {
    fn kind(&self) -> &str;

    fn api_version(&self) -> &str;

    fn name(&self) -> &str;

    fn namespace(&self) -> &str;

    fn in_namespace(self, namespace: &str) -> Self;

    /// Parse `apiVersion`.
    ///
    /// Core resources (`v1`) have an empty group. More than one `/` or an
    /// empty version is invalid.
    fn group_version(&self) -> Result<GroupVersion>;

    /// API group of the reference, empty for core resources
    fn group(&self) -> Result<String> {
        self.group_version().map(|gv| gv.group)
    }

    /// Namespace of the reference, or `fallback` when unset
    fn namespace_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.namespace() {
            "" => fallback,
            namespace => namespace,
        }
    }

    /// `apiVersion/kind 'name'`, with the namespace when set
    fn describe(&self) -> String {
        let mut out = format!("{}/{} '{}'", self.api_version(), self.kind(), self.name());
        if !self.namespace().is_empty() {
            out.push_str(&format!(" in namespace '{}'", self.namespace()));
        }
        out
    }
}

impl ReferenceExt for ObjectReference {
    fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or_default()
    }

    fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or_default()
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or_default()
    }

    fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    fn group_version(&self) -> Result<GroupVersion> {
        let invalid = || BindingError::InvalidApiVersion {
            api_version: self.api_version().to_string(),
            name: self.name().to_string(),
        };
        if self.api_version().is_empty() {
            return Ok(GroupVersion {
                group: String::new(),
                version: String::new(),
            });
        }
        let gv: GroupVersion = self.api_version().parse().map_err(|_| invalid())?;
        if gv.version.is_empty() || gv.version.contains('/') {
            return Err(invalid());
        }
        Ok(gv)
    }
}

/// Opaque endpoint properties (key → JSON value), ordered by key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, Value>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten every value to its string form.
    ///
    /// Strings are taken verbatim, scalars use their JSON text and
    /// structured values are rendered as compact JSON.
    pub fn to_string_map(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| {
                let s = match v {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (k.clone(), s)
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Boundary at which a payload conversion applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeSlot {
    In,
    Out,
}

impl fmt::Display for TypeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSlot::In => write!(f, "in"),
            TypeSlot::Out => write!(f, "out"),
        }
    }
}

/// Required data format at a slot; `scheme` defaults to `camel`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTypeReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default)]
    pub format: String,
}

impl DataTypeReference {
    pub const DEFAULT_SCHEME: &'static str = "camel";

    pub fn new(format: &str) -> Self {
        Self {
            scheme: None,
            format: format.to_string(),
        }
    }

    /// Effective `(scheme, format)`.
    ///
    /// Without an explicit scheme, a `scheme:format` value is split on the
    /// first colon.
    pub fn scheme_and_format(&self) -> (&str, &str) {
        match self.scheme.as_deref() {
            Some(scheme) if !scheme.is_empty() => (scheme, &self.format),
            _ => match self.format.split_once(':') {
                Some((scheme, format)) => (scheme, format),
                None => (Self::DEFAULT_SCHEME, &self.format),
            },
        }
    }
}

pub type DataTypes = BTreeMap<TypeSlot, DataTypeReference>;

/// A source, sink or action connection point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ObjectReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_types: DataTypes,
}

impl Endpoint {
    pub fn from_ref(reference: ObjectReference) -> Self {
        Self {
            reference: Some(reference),
            ..Self::default()
        }
    }

    pub fn from_uri(uri: &str) -> Self {
        Self {
            uri: Some(uri.to_string()),
            ..Self::default()
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_data_type(mut self, slot: TypeSlot, data_type: DataTypeReference) -> Self {
        self.data_types.insert(slot, data_type);
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.reference, &self.uri) {
            (Some(r), _) => write!(f, "{}", r.describe()),
            (None, Some(uri)) => write!(f, "'{uri}'"),
            (None, None) => write!(f, "<empty>"),
        }
    }
}

/// Role of an endpoint inside a pipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    Source,
    Sink,
    Action,
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointType::Source => write!(f, "source"),
            EndpointType::Sink => write!(f, "sink"),
            EndpointType::Action => write!(f, "action"),
        }
    }
}

/// Resolution-time role metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointContext {
    pub endpoint_type: Option<EndpointType>,
    pub position: Option<usize>,
}

impl EndpointContext {
    pub fn source() -> Self {
        Self {
            endpoint_type: Some(EndpointType::Source),
            position: None,
        }
    }

    pub fn sink() -> Self {
        Self {
            endpoint_type: Some(EndpointType::Sink),
            position: None,
        }
    }

    pub fn action(position: usize) -> Self {
        Self {
            endpoint_type: Some(EndpointType::Action),
            position: Some(position),
        }
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn is(&self, endpoint_type: EndpointType) -> bool {
        self.endpoint_type == Some(endpoint_type)
    }

    /// Stable per-role identity, e.g. `source`, `action-2`.
    ///
    /// An endpoint without a role is identified as `endpoint`.
    pub fn generate_id(&self) -> String {
        let role = self
            .endpoint_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "endpoint".to_string());
        match self.position {
            Some(position) => format!("{role}-{position}"),
            None => role,
        }
    }
}
