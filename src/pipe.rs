//! Pipe manifests
//!
//! A pipe wires a source, optional intermediate steps and a sink. Each
//! endpoint is resolved with its role and position so generated ids stay
//! stable (`source`, `action-0`, `action-1`, `sink`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binding::{Binding, BindingContext};
use crate::endpoint::{Endpoint, EndpointContext};
use crate::error::{BindingError, Result};
use crate::resolver::{validate_endpoint, Catalog};

/// Pipe resource as written in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipe {
    #[serde(default)]
    pub metadata: PipeMetadata,
    pub spec: PipeSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipeMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipeSpec {
    pub source: Endpoint,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Endpoint>,
    pub sink: Endpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
}

impl PipeSpec {
    /// Every endpoint with its resolution context, in route order
    pub fn endpoints(&self) -> impl Iterator<Item = (EndpointContext, &Endpoint)> {
        std::iter::once((EndpointContext::source(), &self.source))
            .chain(
                self.steps
                    .iter()
                    .enumerate()
                    .map(|(position, step)| (EndpointContext::action(position), step)),
            )
            .chain(std::iter::once((EndpointContext::sink(), &self.sink)))
    }
}

impl Pipe {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| BindingError::InvalidManifest {
            reason: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BindingError::Config {
            reason: format!("Failed to read pipe file {}: {}", path.display(), e),
        })?;
        Self::from_yaml(&content)
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Labels then annotations; annotations win on conflicts
    pub fn metadata_entries(&self) -> BTreeMap<String, String> {
        let mut entries = self.metadata.labels.clone();
        entries.extend(self.metadata.annotations.clone());
        entries
    }
}

/// Resolved form of a pipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPipe {
    pub source: Binding,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Binding>,
    pub sink: Binding,
}

/// Resolve every endpoint of a pipe, stopping at the first error.
///
/// An endpoint no resolver claims is reported as `NoResolverMatched`.
pub async fn resolve_pipe(
    catalog: &Catalog,
    ctx: &BindingContext,
    spec: &PipeSpec,
) -> Result<ResolvedPipe> {
    let mut bindings = Vec::with_capacity(spec.steps.len() + 2);
    for (endpoint_ctx, endpoint) in spec.endpoints() {
        let binding = catalog
            .translate(ctx, &endpoint_ctx, endpoint)
            .await?
            .ok_or_else(|| BindingError::NoResolverMatched {
                role: endpoint_ctx.generate_id(),
                endpoint: endpoint.to_string(),
            })?;
        debug!(role = %endpoint_ctx.generate_id(), "endpoint resolved");
        bindings.push(binding);
    }

    // endpoints() always yields source first and sink last
    let sink = bindings.pop().unwrap_or_default();
    let mut rest = bindings.into_iter();
    let source = rest.next().unwrap_or_default();
    Ok(ResolvedPipe {
        source,
        steps: rest.collect(),
        sink,
    })
}

/// Run only the validation gate on every endpoint
pub fn validate_pipe(ctx: &BindingContext, spec: &PipeSpec) -> Result<usize> {
    let mut count = 0;
    for (_, endpoint) in spec.endpoints() {
        validate_endpoint(ctx, endpoint)?;
        count += 1;
    }
    Ok(count)
}
