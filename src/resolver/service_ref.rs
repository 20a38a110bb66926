//! References to in-cluster HTTP services
//!
//! Core `Service`s are addressed through their cluster DNS name.
//! Integrations and Pipes expose a Service of the same name, so a
//! reference to one of them is resolved through that Service.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use tracing::debug;

use super::{Resolution, Resolver, KAMELET_GROUP, ORDER_LAST};
use crate::binding::{Binding, BindingContext};
use crate::cluster::types::{first_port, service_type, SERVICE_TYPE_CLUSTER_IP};
use crate::cluster::{decode, ApiResource};
use crate::endpoint::{Endpoint, EndpointContext, ObjectReference, ReferenceExt};
use crate::error::{BindingError, Result};
use crate::uri::append_parameters;

const SERVICE_KIND: &str = "Service";
const PATH_PROPERTY: &str = "path";

pub struct ServiceRefResolver;

impl ServiceRefResolver {
    fn claims(group: &str, kind: &str) -> bool {
        match group {
            "" => kind == SERVICE_KIND,
            KAMELET_GROUP => matches!(kind, "Integration" | "Pipe"),
            _ => false,
        }
    }
}

#[async_trait]
impl Resolver for ServiceRefResolver {
    fn id(&self) -> &str {
        "service-ref"
    }

    fn order(&self) -> i32 {
        ORDER_LAST - 10
    }

    async fn translate(
        &self,
        ctx: &BindingContext,
        _endpoint_ctx: &EndpointContext,
        endpoint: &Endpoint,
    ) -> Resolution {
        let Some(reference) = &endpoint.reference else {
            return Resolution::Skipped;
        };
        match reference.group() {
            Ok(group) if Self::claims(&group, reference.kind()) => {
                resolve(ctx, endpoint, reference).await.into()
            }
            _ => Resolution::Skipped,
        }
    }
}

async fn resolve(
    ctx: &BindingContext,
    endpoint: &Endpoint,
    reference: &ObjectReference,
) -> Result<Binding> {
    let name = reference.name();
    let namespace = reference.namespace_or(&ctx.namespace);
    let object = ctx
        .client
        .get(&ApiResource::erase::<Service>(&()), namespace, name)
        .await?
        .ok_or_else(|| BindingError::ResourceNotFound {
            kind: SERVICE_KIND.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        })?;
    let service: Service = decode(&object)?;

    if service_type(&service) != SERVICE_TYPE_CLUSTER_IP {
        return Err(BindingError::UnsupportedServiceType {
            name: name.to_string(),
            service_type: service_type(&service).to_string(),
        });
    }

    let mut uri = format!("http://{name}.{namespace}.{}", ctx.config.cluster_domain);
    if let Some(port) = first_port(&service) {
        uri.push_str(&format!(":{port}"));
    }

    let mut props = endpoint.properties.to_string_map();
    if let Some(path) = props.remove(PATH_PROPERTY).filter(|p| !p.is_empty()) {
        uri.push('/');
        uri.push_str(path.trim_start_matches('/'));
    }
    debug!(reference = %reference.describe(), %uri, "service address");

    Ok(Binding::from_uri(append_parameters(&uri, &props)))
}
