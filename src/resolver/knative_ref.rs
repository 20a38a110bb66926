//! References to knative serving services, channels and brokers

use async_trait::async_trait;
use tracing::debug;

use super::{Resolution, Resolver, ORDER_LAST};
use crate::binding::{Binding, BindingContext, KnativeTrait, Traits};
use crate::endpoint::{Endpoint, EndpointContext, EndpointType, ObjectReference, ReferenceExt};
use crate::error::{BindingError, Result};
use crate::knative::{self, KnownKind, ServiceType, KNATIVE_SCHEME};
use crate::uri::{append_parameters, path_escape};

const EVENT_TYPE_PROPERTY: &str = "type";
const CLOUD_EVENTS_TYPE_PROPERTY: &str = "cloudEventsType";
const NAME_PROPERTY: &str = "name";

pub struct KnativeRefResolver;

#[async_trait]
impl Resolver for KnativeRefResolver {
    fn id(&self) -> &str {
        "knative-ref"
    }

    fn order(&self) -> i32 {
        ORDER_LAST
    }

    async fn translate(
        &self,
        ctx: &BindingContext,
        endpoint_ctx: &EndpointContext,
        endpoint: &Endpoint,
    ) -> Resolution {
        let Some(reference) = &endpoint.reference else {
            return Resolution::Skipped;
        };
        let Ok(group_version) = reference.group_version() else {
            return Resolution::Skipped;
        };
        let Some((service_type, known)) = knative::lookup(&group_version, reference.kind()) else {
            return Resolution::Skipped;
        };
        resolve(ctx, endpoint_ctx, endpoint, reference, service_type, known)
            .await
            .into()
    }
}

async fn resolve(
    ctx: &BindingContext,
    endpoint_ctx: &EndpointContext,
    endpoint: &Endpoint,
    reference: &ObjectReference,
    service_type: ServiceType,
    known: &KnownKind,
) -> Result<Binding> {
    let resource = known.api_resource();
    if !ctx.client.is_installed(&resource).await? {
        return Err(BindingError::BackendUnavailable {
            api_version: resource.api_version,
            kind: resource.kind,
            name: reference.name().to_string(),
        });
    }

    let is_source = endpoint_ctx.is(EndpointType::Source);
    let mut props = endpoint.properties.to_string_map();
    let mut filters = Vec::new();
    let mut filter_event_type = true;

    let base = if service_type == ServiceType::Event {
        let name = props
            .remove(NAME_PROPERTY)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| reference.name().to_string());
        props.insert(NAME_PROPERTY.to_string(), name);

        let base = if let Some(event_type) = props.remove(EVENT_TYPE_PROPERTY) {
            format!("{KNATIVE_SCHEME}:{service_type}/{}", path_escape(&event_type))
        } else if let Some(cloud_events_type) =
            props.get(CLOUD_EVENTS_TYPE_PROPERTY).filter(|_| is_source)
        {
            format!("{KNATIVE_SCHEME}:{service_type}/{}", path_escape(cloud_events_type))
        } else {
            filter_event_type = false;
            format!("{KNATIVE_SCHEME}:{service_type}")
        };

        if is_source {
            filters = event_filters(&props);
            for filter in &filters {
                if let Some((key, _)) = filter.split_once('=') {
                    props.remove(key);
                }
            }
        }
        base
    } else {
        format!(
            "{KNATIVE_SCHEME}:{service_type}/{}",
            path_escape(reference.name())
        )
    };

    props
        .entry("apiVersion".to_string())
        .or_insert_with(|| reference.api_version().to_string());
    props
        .entry("kind".to_string())
        .or_insert_with(|| reference.kind().to_string());

    let mut binding = Binding::from_uri(append_parameters(&base, &props));
    if is_source && (!filters.is_empty() || !filter_event_type) {
        debug!(?filters, filter_event_type, "attaching knative event filters");
        binding.traits = Traits {
            knative: Some(KnativeTrait {
                filters,
                filter_event_type: Some(filter_event_type),
                ..KnativeTrait::default()
            }),
        };
    }
    Ok(binding)
}

/// Subscription filters for a broker source, sorted.
///
/// Every property but `name` filters on the attribute of the same name;
/// `cloudEventsType` filters on `type`.
fn event_filters(props: &std::collections::BTreeMap<String, String>) -> Vec<String> {
    let mut filters: Vec<String> = props
        .iter()
        .filter(|(key, _)| key.as_str() != NAME_PROPERTY)
        .map(|(key, value)| {
            if key == CLOUD_EVENTS_TYPE_PROPERTY {
                format!("{EVENT_TYPE_PROPERTY}={value}")
            } else {
                format!("{key}={value}")
            }
        })
        .collect();
    filters.sort();
    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::InMemoryCluster;
    use crate::endpoint::{object_ref, Properties};
    use crate::error::ClusterError;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn installed() -> InMemoryCluster {
        InMemoryCluster::new()
            .with_api("serving.knative.dev/v1", "Service")
            .with_api("eventing.knative.dev/v1", "Broker")
            .with_api("messaging.knative.dev/v1", "Channel")
    }

    fn ctx(cluster: InMemoryCluster) -> BindingContext {
        BindingContext::new("test", Arc::new(cluster))
    }

    fn broker(props: Properties) -> Endpoint {
        Endpoint::from_ref(object_ref("eventing.knative.dev/v1", "Broker", "default"))
            .with_properties(props)
    }

    async fn resolve_ok(endpoint_ctx: EndpointContext, endpoint: &Endpoint) -> Binding {
        match KnativeRefResolver
            .translate(&ctx(installed()), &endpoint_ctx, endpoint)
            .await
        {
            Resolution::Resolved(binding) => binding,
            other => panic!("expected a binding, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn serving_service_sink() {
        let endpoint = Endpoint::from_ref(object_ref(
            "serving.knative.dev/v1",
            "Service",
            "myservice",
        ));
        let binding = resolve_ok(EndpointContext::sink(), &endpoint).await;
        assert_eq!(
            binding.uri(),
            Some("knative:endpoint/myservice?apiVersion=serving.knative.dev%2Fv1&kind=Service")
        );
        assert!(binding.traits.is_empty());
    }

    #[tokio::test]
    async fn channel_keeps_properties_in_query() {
        let endpoint = Endpoint::from_ref(object_ref(
            "messaging.knative.dev/v1",
            "Channel",
            "mychannel",
        ))
        .with_properties(Properties::new().with("source", "x"));
        let binding = resolve_ok(EndpointContext::source(), &endpoint).await;
        assert_eq!(
            binding.uri(),
            Some("knative:channel/mychannel?apiVersion=messaging.knative.dev%2Fv1&kind=Channel&source=x")
        );
        assert!(binding.traits.is_empty());
    }

    #[tokio::test]
    async fn broker_source_with_type() {
        let endpoint = broker(Properties::new().with("type", "org.apache.camel.myevent"));
        let binding = resolve_ok(EndpointContext::source(), &endpoint).await;
        assert_eq!(
            binding.uri(),
            Some("knative:event/org.apache.camel.myevent?apiVersion=eventing.knative.dev%2Fv1&kind=Broker&name=default")
        );
        assert!(binding.traits.is_empty());
    }

    #[tokio::test]
    async fn broker_source_with_filters() {
        let endpoint = broker(
            Properties::new()
                .with("source", "my-source")
                .with("subject", "mySubject"),
        );
        let binding = resolve_ok(EndpointContext::source(), &endpoint).await;
        assert_eq!(
            binding.uri(),
            Some("knative:event?apiVersion=eventing.knative.dev%2Fv1&kind=Broker&name=default")
        );
        let knative = binding.traits.knative.unwrap();
        assert_eq!(knative.filters, vec!["source=my-source", "subject=mySubject"]);
        assert_eq!(knative.filter_event_type, Some(false));
    }

    #[tokio::test]
    async fn broker_source_with_cloud_events_type() {
        let endpoint = broker(Properties::new().with("cloudEventsType", "my.type"));
        let binding = resolve_ok(EndpointContext::source(), &endpoint).await;
        assert_eq!(
            binding.uri(),
            Some("knative:event/my.type?apiVersion=eventing.knative.dev%2Fv1&cloudEventsType=my.type&kind=Broker&name=default")
        );
        let knative = binding.traits.knative.unwrap();
        assert_eq!(knative.filters, vec!["type=my.type"]);
        assert_eq!(knative.filter_event_type, Some(true));
    }

    #[tokio::test]
    async fn broker_sink_has_no_filters() {
        let endpoint = broker(Properties::new().with("name", "other").with("source", "s"));
        let binding = resolve_ok(EndpointContext::sink(), &endpoint).await;
        assert_eq!(
            binding.uri(),
            Some("knative:event?apiVersion=eventing.knative.dev%2Fv1&kind=Broker&name=other&source=s")
        );
        assert!(binding.traits.is_empty());
    }

    #[tokio::test]
    async fn empty_broker_name_falls_back_to_the_reference() {
        let endpoint = broker(Properties::new().with("name", ""));
        for endpoint_ctx in [EndpointContext::sink(), EndpointContext::source()] {
            let binding = resolve_ok(endpoint_ctx, &endpoint).await;
            assert_eq!(
                binding.uri(),
                Some("knative:event?apiVersion=eventing.knative.dev%2Fv1&kind=Broker&name=default")
            );
        }
    }

    #[tokio::test]
    async fn backend_check_uses_the_table_entry() {
        let older = Endpoint::from_ref(object_ref("eventing.knative.dev/v1beta1", "Broker", "default"));
        let resolution = KnativeRefResolver
            .translate(&ctx(installed()), &EndpointContext::sink(), &older)
            .await;
        let Resolution::Failed(err) = resolution else {
            panic!("expected a failure");
        };
        assert_eq!(err.code(), "BIND-020");
        assert!(err.to_string().contains("eventing.knative.dev/v1beta1/Broker"));
    }

    #[tokio::test]
    async fn missing_backend_is_reported() {
        let resolution = KnativeRefResolver
            .translate(&ctx(InMemoryCluster::new()), &EndpointContext::sink(), &broker(Properties::new()))
            .await;
        let Resolution::Failed(err) = resolution else {
            panic!("expected a failure");
        };
        assert_eq!(err.code(), "BIND-020");
    }

    #[tokio::test]
    async fn cluster_errors_pass_through() {
        let cluster = InMemoryCluster::new().failing(ClusterError::Throttled {
            message: "slow down".to_string(),
        });
        let resolution = KnativeRefResolver
            .translate(&ctx(cluster), &EndpointContext::sink(), &broker(Properties::new()))
            .await;
        let Resolution::Failed(err) = resolution else {
            panic!("expected a failure");
        };
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn other_kinds_are_skipped() {
        for endpoint in [
            Endpoint::from_ref(object_ref("v1", "Service", "s")),
            Endpoint::from_ref(object_ref("camel.apache.org/v1", "Kamelet", "k")),
            Endpoint::from_uri("https://example.com"),
        ] {
            let resolution = KnativeRefResolver
                .translate(&ctx(installed()), &EndpointContext::sink(), &endpoint)
                .await;
            assert!(resolution.is_skipped(), "{endpoint} should be skipped");
        }
    }
}
