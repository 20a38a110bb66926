//! Plain HTTP(S) sinks wrapped as knative endpoints
//!
//! On an eventing-enabled platform an HTTP sink is reached through the
//! knative component so events keep their CloudEvents envelope. The URL
//! is handed over in a static service environment instead of a sink
//! binding.

use async_trait::async_trait;

use super::{Resolution, Resolver, ORDER_STANDARD};
use crate::binding::{Binding, BindingContext, KnativeTrait, Traits};
use crate::endpoint::{Endpoint, EndpointContext, EndpointType};
use crate::error::Result;
use crate::knative::{Environment, ServiceDefinition, ServiceType};
use crate::uri::{append_parameters, scheme};

const SINK_SERVICE_NAME: &str = "sink";

pub struct KnativeUriResolver;

#[async_trait]
impl Resolver for KnativeUriResolver {
    fn id(&self) -> &str {
        "knative-uri"
    }

    fn order(&self) -> i32 {
        ORDER_STANDARD
    }

    async fn translate(
        &self,
        ctx: &BindingContext,
        endpoint_ctx: &EndpointContext,
        endpoint: &Endpoint,
    ) -> Resolution {
        let Some(uri) = endpoint.uri.as_deref() else {
            return Resolution::Skipped;
        };
        if !matches!(scheme(uri).as_deref(), Some("http" | "https")) {
            return Resolution::Skipped;
        }
        if !ctx.profile.eventing_enabled() || endpoint_ctx.is(EndpointType::Source) {
            return Resolution::Skipped;
        }
        wrap(uri, endpoint).into()
    }
}

fn wrap(uri: &str, endpoint: &Endpoint) -> Result<Binding> {
    let environment = Environment::new().with_service(ServiceDefinition::for_url(
        SINK_SERVICE_NAME,
        ServiceType::Endpoint,
        uri,
    )?);

    let props = endpoint.properties.to_string_map();
    let base = format!("knative:{}/{SINK_SERVICE_NAME}", ServiceType::Endpoint);

    let mut binding = Binding::from_uri(append_parameters(&base, &props));
    binding.traits = Traits {
        knative: Some(KnativeTrait {
            configuration: Some(environment.serialize()?),
            sink_binding: Some(false),
            ..KnativeTrait::default()
        }),
    };
    Ok(binding)
}
