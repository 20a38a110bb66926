//! Explicit URI endpoints

use async_trait::async_trait;

use super::{Resolution, Resolver, ORDER_LAST};
use crate::binding::{Binding, BindingContext};
use crate::endpoint::{Endpoint, EndpointContext};
use crate::uri::append_parameters;

/// Catch-all for endpoints given as a URI: properties become query parameters
pub struct UriResolver;

#[async_trait]
impl Resolver for UriResolver {
    fn id(&self) -> &str {
        "uri"
    }

    fn order(&self) -> i32 {
        ORDER_LAST
    }

    async fn translate(
        &self,
        _ctx: &BindingContext,
        _endpoint_ctx: &EndpointContext,
        endpoint: &Endpoint,
    ) -> Resolution {
        let Some(uri) = endpoint.uri.as_deref() else {
            return Resolution::Skipped;
        };
        let props = endpoint.properties.to_string_map();
        Resolution::Resolved(Binding::from_uri(append_parameters(uri, &props)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::InMemoryCluster;
    use crate::endpoint::{object_ref, Properties};
    use std::sync::Arc;

    fn ctx() -> BindingContext {
        BindingContext::new("test", Arc::new(InMemoryCluster::new()))
    }

    async fn run(endpoint: &Endpoint) -> Resolution {
        UriResolver
            .translate(&ctx(), &EndpointContext::sink(), endpoint)
            .await
    }

    #[tokio::test]
    async fn properties_become_sorted_query() {
        let endpoint = Endpoint::from_uri("timer:tick").with_properties(
            Properties::new().with("period", 1000).with("delay", "5 s"),
        );
        let Resolution::Resolved(binding) = run(&endpoint).await else {
            panic!("expected a binding");
        };
        assert_eq!(binding.uri(), Some("timer:tick?delay=5+s&period=1000"));
        assert!(binding.step.is_none());
        assert!(binding.traits.is_empty());
    }

    #[tokio::test]
    async fn existing_query_is_extended() {
        let endpoint = Endpoint::from_uri("log:info?showAll=true")
            .with_properties(Properties::new().with("level", "WARN"));
        let Resolution::Resolved(binding) = run(&endpoint).await else {
            panic!("expected a binding");
        };
        assert_eq!(binding.uri(), Some("log:info?showAll=true&level=WARN"));
    }

    #[tokio::test]
    async fn references_are_skipped() {
        let endpoint = Endpoint::from_ref(object_ref("v1", "Service", "s"));
        assert!(run(&endpoint).await.is_skipped());
    }
}
