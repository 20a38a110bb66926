//! # Resolver Catalog
//!
//! Turns an [`Endpoint`] into a [`Binding`] by asking an ordered list of
//! [`Resolver`]s in turn. The first resolver that resolves or fails wins.
//!
//! ## Resolution order
//!
//! Resolvers are sorted by `(order, id)`. Narrow resolvers sit at
//! [`ORDER_STANDARD`]; broad catch-alls sit at [`ORDER_LAST`] so they never
//! shadow a more specific match.
//!
//! | Resolver | Order | Claims |
//! |----------|-------|--------|
//! | `kamelet` | standard | `camel.apache.org` Kamelet references |
//! | `knative-uri` | standard | `http(s)` sink URIs on the knative profile |
//! | `strimzi` | standard | `kafka.strimzi.io` Kafka / KafkaTopic references |
//! | `service-ref` | last - 10 | core Services, Integrations, Pipes |
//! | `knative-ref` | last | serving / messaging / eventing references |
//! | `uri` | last | any explicit URI |
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use pipe_bindings::{translate, BindingContext, Endpoint, EndpointContext};
//! use pipe_bindings::cluster::InMemoryCluster;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let ctx = BindingContext::new("test", Arc::new(InMemoryCluster::new()));
//! let binding = translate(&ctx, &EndpointContext::sink(), &Endpoint::from_uri("log:info"))
//!     .await
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(binding.uri(), Some("log:info"));
//! # });
//! ```

mod kamelet;
mod knative_ref;
mod knative_uri;
mod service_ref;
mod strimzi;
mod uri;
mod validate;

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::{debug, info, instrument};

use crate::binding::{Binding, BindingContext};
use crate::endpoint::{Endpoint, EndpointContext};
use crate::error::{BindingError, Result};

pub use kamelet::{KameletResolver, KAMELET_GROUP, KAMELET_KIND};
pub use knative_ref::KnativeRefResolver;
pub use knative_uri::KnativeUriResolver;
pub use service_ref::ServiceRefResolver;
pub use strimzi::StrimziResolver;
pub use uri::UriResolver;
pub use validate::validate_endpoint;

/// Reserved for resolvers that must run before everything else
pub const ORDER_FIRST: i32 = 0;
/// Specific resolvers
pub const ORDER_STANDARD: i32 = 50;
/// Broad fallbacks
pub const ORDER_LAST: i32 = 100;

/// Outcome of one resolver on one endpoint
#[derive(Debug)]
pub enum Resolution {
    /// Not this resolver's kind of endpoint; try the next one
    Skipped,
    Resolved(Binding),
    /// Claimed but cannot be resolved; stops the chain
    Failed(BindingError),
}

impl Resolution {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Resolution::Skipped)
    }
}

impl From<Result<Binding>> for Resolution {
    fn from(result: Result<Binding>) -> Self {
        match result {
            Ok(binding) => Resolution::Resolved(binding),
            Err(err) => Resolution::Failed(err),
        }
    }
}

/// One strategy able to claim and translate a class of endpoints
#[async_trait]
pub trait Resolver: Send + Sync {
    fn id(&self) -> &str;

    fn order(&self) -> i32;

    async fn translate(
        &self,
        ctx: &BindingContext,
        endpoint_ctx: &EndpointContext,
        endpoint: &Endpoint,
    ) -> Resolution;
}

/// Ordered set of resolvers
#[derive(Clone, Default)]
pub struct Catalog {
    resolvers: Vec<Arc<dyn Resolver>>,
}

impl Catalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every built-in resolver
    pub fn with_defaults() -> Self {
        Self::new()
            .with(UriResolver)
            .with(KnativeRefResolver)
            .with(KnativeUriResolver)
            .with(KameletResolver)
            .with(ServiceRefResolver)
            .with(StrimziResolver)
    }

    pub fn with(mut self, resolver: impl Resolver + 'static) -> Self {
        self.register(Arc::new(resolver));
        self
    }

    /// Insert a resolver and restore `(order, id)` ordering
    pub fn register(&mut self, resolver: Arc<dyn Resolver>) {
        self.resolvers.push(resolver);
        self.resolvers
            .sort_by(|a, b| a.order().cmp(&b.order()).then_with(|| a.id().cmp(b.id())));
    }

    /// Resolver ids in resolution order
    pub fn ids(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.id()).collect()
    }

    /// Validate the endpoint, then let the first claiming resolver translate it.
    ///
    /// `Ok(None)` means no resolver recognized the endpoint.
    #[instrument(
        name = "translate",
        skip_all,
        fields(namespace = %ctx.namespace, role = %endpoint_ctx.generate_id(), endpoint = %endpoint)
    )]
    pub async fn translate(
        &self,
        ctx: &BindingContext,
        endpoint_ctx: &EndpointContext,
        endpoint: &Endpoint,
    ) -> Result<Option<Binding>> {
        validate_endpoint(ctx, endpoint)?;

        for resolver in &self.resolvers {
            match resolver.translate(ctx, endpoint_ctx, endpoint).await {
                Resolution::Skipped => {
                    debug!(resolver = resolver.id(), "skipped");
                }
                Resolution::Resolved(binding) => {
                    info!(resolver = resolver.id(), uri = ?binding.uri, "resolved");
                    return Ok(Some(binding));
                }
                Resolution::Failed(err) => {
                    debug!(resolver = resolver.id(), code = err.code(), "failed");
                    return Err(err);
                }
            }
        }

        debug!("no resolver claimed the endpoint");
        Ok(None)
    }
}

/// Process-wide catalog, built once on first use
pub static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(Catalog::with_defaults);

/// Translate with the default catalog
pub async fn translate(
    ctx: &BindingContext,
    endpoint_ctx: &EndpointContext,
    endpoint: &Endpoint,
) -> Result<Option<Binding>> {
    DEFAULT_CATALOG.translate(ctx, endpoint_ctx, endpoint).await
}
