//! Validation / authorization gate
//!
//! Runs before any resolver so malformed or unauthorized endpoints never
//! cause cluster reads.

use tracing::warn;

use super::kamelet::is_kamelet;
use crate::binding::BindingContext;
use crate::endpoint::{Endpoint, ReferenceExt};
use crate::error::{BindingError, Result};
use crate::knative;

/// Check ref/uri exclusivity and cross-namespace access.
///
/// A reference into another namespace is accepted when:
/// - it is a Kamelet in the shared template namespace, or
/// - the pipe has a service account the access policy grants for that
///   kind and namespace.
///
/// Knative references never leave the pipe namespace.
pub fn validate_endpoint(ctx: &BindingContext, endpoint: &Endpoint) -> Result<()> {
    let reference = match (&endpoint.reference, &endpoint.uri) {
        (Some(_), Some(_)) => {
            return Err(BindingError::MalformedEndpoint {
                reason: "cannot use both ref and uri to specify an endpoint: only one of them should be used".to_string(),
            })
        }
        (None, None) => {
            return Err(BindingError::MalformedEndpoint {
                reason: "one of ref or uri must be set".to_string(),
            })
        }
        (None, Some(uri)) if uri.trim().is_empty() => {
            return Err(BindingError::MalformedEndpoint {
                reason: "uri must not be empty".to_string(),
            })
        }
        (None, Some(_)) => return Ok(()),
        (Some(reference), None) => reference,
    };

    let group = reference.group()?;
    let kind = reference.kind();
    let namespace = reference.namespace();
    if namespace.is_empty() || namespace == ctx.namespace {
        return Ok(());
    }

    if is_kamelet(&group, kind)
        && ctx.config.global_template_namespace() == Some(namespace)
    {
        return Ok(());
    }

    if knative::is_known_kind(&group, kind) {
        warn!(reference = %reference.describe(), pipe_namespace = %ctx.namespace, "cross-namespace knative reference denied");
        return Err(BindingError::CrossNamespaceDenied {
            kind: kind.to_string(),
            name: reference.name().to_string(),
            namespace: namespace.to_string(),
            reason: "knative resources must live in the pipe namespace".to_string(),
        });
    }

    let Some(identity) = ctx.service_account_name.as_deref() else {
        warn!(reference = %reference.describe(), "cross-namespace reference without service account");
        return Err(BindingError::MissingAuthorization {
            kind: kind.to_string(),
            name: reference.name().to_string(),
            namespace: namespace.to_string(),
        });
    };

    if ctx.policy.allows(identity, kind, namespace) {
        return Ok(());
    }

    warn!(reference = %reference.describe(), identity, "cross-namespace reference not granted");
    Err(BindingError::CrossNamespaceDenied {
        kind: kind.to_string(),
        name: reference.name().to_string(),
        namespace: namespace.to_string(),
        reason: format!("service account '{identity}' is not granted access"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::InMemoryCluster;
    use crate::config::EngineConfig;
    use crate::endpoint::object_ref;
    use crate::policy::AllowList;
    use std::sync::Arc;

    fn ctx() -> BindingContext {
        let config = EngineConfig {
            global_template_namespace: Some("global".to_string()),
            ..EngineConfig::default()
        };
        BindingContext::new("test", Arc::new(InMemoryCluster::new())).with_config(Arc::new(config))
    }

    fn kamelet(ns: &str) -> Endpoint {
        Endpoint::from_ref(
            object_ref("camel.apache.org/v1", "Kamelet", "foo-kamelet").in_namespace(ns),
        )
    }

    fn broker(ns: &str) -> Endpoint {
        Endpoint::from_ref(
            object_ref("eventing.knative.dev/v1", "Broker", "foo-broker").in_namespace(ns),
        )
    }

    #[test]
    fn same_namespace_references_pass() {
        let ctx = ctx();
        assert!(validate_endpoint(&ctx, &kamelet("")).is_ok());
        assert!(validate_endpoint(&ctx, &kamelet("test")).is_ok());
        assert!(validate_endpoint(&ctx, &broker("")).is_ok());
        assert!(validate_endpoint(&ctx, &broker("test")).is_ok());
        assert!(validate_endpoint(&ctx, &Endpoint::from_uri("log:info")).is_ok());
    }

    #[test]
    fn shared_template_namespace_needs_no_identity() {
        assert!(validate_endpoint(&ctx(), &kamelet("global")).is_ok());
    }

    #[test]
    fn both_or_neither_is_malformed() {
        let mut both = kamelet("");
        both.uri = Some("log:info".to_string());
        assert_eq!(validate_endpoint(&ctx(), &both).unwrap_err().code(), "BIND-001");
        assert_eq!(
            validate_endpoint(&ctx(), &Endpoint::default()).unwrap_err().code(),
            "BIND-001"
        );
        assert_eq!(
            validate_endpoint(&ctx(), &Endpoint::from_uri(" ")).unwrap_err().code(),
            "BIND-001"
        );
    }

    #[test]
    fn cross_namespace_without_identity() {
        let err = validate_endpoint(&ctx(), &kamelet("other")).unwrap_err();
        assert_eq!(err.code(), "BIND-011");
    }

    #[test]
    fn knative_never_crosses_namespaces() {
        let policy = AllowList::new().grant("sa", "*", "global");
        let ctx = ctx().with_service_account("sa").with_policy(Arc::new(policy));
        let err = validate_endpoint(&ctx, &broker("global")).unwrap_err();
        assert_eq!(err.code(), "BIND-010");
    }

    #[test]
    fn policy_grants_cross_namespace() {
        let policy = AllowList::new().grant("sa", "Kamelet", "other");
        let ctx = ctx().with_service_account("sa").with_policy(Arc::new(policy));
        assert!(validate_endpoint(&ctx, &kamelet("other")).is_ok());

        let err = validate_endpoint(&ctx, &kamelet("elsewhere")).unwrap_err();
        assert_eq!(err.code(), "BIND-010");
        assert!(err.to_string().contains("'sa'"));
    }

    #[test]
    fn invalid_api_version_is_rejected() {
        let endpoint = Endpoint::from_ref(object_ref("a/b/c", "Kamelet", "k"));
        assert_eq!(validate_endpoint(&ctx(), &endpoint).unwrap_err().code(), "BIND-002");
    }
}
