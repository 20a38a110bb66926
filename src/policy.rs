//! Cross-namespace access policy
//!
//! The authorization gate asks an [`AccessPolicy`] whether an identity may
//! read a resource kind in a foreign namespace. The check is a pure
//! function so it can be swapped and tested independently of resolvers.

use std::collections::{BTreeMap, BTreeSet};

pub trait AccessPolicy: Send + Sync {
    /// Whether `identity` may reference objects of `kind` in `namespace`
    fn allows(&self, identity: &str, kind: &str, namespace: &str) -> bool;
}

/// Closures work as policies
impl<F> AccessPolicy for F
where
    F: Fn(&str, &str, &str) -> bool + Send + Sync,
{
    fn allows(&self, identity: &str, kind: &str, namespace: &str) -> bool {
        self(identity, kind, namespace)
    }
}

/// Grants nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl AccessPolicy for DenyAll {
    fn allows(&self, _identity: &str, _kind: &str, _namespace: &str) -> bool {
        false
    }
}

/// Explicit grants keyed by identity, then `(kind, namespace)`.
///
/// `*` matches any kind.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    grants: BTreeMap<String, BTreeSet<(String, String)>>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, identity: &str, kind: &str, namespace: &str) -> Self {
        self.grants
            .entry(identity.to_string())
            .or_default()
            .insert((kind.to_string(), namespace.to_string()));
        self
    }
}

impl AccessPolicy for AllowList {
    fn allows(&self, identity: &str, kind: &str, namespace: &str) -> bool {
        let Some(grants) = self.grants.get(identity) else {
            return false;
        };
        grants.contains(&(kind.to_string(), namespace.to_string()))
            || grants.contains(&("*".to_string(), namespace.to_string()))
    }
}
