//! Pipe Bindings - endpoint resolution for integration pipes
//!
//! Turns the declarative endpoints of a pipe (Kamelet references, knative
//! services and brokers, Kafka topics, plain services, raw URIs) into the
//! concrete route URIs, inline steps, trait overrides and application
//! properties the runtime needs.

pub mod binding;
pub mod cluster;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod knative;
pub mod pipe;
pub mod policy;
pub mod resolver;
pub mod uri;

pub use binding::{Binding, BindingContext, KnativeTrait, Profile, Step, Traits};
pub use cluster::{ClusterClient, DynamicObject, FieldSelector, InMemoryCluster};
pub use config::EngineConfig;
pub use endpoint::{
    object_ref, DataTypeReference, Endpoint, EndpointContext, EndpointType, ObjectReference,
    Properties, ReferenceExt, TypeSlot,
};
pub use error::{BindingError, ClusterError, FixSuggestion, Result};
pub use pipe::{resolve_pipe, validate_pipe, Pipe, PipeSpec, ResolvedPipe};
pub use policy::{AccessPolicy, AllowList, DenyAll};
pub use resolver::{translate, Catalog, Resolution, Resolver, DEFAULT_CATALOG};
