//! Strimzi Kafka clusters and topics
//!
//! Bootstrap servers are read from the `plain` listener of the cluster
//! status unless the endpoint already sets `brokers`.

use async_trait::async_trait;
use kube::core::ResourceExt;
use tracing::debug;

use super::{Resolution, Resolver, ORDER_STANDARD};
use crate::binding::{Binding, BindingContext};
use crate::cluster::types::KafkaCluster;
use crate::cluster::{api_resource, decode, DynamicObject, FieldSelector, GroupVersion};
use crate::endpoint::{Endpoint, EndpointContext, ObjectReference, ReferenceExt};
use crate::error::{BindingError, Result};
use crate::uri::append_parameters;

pub const STRIMZI_GROUP: &str = "kafka.strimzi.io";
pub const CLUSTER_LABEL: &str = "strimzi.io/cluster";

const KAFKA_KIND: &str = "Kafka";
const TOPIC_KIND: &str = "KafkaTopic";
const PLAIN_LISTENER: &str = "plain";
const TOPIC_PROPERTY: &str = "topic";
const BROKERS_PROPERTY: &str = "brokers";

pub struct StrimziResolver;

#[async_trait]
impl Resolver for StrimziResolver {
    fn id(&self) -> &str {
        "strimzi"
    }

    fn order(&self) -> i32 {
        ORDER_STANDARD
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
        let Ok(group_version) = reference.group_version() else {
            return Resolution::Skipped;
        };
        if group_version.group != STRIMZI_GROUP {
            return Resolution::Skipped;
        }
        match reference.kind() {
            KAFKA_KIND | TOPIC_KIND => resolve(ctx, endpoint, reference, &group_version)
                .await
                .into(),
            _ => Resolution::Skipped,
        }
    }
}

async fn resolve(
    ctx: &BindingContext,
    endpoint: &Endpoint,
    reference: &ObjectReference,
    group_version: &GroupVersion,
) -> Result<Binding> {
    let name = reference.name();
    let namespace = reference.namespace_or(&ctx.namespace);
    let mut props = endpoint.properties.to_string_map();
    let brokers_set = props
        .get(BROKERS_PROPERTY)
        .is_some_and(|brokers| !brokers.is_empty());

    let topic = if reference.kind() == KAFKA_KIND {
        let topic = props
            .remove(TOPIC_PROPERTY)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BindingError::MissingTopic {
                cluster: name.to_string(),
            })?;
        if !brokers_set {
            let brokers = bootstrap_servers(ctx, group_version, namespace, name).await?;
            props.insert(BROKERS_PROPERTY.to_string(), brokers);
        }
        topic
    } else {
        let topic = name.to_string();
        if !brokers_set {
            let kafka_topic = find_topic(ctx, group_version, namespace, name).await?;
            let cluster = kafka_topic
                .labels()
                .get(CLUSTER_LABEL)
                .filter(|c| !c.is_empty())
                .ok_or_else(|| BindingError::MissingClusterLabel {
                    topic: topic.clone(),
                    label: CLUSTER_LABEL.to_string(),
                })?
                .clone();
            let brokers = bootstrap_servers(ctx, group_version, namespace, &cluster).await?;
            props.insert(BROKERS_PROPERTY.to_string(), brokers);
        }
        topic
    };

    Ok(Binding::from_uri(append_parameters(
        &format!("kafka:{topic}"),
        &props,
    )))
}

/// KafkaTopic by resource name, falling back to a topic whose
/// `status.topicName` matches the reference
async fn find_topic(
    ctx: &BindingContext,
    group_version: &GroupVersion,
    namespace: &str,
    name: &str,
) -> Result<DynamicObject> {
    let topics = api_resource(group_version, TOPIC_KIND);
    if let Some(topic) = ctx.client.get(&topics, namespace, name).await? {
        return Ok(topic);
    }

    let selector = FieldSelector::equals("status.topicName", name);
    debug!(%selector, namespace, "looking up KafkaTopic by topic name");
    ctx.client
        .list(&topics, namespace, &selector)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BindingError::TopicNotFound {
            topic: name.to_string(),
            namespace: namespace.to_string(),
        })
}

async fn bootstrap_servers(
    ctx: &BindingContext,
    group_version: &GroupVersion,
    namespace: &str,
    cluster: &str,
) -> Result<String> {
    let object = ctx
        .client
        .get(&api_resource(group_version, KAFKA_KIND), namespace, cluster)
        .await?
        .ok_or_else(|| BindingError::ResourceNotFound {
            kind: KAFKA_KIND.to_string(),
            name: cluster.to_string(),
            namespace: namespace.to_string(),
        })?;
    let kafka: KafkaCluster = decode(&object)?;

    kafka
        .listener(PLAIN_LISTENER)
        .map(|listener| listener.bootstrap_servers.clone())
        .filter(|servers| !servers.is_empty())
        .ok_or_else(|| BindingError::NoBootstrapServers {
            cluster: cluster.to_string(),
            listener: PLAIN_LISTENER.to_string(),
        })
}
