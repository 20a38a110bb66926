//! Kamelet (route template) references
//!
//! Every use of a template gets its own id, so the same Kamelet can appear
//! several times in a pipe with independent configuration: endpoint
//! properties are namespaced as `camel.kamelet.<template>.<id>.<key>`.
//!
//! Data-type hints are turned into adapter steps built from the
//! data-type action template:
//!
//! | Role | URI | Step |
//! |------|-----|------|
//! | source | `kamelet:<t>/<id>` | `out` adapter |
//! | sink | `kamelet:<t>/<id>` | `in` adapter |
//! | action | - | `in` adapter, the template, `out` adapter |

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{Resolution, Resolver, ORDER_STANDARD};
use crate::binding::{Binding, BindingContext, Step};
use crate::config::DATA_TYPE_ACTION_LABEL;
use crate::endpoint::{
    Endpoint, EndpointContext, EndpointType, ObjectReference, ReferenceExt, TypeSlot,
};
use crate::uri::{path_escape, query_escape};

pub const KAMELET_GROUP: &str = "camel.apache.org";
pub const KAMELET_KIND: &str = "Kamelet";

const PROPERTY_PREFIX: &str = "camel.kamelet";
const ID_PROPERTY: &str = "id";
const VERSION_PROPERTY: &str = "kameletVersion";
const NAMESPACE_PARAMETER: &str = "kameletNamespace";

pub(crate) fn is_kamelet(group: &str, kind: &str) -> bool {
    group == KAMELET_GROUP && kind == KAMELET_KIND
}

pub struct KameletResolver;

#[async_trait]
impl Resolver for KameletResolver {
    fn id(&self) -> &str {
        "kamelet"
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
        let Some(reference) = &endpoint.reference else {
            return Resolution::Skipped;
        };
        match reference.group() {
            Ok(group) if is_kamelet(&group, reference.kind()) => {
                Resolution::Resolved(bind(ctx, endpoint_ctx, endpoint, reference))
            }
            _ => Resolution::Skipped,
        }
    }
}

fn bind(
    ctx: &BindingContext,
    endpoint_ctx: &EndpointContext,
    endpoint: &Endpoint,
    reference: &ObjectReference,
) -> Binding {
    let mut props = endpoint.properties.to_string_map();
    let id = props
        .remove(ID_PROPERTY)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| endpoint_ctx.generate_id());
    let version = props.remove(VERSION_PROPERTY).filter(|v| !v.is_empty());

    let template = path_escape(reference.name());
    let mut translated = format!("{template}/{}", path_escape(&id));
    let mut separator = '?';
    if let Some(version) = &version {
        translated.push_str(&format!("{separator}{VERSION_PROPERTY}={}", query_escape(version)));
        separator = '&';
    }
    let namespace = reference.namespace();
    if !namespace.is_empty() && namespace != ctx.namespace {
        translated.push_str(&format!("{separator}{NAMESPACE_PARAMETER}={}", query_escape(namespace)));
    }

    let mut application_properties: BTreeMap<String, String> = props
        .into_iter()
        .map(|(key, value)| (format!("{PROPERTY_PREFIX}.{template}.{id}.{key}"), value))
        .collect();

    let action = ctx
        .metadata
        .get(DATA_TYPE_ACTION_LABEL)
        .filter(|a| !a.is_empty())
        .unwrap_or(&ctx.config.data_type_action)
        .clone();
    let mut adapter = |slot: TypeSlot| {
        data_type_step(endpoint, &id, slot, &action, &mut application_properties)
    };

    let mut binding = Binding::default();
    match endpoint_ctx.endpoint_type {
        Some(EndpointType::Action) => {
            let mut steps: Vec<Step> = adapter(TypeSlot::In).into_iter().collect();
            steps.push(Step::kamelet(translated));
            steps.extend(adapter(TypeSlot::Out));

            binding.step = if steps.len() == 1 {
                steps.pop()
            } else {
                Some(Step::Pipeline {
                    id: format!("{id}-pipeline"),
                    steps,
                })
            };
        }
        Some(EndpointType::Source) => {
            binding.step = adapter(TypeSlot::Out);
            binding.uri = Some(format!("kamelet:{translated}"));
        }
        Some(EndpointType::Sink) => {
            binding.step = adapter(TypeSlot::In);
            binding.uri = Some(format!("kamelet:{translated}"));
        }
        None => binding.uri = Some(format!("kamelet:{translated}")),
    }

    binding.application_properties = application_properties;
    binding
}

/// Adapter step converting the payload at `slot`, with its configuration
/// written into `properties`. `None` when the endpoint has no hint for
/// that slot.
fn data_type_step(
    endpoint: &Endpoint,
    id: &str,
    slot: TypeSlot,
    action: &str,
    properties: &mut BTreeMap<String, String>,
) -> Option<Step> {
    let data_type = endpoint.data_types.get(&slot)?;
    let (scheme, format) = data_type.scheme_and_format();
    let step_id = format!("{id}-{slot}");

    properties.insert(
        format!("{PROPERTY_PREFIX}.{action}.{step_id}.scheme"),
        scheme.to_string(),
    );
    properties.insert(
        format!("{PROPERTY_PREFIX}.{action}.{step_id}.format"),
        format.to_string(),
    );
    Some(Step::kamelet(format!("{action}/{}", path_escape(&step_id))))
}
