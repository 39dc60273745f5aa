//! Converters from Kubernetes API objects to resource models
//!
//! Each converter is a field mapping that asks the
//! [`status`](crate::status) engine for the derived state.

mod custom;
mod event;
mod node;
mod pod;
pub mod quantity;
mod service;
mod simple;
mod tenant;
mod workload;

pub use custom::{application_instance, instance_module_refs, release_config};
pub use event::{event, format_event_source};
pub(crate) use event::event_list;
pub use node::{node, pod_requests_and_limits};
pub use pod::pod;
pub use service::service;
pub use simple::{
    config_map, ingress, namespace, persistent_volume_claim, resource_quota, secret,
    storage_class,
};
pub use tenant::tenant_info;
pub use workload::{daemon_set, deployment, job, stateful_set};

use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// RFC 3339 rendering of an API timestamp
pub(crate) fn time_string(time: Option<&Time>) -> String {
    time.and_then(|t| serde_json::to_value(t).ok())
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

pub(crate) fn parse_time(time: Option<&Time>) -> Option<DateTime<Utc>> {
    let rendered = time_string(time);
    DateTime::parse_from_rfc3339(&rendered)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Compact age such as `45s`, `12m`, `3h`, `8d` or `2y`
pub(crate) fn short_age(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(since) = since else {
        return "<unknown>".to_string();
    };
    let seconds = (now - since).num_seconds().max(0);
    match seconds {
        s if s < 60 => format!("{}s", s),
        s if s < 60 * 60 => format!("{}m", s / 60),
        s if s < 24 * 60 * 60 => format!("{}h", s / (60 * 60)),
        s if s < 365 * 24 * 60 * 60 => format!("{}d", s / (24 * 60 * 60)),
        s => format!("{}y", s / (365 * 24 * 60 * 60)),
    }
}

pub(crate) fn labels_of<K: ResourceExt>(obj: &K) -> BTreeMap<String, String> {
    obj.labels().clone()
}

pub(crate) fn annotations_of<K: ResourceExt>(obj: &K) -> BTreeMap<String, String> {
    obj.annotations().clone()
}
