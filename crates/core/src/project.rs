//! Projection of raw `OpenClawInstance` and Pod documents into the view model.

use chrono::{DateTime, Utc};
use serde_json::Value;
use smallvec::SmallVec;

use crate::age::{age_since, parse_timestamp};
use crate::doc::{nested_bool, nested_i64, nested_map, nested_slice, nested_str};
use crate::view::{
    Condition, ContainerState, ContainerSummary, Endpoint, ImageRef, InstanceRow, InstanceView, ManagedRef,
    PodSummary,
};

static NULL: Value = Value::Null;

/// Phase reported when `status.phase` is absent: an instance without status is still being created.
pub const DEFAULT_PHASE: &str = "Pending";

/// `status.managedResources` keys in display order, with their labels.
const MANAGED_KINDS: &[(&str, &str)] = &[
    ("Deployment", "deployment"),
    ("Service", "service"),
    ("ConfigMap", "configMap"),
    ("PVC", "pvc"),
    ("NetworkPolicy", "networkPolicy"),
    ("PDB", "podDisruptionBudget"),
    ("ServiceAccount", "serviceAccount"),
    ("Role", "role"),
    ("RoleBinding", "roleBinding"),
];

const ENDPOINTS: &[(&str, &str)] = &[
    ("Gateway (WebSocket)", "gatewayEndpoint"),
    ("Canvas (HTTP)", "canvasEndpoint"),
];

/// Top-level field `key` of `obj`, or `null` when absent.
pub fn section<'a>(obj: &'a Value, key: &str) -> &'a Value {
    obj.get(key).unwrap_or(&NULL)
}

fn created_at(obj: &Value) -> Option<DateTime<Utc>> {
    parse_timestamp(&nested_str(obj, &["metadata", "creationTimestamp"]))
}

/// `status.phase`, defaulting to `Pending`.
pub fn resolve_phase(status: &Value) -> String {
    let phase = nested_str(status, &["phase"]);
    if phase.is_empty() { DEFAULT_PHASE.to_string() } else { phase }
}

/// Status of the first condition whose `type` equals `kind`; `Unknown` when there is none
/// or the conditions field is missing or malformed.
pub fn condition_status(status: &Value, kind: &str) -> String {
    nested_slice(status, &["conditions"])
        .and_then(|conds| {
            conds
                .iter()
                .filter(|c| c.is_object())
                .find(|c| nested_str(c, &["type"]) == kind)
        })
        .map(|c| nested_str(c, &["status"]))
        .unwrap_or_else(|| "Unknown".to_string())
}

/// All well-formed condition entries in API order. A malformed list counts as empty.
pub fn conditions(status: &Value) -> Vec<Condition> {
    let Some(conds) = nested_slice(status, &["conditions"]) else { return Vec::new() };
    conds
        .iter()
        .filter(|c| c.is_object())
        .map(|c| Condition {
            kind: nested_str(c, &["type"]),
            status: nested_str(c, &["status"]),
            reason: nested_str(c, &["reason"]),
            message: nested_str(c, &["message"]),
        })
        .collect()
}

/// Managed resource references present in `status.managedResources`.
pub fn managed_resources(status: &Value) -> Vec<ManagedRef> {
    if nested_map(status, &["managedResources"]).is_none() {
        return Vec::new();
    }
    MANAGED_KINDS
        .iter()
        .filter_map(|&(label, key)| {
            let name = nested_str(status, &["managedResources", key]);
            (!name.is_empty()).then(|| ManagedRef { kind: label, name })
        })
        .collect()
}

pub fn endpoints(status: &Value) -> Vec<Endpoint> {
    ENDPOINTS
        .iter()
        .filter_map(|&(label, key)| {
            let url = nested_str(status, &[key]);
            (!url.is_empty()).then(|| Endpoint { name: label, url })
        })
        .collect()
}

pub fn image(spec: &Value) -> ImageRef {
    ImageRef::resolve(
        &nested_str(spec, &["image", "repository"]),
        &nested_str(spec, &["image", "tag"]),
        &nested_str(spec, &["image", "digest"]),
    )
}

/// First populated field of a container `state` object wins.
pub fn container_state(state: &Value) -> ContainerState {
    if nested_map(state, &["running"]).is_some() {
        ContainerState::Running
    } else if nested_map(state, &["waiting"]).is_some() {
        ContainerState::Waiting(nested_str(state, &["waiting", "reason"]))
    } else if nested_map(state, &["terminated"]).is_some() {
        ContainerState::Terminated(nested_str(state, &["terminated", "reason"]))
    } else {
        ContainerState::Unknown
    }
}

/// Summarize one Pod document (as returned by the API, serialized to JSON).
pub fn summarize_pod(pod: &Value) -> PodSummary {
    let containers: SmallVec<[ContainerSummary; 4]> = nested_slice(pod, &["status", "containerStatuses"])
        .unwrap_or_default()
        .iter()
        .filter(|cs| cs.is_object())
        .map(|cs| ContainerSummary {
            name: nested_str(cs, &["name"]),
            ready: nested_bool(cs, &["ready"]),
            state: container_state(section(cs, "state")),
            restarts: nested_i64(cs, &["restartCount"]),
        })
        .collect();
    PodSummary {
        name: nested_str(pod, &["metadata", "name"]),
        phase: nested_str(pod, &["status", "phase"]),
        restarts: containers.iter().map(|c| c.restarts).sum(),
        created: created_at(pod),
        containers,
    }
}

/// Warning surfaced when more than one pod correlates with an instance.
pub fn multiple_pods_warning(pods: &[PodSummary]) -> Option<String> {
    match pods {
        [first, _, ..] => Some(format!("multiple pods found, using {}", first.name)),
        _ => None,
    }
}

/// Build the full view of one instance from its document and correlated pod documents.
///
/// Phase comes from the instance status only; pod facts are summarized independently and
/// may disagree with it.
pub fn project_instance(obj: &Value, pods: &[Value]) -> InstanceView {
    let spec = section(obj, "spec");
    let status = section(obj, "status");
    let pods: Vec<PodSummary> = pods.iter().map(summarize_pod).collect();
    let warnings = multiple_pods_warning(&pods).into_iter().collect();
    InstanceView {
        namespace: nested_str(obj, &["metadata", "namespace"]),
        name: nested_str(obj, &["metadata", "name"]),
        created: created_at(obj),
        phase: resolve_phase(status),
        image: image(spec),
        endpoints: endpoints(status),
        conditions: conditions(status),
        managed: managed_resources(status),
        pods,
        warnings,
    }
}

/// One `list` row: phase, the `Ready` condition, gateway endpoint and age.
pub fn project_row(obj: &Value, now: DateTime<Utc>) -> InstanceRow {
    let status = section(obj, "status");
    InstanceRow {
        namespace: nested_str(obj, &["metadata", "namespace"]),
        name: nested_str(obj, &["metadata", "name"]),
        phase: resolve_phase(status),
        ready: condition_status(status, "Ready"),
        gateway: nested_str(status, &["gatewayEndpoint"]),
        age: age_since(created_at(obj), now),
    }
}
