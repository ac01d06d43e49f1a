//! OpenClaw core types: nested-document accessor, instance projection and view model.

#![forbid(unsafe_code)]

pub mod age;
pub mod doc;
pub mod project;
pub mod view;

/// API group of the `OpenClawInstance` custom resource.
pub const GROUP: &str = "openclaw.openclaw.io";
/// Served version of the custom resource.
pub const VERSION: &str = "v1alpha1";
/// Kind of the custom resource.
pub const KIND: &str = "OpenClawInstance";
/// Plural resource name used in API paths.
pub const PLURAL: &str = "openclawinstances";

/// Label selector matching the pods that belong to one instance.
pub fn instance_selector(name: &str) -> String {
    format!("app.kubernetes.io/name=openclaw,app.kubernetes.io/instance={}", name)
}

pub mod prelude {
    pub use super::age::{age_since, format_age};
    pub use super::doc::{nested_bool, nested_i64, nested_map, nested_slice, nested_str};
    pub use super::project::{condition_status, project_instance, project_row, resolve_phase};
    pub use super::view::{
        Condition, ContainerState, ContainerSummary, Endpoint, ImageRef, InstanceRow, InstanceView,
        ManagedRef, PodSummary,
    };
}
