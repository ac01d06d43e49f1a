//! Projected view model. Rebuilt on every query, never cached.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use smallvec::SmallVec;

/// Fallback repository when `spec.image.repository` is unset.
pub const DEFAULT_REPOSITORY: &str = "ghcr.io/openclaw/openclaw";
/// Fallback tag when neither digest nor tag is set.
pub const DEFAULT_TAG: &str = "latest";

/// Container image reference. A digest takes precedence over the tag.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
    pub digest: String,
}

impl ImageRef {
    /// Apply defaults to the raw `spec.image` fields.
    pub fn resolve(repository: &str, tag: &str, digest: &str) -> Self {
        let repository = if repository.is_empty() { DEFAULT_REPOSITORY } else { repository };
        let tag = if tag.is_empty() { DEFAULT_TAG } else { tag };
        Self { repository: repository.to_string(), tag: tag.to_string(), digest: digest.to_string() }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.digest.is_empty() {
            write!(f, "{}:{}", self.repository, self.tag)
        } else {
            write!(f, "{}@{}", self.repository, self.digest)
        }
    }
}

/// A named network endpoint published in the instance status.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    pub url: String,
}

/// One entry of `status.conditions`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    /// `True`, `False` or `Unknown` by convention; kept open.
    pub status: String,
    pub reason: String,
    pub message: String,
}

impl Condition {
    pub fn is_true(&self) -> bool { self.status == "True" }

    /// One-character marker used in the conditions table.
    pub fn indicator(&self) -> char {
        match self.status.as_str() {
            "True" => '+',
            "False" => '-',
            _ => ' ',
        }
    }
}

/// A concrete object created and owned by the instance controller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ManagedRef {
    pub kind: &'static str,
    pub name: String,
}

/// Classified container state, in priority order Running > Waiting > Terminated.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", content = "reason")]
pub enum ContainerState {
    Running,
    Waiting(String),
    Terminated(String),
    Unknown,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("Running"),
            Self::Waiting(reason) => write!(f, "Waiting: {}", reason),
            Self::Terminated(reason) => write!(f, "Terminated: {}", reason),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContainerSummary {
    pub name: String,
    pub ready: bool,
    pub state: ContainerState,
    pub restarts: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PodSummary {
    pub name: String,
    pub phase: String,
    /// Sum of the per-container restart counters.
    pub restarts: i64,
    pub created: Option<DateTime<Utc>>,
    pub containers: SmallVec<[ContainerSummary; 4]>,
}

/// Everything `status` shows about one instance.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceView {
    pub namespace: String,
    pub name: String,
    pub created: Option<DateTime<Utc>>,
    pub phase: String,
    pub image: ImageRef,
    pub endpoints: Vec<Endpoint>,
    pub conditions: Vec<Condition>,
    pub managed: Vec<ManagedRef>,
    pub pods: Vec<PodSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl InstanceView {
    /// The pod whose containers are shown; the first one the API returned.
    pub fn primary_pod(&self) -> Option<&PodSummary> { self.pods.first() }
}

/// One row of the `list` table.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstanceRow {
    pub namespace: String,
    pub name: String,
    pub phase: String,
    pub ready: String,
    pub gateway: String,
    pub age: String,
}

/// Textual health marker appended to a phase; unrecognised phases get none.
pub fn phase_indicator(phase: &str) -> Option<&'static str> {
    match phase {
        "Running" => Some("[ok]"),
        "Degraded" => Some("[warning]"),
        "Failed" => Some("[error]"),
        "Provisioning" => Some("[provisioning]"),
        _ => None,
    }
}
