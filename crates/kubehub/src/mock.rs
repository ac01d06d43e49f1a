//! In-memory orchestrator for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::Value;

use crate::{HubError, HubResult, LogOptions, LogStream, Orchestrator};

/// Serves canned documents. Pods are matched against equality label selectors
/// (`k=v,k2=v2`) the way the API server would.
#[derive(Default)]
pub struct MockHub {
    pub crd_installed: bool,
    pub instances: Vec<Value>,
    pub pods: Vec<Value>,
    /// Namespaces whose pod listing fails with the given message.
    pub pod_errors: HashMap<String, String>,
    /// Log chunks per pod name.
    pub logs: HashMap<String, Vec<Bytes>>,
    /// Options passed to the most recent `log_stream` call.
    pub last_log_opts: Mutex<Option<LogOptions>>,
}

impl MockHub {
    pub fn new() -> Self { Self { crd_installed: true, ..Self::default() } }

    pub fn with_instance(mut self, obj: Value) -> Self {
        self.instances.push(obj);
        self
    }

    pub fn with_pod(mut self, pod: Value) -> Self {
        self.pods.push(pod);
        self
    }

    pub fn with_logs(mut self, pod: &str, chunks: &[&'static [u8]]) -> Self {
        self.logs.insert(pod.to_string(), chunks.iter().copied().map(Bytes::from_static).collect());
        self
    }
}

fn meta<'a>(obj: &'a Value, key: &str) -> &'a str {
    obj.get("metadata").and_then(|m| m.get(key)).and_then(Value::as_str).unwrap_or("")
}

/// Equality-only label selector match.
pub fn selector_matches(selector: &str, obj: &Value) -> bool {
    let labels = obj.get("metadata").and_then(|m| m.get("labels"));
    selector.split(',').map(str::trim).filter(|t| !t.is_empty()).all(|term| {
        let Some((k, v)) = term.split_once('=') else { return false };
        labels.and_then(|l| l.get(k)).and_then(Value::as_str) == Some(v)
    })
}

#[async_trait::async_trait]
impl Orchestrator for MockHub {
    async fn probe_instances(&self) -> HubResult<()> {
        if self.crd_installed {
            Ok(())
        } else {
            Err(HubError::NotFound("the server could not find the requested resource".into()))
        }
    }

    async fn list_instances(&self, namespace: Option<&str>) -> HubResult<Vec<Value>> {
        self.probe_instances().await?;
        Ok(self
            .instances
            .iter()
            .filter(|o| namespace.map(|ns| meta(o, "namespace") == ns).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn get_instance(&self, namespace: &str, name: &str) -> HubResult<Value> {
        self.probe_instances().await?;
        self.instances
            .iter()
            .find(|o| meta(o, "namespace") == namespace && meta(o, "name") == name)
            .cloned()
            .ok_or_else(|| HubError::NotFound(format!("openclawinstances.openclaw.io \"{}\" not found", name)))
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> HubResult<Vec<Value>> {
        if let Some(msg) = self.pod_errors.get(namespace) {
            return Err(HubError::Unavailable(msg.clone()));
        }
        Ok(self
            .pods
            .iter()
            .filter(|p| meta(p, "namespace") == namespace && selector_matches(selector, p))
            .cloned()
            .collect())
    }

    async fn log_stream(&self, _namespace: &str, pod: &str, opts: &LogOptions) -> HubResult<LogStream> {
        if let Ok(mut last) = self.last_log_opts.lock() {
            *last = Some(opts.clone());
        }
        let chunks = self
            .logs
            .get(pod)
            .cloned()
            .ok_or_else(|| HubError::NotFound(format!("pods \"{}\" not found", pod)))?;
        Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }
}
