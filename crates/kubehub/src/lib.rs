//! OpenClaw kubehub: the narrow query surface the inspector needs from the cluster.
//!
//! Every call is a fresh point-in-time request; nothing is watched or cached.

#![forbid(unsafe_code)]

use std::path::Path;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ListParams, LogParams},
    config::{KubeConfigOptions, Kubeconfig},
    core::{ApiResource, DynamicObject, GroupVersionKind},
    Client, Config,
};
use serde_json::Value;
use tracing::{debug, info};

pub mod mock;

pub use mock::MockHub;

/// Errors at the cluster boundary.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Credentials or kubeconfig could not be resolved.
    #[error("{0}")]
    Config(String),
    /// The named object (or the resource type itself) does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The API server could not be reached or answered with an error.
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Api(kube::Error),
    #[error("decoding response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl HubError {
    pub fn is_not_found(&self) -> bool { matches!(self, HubError::NotFound(_)) }
}

impl From<kube::Error> for HubError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(resp) if resp.code == 404 => HubError::NotFound(resp.message),
            other => HubError::Api(other),
        }
    }
}

pub type HubResult<T> = Result<T, HubError>;

/// Raw log bytes as they arrive from the API server.
pub type LogStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Options for streaming container logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Keep the stream open and emit new lines as they are written.
    pub follow: bool,
    /// Read the previous (terminated) container instance.
    pub previous: bool,
    /// Only the last n lines.
    pub tail_lines: Option<i64>,
    /// Container name; the pod's default container when unset.
    pub container: Option<String>,
}

/// Cluster queries used by `list`, `status`, `logs` and `doctor`.
#[async_trait::async_trait]
pub trait Orchestrator: Send + Sync {
    /// Cluster-wide list of instances with a page size of one; succeeds iff the CRD is served.
    async fn probe_instances(&self) -> HubResult<()>;

    /// Instances in `namespace`, or in all namespaces when `None`.
    async fn list_instances(&self, namespace: Option<&str>) -> HubResult<Vec<Value>>;

    async fn get_instance(&self, namespace: &str, name: &str) -> HubResult<Value>;

    /// Pods matching a label selector, serialized to JSON.
    async fn list_pods(&self, namespace: &str, selector: &str) -> HubResult<Vec<Value>>;

    /// Open a log stream for one pod. The connection is released when the stream is dropped.
    async fn log_stream(&self, namespace: &str, pod: &str, opts: &LogOptions) -> HubResult<LogStream>;
}

/// Load client configuration from an explicit kubeconfig path, or infer it
/// (`KUBECONFIG`, `~/.kube/config`, in-cluster service account).
pub async fn load_config(kubeconfig: Option<&Path>) -> HubResult<Config> {
    let cfg = match kubeconfig {
        Some(path) => {
            let kc = Kubeconfig::read_from(path)
                .map_err(|e| HubError::Config(format!("failed to load kubeconfig {}: {}", path.display(), e)))?;
            Config::from_custom_kubeconfig(kc, &KubeConfigOptions::default())
                .await
                .map_err(|e| HubError::Config(format!("failed to load kubeconfig: {}", e)))?
        }
        None => Config::infer()
            .await
            .map_err(|e| HubError::Config(format!("failed to load kubeconfig: {}", e)))?,
    };
    debug!(cluster = %cfg.cluster_url, namespace = %cfg.default_namespace, "kube config loaded");
    Ok(cfg)
}

/// `ApiResource` for `OpenClawInstance`, built statically (no discovery round-trip).
pub fn instance_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk(openclaw_core::GROUP, openclaw_core::VERSION, openclaw_core::KIND);
    ApiResource::from_gvk_with_plural(&gvk, openclaw_core::PLURAL)
}

/// Orchestrator backed by a live kube-rs client.
pub struct KubeHub {
    client: Client,
    instances: ApiResource,
    default_namespace: String,
}

impl KubeHub {
    pub fn new(config: Config) -> HubResult<Self> {
        let default_namespace = config.default_namespace.clone();
        let client = Client::try_from(config)
            .map_err(|e| HubError::Config(format!("failed to create kubernetes client: {}", e)))?;
        Ok(Self { client, instances: instance_resource(), default_namespace })
    }

    /// Load configuration and build a client in one step.
    pub async fn connect(kubeconfig: Option<&Path>) -> HubResult<Self> {
        Self::new(load_config(kubeconfig).await?)
    }

    /// Namespace of the current kubeconfig context (`default` when unset).
    pub fn default_namespace(&self) -> &str { &self.default_namespace }

    fn instances_api(&self, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &self.instances),
            None => Api::all_with(self.client.clone(), &self.instances),
        }
    }
}

#[async_trait::async_trait]
impl Orchestrator for KubeHub {
    async fn probe_instances(&self) -> HubResult<()> {
        let api = self.instances_api(None);
        api.list(&ListParams::default().limit(1)).await?;
        Ok(())
    }

    async fn list_instances(&self, namespace: Option<&str>) -> HubResult<Vec<Value>> {
        let api = self.instances_api(namespace);
        let list = api.list(&ListParams::default()).await?;
        debug!(ns = ?namespace, count = list.items.len(), "instances listed");
        list.items.iter().map(|o| serde_json::to_value(o).map_err(HubError::from)).collect()
    }

    async fn get_instance(&self, namespace: &str, name: &str) -> HubResult<Value> {
        let obj = self.instances_api(Some(namespace)).get(name).await?;
        Ok(serde_json::to_value(&obj)?)
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> HubResult<Vec<Value>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pods = api.list(&ListParams::default().labels(selector)).await?;
        debug!(ns = %namespace, selector = %selector, count = pods.items.len(), "pods listed");
        pods.items.iter().map(|p| serde_json::to_value(p).map_err(HubError::from)).collect()
    }

    async fn log_stream(&self, namespace: &str, pod: &str, opts: &LogOptions) -> HubResult<LogStream> {
        use tokio_util::{compat::FuturesAsyncReadCompatExt, io::ReaderStream};

        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = LogParams {
            follow: opts.follow,
            previous: opts.previous,
            tail_lines: opts.tail_lines,
            container: opts.container.clone(),
            ..LogParams::default()
        };
        info!(pod = %pod, container = ?lp.container, follow = lp.follow, previous = lp.previous, tail = ?lp.tail_lines, "logs stream starting");
        let reader = api.log_stream(pod, &lp).await?;
        // futures::io::AsyncRead -> tokio::io::AsyncRead -> Stream<Bytes>
        Ok(ReaderStream::new(reader.compat()).boxed())
    }
}
