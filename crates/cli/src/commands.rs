//! Command handlers. Each takes the cluster seam and the output sinks so the whole
//! flow runs against a mock in tests.

use std::io::Write;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use openclaw_core::prelude::*;
use openclaw_doctor::{battery, DoctorConfig, DoctorContext};
use openclaw_kubehub::Orchestrator;
use serde::Serialize;
use tracing::{debug, warn};

use crate::render;

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Output {
    Human,
    Json,
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// `list`: one row per instance in `namespace`, or across all namespaces when `None`.
pub async fn list<W: Write>(
    hub: &dyn Orchestrator,
    namespace: Option<&str>,
    output: Output,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<()> {
    let items = hub.list_instances(namespace).await.context("failed to list OpenClawInstances")?;
    debug!(count = items.len(), namespace = ?namespace, "instances listed");
    let rows: Vec<InstanceRow> = items.iter().map(|obj| project_row(obj, now)).collect();
    if output == Output::Json {
        return write_json(out, &rows);
    }
    if rows.is_empty() {
        match namespace {
            Some(ns) => writeln!(out, "No OpenClaw instances found in namespace {:?}.", ns)?,
            None => writeln!(out, "No OpenClaw instances found in any namespace.")?,
        }
        return Ok(());
    }
    render::render_rows(&rows, namespace.is_none(), out)?;
    Ok(())
}

/// `status`: full view of one instance plus its pods.
///
/// A pod listing failure does not fail the command; it is shown in place of the pods.
pub async fn status<W: Write, E: Write>(
    hub: &dyn Orchestrator,
    namespace: &str,
    name: &str,
    output: Output,
    now: DateTime<Utc>,
    out: &mut W,
    err: &mut E,
) -> Result<()> {
    let obj = hub
        .get_instance(namespace, name)
        .await
        .with_context(|| format!("failed to get OpenClawInstance {:?}", name))?;
    let selector = openclaw_core::instance_selector(name);
    let (pods, pods_error) = match hub.list_pods(namespace, &selector).await {
        Ok(pods) => (pods, None),
        Err(e) => {
            warn!(instance = %name, error = %e, "pod listing failed");
            (Vec::new(), Some(e.to_string()))
        }
    };
    let mut view = project_instance(&obj, &pods);
    if output == Output::Json {
        if let Some(e) = pods_error {
            view.warnings.push(format!("failed to list pods: {}", e));
        }
        return write_json(out, &view);
    }
    for w in &view.warnings {
        writeln!(err, "Warning: {}", w)?;
    }
    render::render_status(&view, pods_error.as_deref(), now, out)?;
    Ok(())
}

/// `doctor`: run the battery, print every result, fail when any check failed.
pub async fn doctor<W: Write>(
    hub: &dyn Orchestrator,
    namespace: &str,
    instance: Option<&str>,
    config: DoctorConfig,
    output: Output,
    out: &mut W,
) -> Result<()> {
    let ctx = DoctorContext { hub, namespace: namespace.to_string(), config };
    let report = openclaw_doctor::run(&ctx, &battery(instance)).await;
    match output {
        Output::Json => write_json(out, &report)?,
        Output::Human => report.render(out)?,
    }
    if report.is_healthy() {
        Ok(())
    } else {
        Err(anyhow!("{} check(s) failed", report.failed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openclaw_kubehub::MockHub;
    use serde_json::{json, Value};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T02:00:00Z").expect("ts").with_timezone(&Utc)
    }

    fn instance(ns: &str, name: &str, status: Option<Value>) -> Value {
        let mut obj = json!({
            "apiVersion": "openclaw.openclaw.io/v1alpha1",
            "kind": "OpenClawInstance",
            "metadata": {"name": name, "namespace": ns, "creationTimestamp": "2024-01-01T00:00:00Z"},
            "spec": {}
        });
        if let Some(s) = status {
            obj["status"] = s;
        }
        obj
    }

    fn agent_pod(name: &str, instance: &str, containers: Value) -> Value {
        json!({
            "metadata": {
                "name": name,
                "namespace": "agents",
                "creationTimestamp": "2024-01-01T01:30:00Z",
                "labels": {"app.kubernetes.io/name": "openclaw", "app.kubernetes.io/instance": instance}
            },
            "status": {"phase": "Running", "containerStatuses": containers}
        })
    }

    fn healthy_pod(name: &str, instance: &str) -> Value {
        agent_pod(name, instance, json!([
            {"name": "openclaw", "ready": true, "restartCount": 0, "state": {"running": {}}},
            {"name": "chromium", "ready": true, "restartCount": 0, "state": {"running": {}}}
        ]))
    }

    fn crashing_sidecar_pod(name: &str, instance: &str) -> Value {
        agent_pod(name, instance, json!([
            {"name": "openclaw", "ready": true, "restartCount": 0, "state": {"running": {}}},
            {"name": "chromium", "ready": false, "restartCount": 2, "state": {"waiting": {"reason": "CrashLoopBackOff"}}},
            {"name": "init-config", "ready": false, "restartCount": 0, "state": {"terminated": {"reason": "Completed"}}}
        ]))
    }

    async fn run_status(hub: &MockHub, name: &str, output: Output) -> (Result<()>, String, String) {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let res = status(hub, "agents", name, output, now(), &mut out, &mut err).await;
        (res, String::from_utf8(out).expect("utf8"), String::from_utf8(err).expect("utf8"))
    }

    #[tokio::test]
    async fn list_empty_namespace_message() {
        let hub = MockHub::new().with_instance(instance("other", "a", None));
        let mut out = Vec::new();
        list(&hub, Some("agents"), Output::Human, now(), &mut out).await.expect("list");
        assert_eq!(String::from_utf8(out).expect("utf8"), "No OpenClaw instances found in namespace \"agents\".\n");

        let empty = MockHub::new();
        let mut out = Vec::new();
        list(&empty, None, Output::Human, now(), &mut out).await.expect("list");
        assert_eq!(String::from_utf8(out).expect("utf8"), "No OpenClaw instances found in any namespace.\n");
    }

    #[tokio::test]
    async fn list_rows_default_phase_and_ready() {
        let hub = MockHub::new()
            .with_instance(instance("agents", "fresh", None))
            .with_instance(instance("agents", "live", Some(json!({
                "phase": "Running",
                "gatewayEndpoint": "ws://live:18789",
                "conditions": [{"type": "Ready", "status": "True"}]
            }))));
        let mut out = Vec::new();
        list(&hub, Some("agents"), Output::Human, now(), &mut out).await.expect("list");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "NAME   PHASE    READY    GATEWAY          AGE");
        assert_eq!(lines[1], "fresh  Pending  Unknown                   2h");
        assert_eq!(lines[2], "live   Running  True     ws://live:18789  2h");
    }

    #[tokio::test]
    async fn list_json_is_an_array_of_rows() {
        let hub = MockHub::new().with_instance(instance("agents", "fresh", None));
        let mut out = Vec::new();
        list(&hub, None, Output::Json, now(), &mut out).await.expect("list");
        let v: Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(v[0]["namespace"], "agents");
        assert_eq!(v[0]["phase"], "Pending");
        assert_eq!(v[0]["ready"], "Unknown");
    }

    #[tokio::test]
    async fn status_without_instance_status_still_shows_healthy_pod() {
        let hub = MockHub::new()
            .with_instance(instance("agents", "my-agent", None))
            .with_pod(healthy_pod("my-agent-0", "my-agent"));
        let (res, out, err) = run_status(&hub, "my-agent", Output::Human).await;
        res.expect("status");
        assert!(err.is_empty());
        let expected = "\
OpenClawInstance: agents/my-agent
Phase:           Pending
Age:             2h

Image:    ghcr.io/openclaw/openclaw:latest

Pods:
  NAME        STATUS   RESTARTS  AGE
  my-agent-0  Running  0         30m

Containers:
  NAME      READY  STATE    RESTARTS
  openclaw  true   Running  0
  chromium  true   Running  0
";
        assert_eq!(out, expected);

        // phase comes from the instance alone; the pod itself passes the health verdict
        let view = project_instance(&hub.instances[0], &hub.pods);
        assert_eq!(view.phase, "Pending");
        let verdict = openclaw_doctor::evaluate_pod_health("my-agent", &view.pods, openclaw_doctor::DEFAULT_CRASH_LOOP_THRESHOLD);
        assert!(verdict.passed, "{:?}", verdict);
    }

    #[tokio::test]
    async fn status_renders_every_container_state() {
        let hub = MockHub::new()
            .with_instance(instance("agents", "my-agent", Some(json!({"phase": "Degraded"}))))
            .with_pod(crashing_sidecar_pod("my-agent-0", "my-agent"));
        let (res, out, _) = run_status(&hub, "my-agent", Output::Human).await;
        res.expect("status");
        assert!(out.contains("Phase:           Degraded  [warning]\n"));
        assert!(out.contains("  my-agent-0  Running  2         30m\n"));
        let containers = &out[out.find("Containers:").expect("containers section")..];
        assert_eq!(
            containers,
            "\
Containers:
  NAME         READY  STATE                      RESTARTS
  openclaw     true   Running                    0
  chromium     false  Waiting: CrashLoopBackOff  2
  init-config  false  Terminated: Completed      0
"
        );
    }

    #[tokio::test]
    async fn status_of_missing_instance_fails_with_name() {
        let hub = MockHub::new();
        let (res, out, _) = run_status(&hub, "ghost", Output::Human).await;
        let e = res.expect_err("missing");
        assert!(e.to_string().starts_with("failed to get OpenClawInstance \"ghost\""));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn status_pod_list_failure_is_not_fatal() {
        let mut hub = MockHub::new().with_instance(instance("agents", "my-agent", None));
        hub.pod_errors.insert("agents".into(), "pods is forbidden".into());
        let (res, out, _) = run_status(&hub, "my-agent", Output::Human).await;
        res.expect("status");
        assert!(out.contains("Pod Status: failed to list pods: "));
        assert!(out.contains("pods is forbidden"));

        let (res, out, _) = run_status(&hub, "my-agent", Output::Json).await;
        res.expect("status");
        let v: Value = serde_json::from_str(&out).expect("json");
        assert!(v["warnings"][0].as_str().expect("warning").starts_with("failed to list pods: "));
    }

    #[tokio::test]
    async fn status_warns_when_several_pods_match() {
        let hub = MockHub::new()
            .with_instance(instance("agents", "my-agent", None))
            .with_pod(healthy_pod("my-agent-a", "my-agent"))
            .with_pod(healthy_pod("my-agent-b", "my-agent"));
        let (res, out, err) = run_status(&hub, "my-agent", Output::Human).await;
        res.expect("status");
        assert_eq!(err, "Warning: multiple pods found, using my-agent-a\n");
        assert!(out.contains("  my-agent-b  Running"));
    }

    #[tokio::test]
    async fn doctor_failure_count_becomes_the_error() {
        let hub = MockHub::default();
        let mut out = Vec::new();
        let e = doctor(&hub, "agents", None, DoctorConfig::default(), Output::Human, &mut out)
            .await
            .expect_err("unhealthy");
        assert_eq!(e.to_string(), "2 check(s) failed");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.ends_with("Results: 0 passed, 2 failed\n"));
    }

    #[tokio::test]
    async fn doctor_json_lists_results() {
        let hub = MockHub::new().with_pod(json!({
            "metadata": {"name": "op", "namespace": "openclaw-system", "labels": {"control-plane": "controller-manager"}},
            "status": {"phase": "Running"}
        }));
        let mut out = Vec::new();
        doctor(&hub, "agents", None, DoctorConfig::default(), Output::Json, &mut out).await.expect("healthy");
        let v: Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(v["results"].as_array().map(Vec::len), Some(2));
        assert_eq!(v["results"][0]["passed"], true);
    }
}
