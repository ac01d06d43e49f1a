//! The individual checks. Each one queries the cluster on its own; none depends on the
//! outcome of another.

use openclaw_core::doc::nested_str;
use openclaw_core::project::{conditions, section, summarize_pod};
use openclaw_core::view::PodSummary;
use tracing::debug;

use crate::{Check, CheckResult, DoctorContext, INSTALL_HINT};

/// The CRD is registered and listable cluster-wide.
pub struct CrdInstalled;

#[async_trait::async_trait]
impl Check for CrdInstalled {
    async fn run(&self, ctx: &DoctorContext<'_>) -> Vec<CheckResult> {
        let name = "OpenClawInstance CRD installed";
        let result = match ctx.hub.probe_instances().await {
            Ok(()) => CheckResult::pass(name),
            Err(e) => CheckResult::fail(name, format!("CRD not found: {}. Install with: {}", e, INSTALL_HINT)),
        };
        vec![result]
    }
}

/// A controller-manager pod is Running in one of the candidate namespaces.
pub struct OperatorRunning;

#[async_trait::async_trait]
impl Check for OperatorRunning {
    async fn run(&self, ctx: &DoctorContext<'_>) -> Vec<CheckResult> {
        let name = "OpenClaw operator running";
        let cfg = &ctx.config;
        for ns in &cfg.operator_namespaces {
            let pods = match ctx.hub.list_pods(ns, &cfg.operator_selector).await {
                Ok(pods) => pods,
                Err(e) => {
                    debug!(ns = %ns, error = %e, "operator namespace not readable; skipping");
                    continue;
                }
            };
            if let Some(pod) = pods.iter().map(summarize_pod).find(|p| p.phase == "Running") {
                return vec![CheckResult::pass(name).with_message(format!("Found in {}/{}", ns, pod.name))];
            }
        }
        vec![CheckResult::fail(
            name,
            format!("No running operator pod found in {}", cfg.operator_namespaces.join(" or ")),
        )]
    }
}

/// The named instance can be fetched.
pub struct InstanceExists(pub String);

#[async_trait::async_trait]
impl Check for InstanceExists {
    async fn run(&self, ctx: &DoctorContext<'_>) -> Vec<CheckResult> {
        let name = format!("Instance {:?} exists", self.0);
        let result = match ctx.hub.get_instance(&ctx.namespace, &self.0).await {
            Ok(_) => CheckResult::pass(name),
            Err(e) => CheckResult::fail(name, e.to_string()),
        };
        vec![result]
    }
}

/// The instance reports phase `Running`.
pub struct InstancePhase(pub String);

#[async_trait::async_trait]
impl Check for InstancePhase {
    async fn run(&self, ctx: &DoctorContext<'_>) -> Vec<CheckResult> {
        let name = format!("Instance {:?} phase is Running", self.0);
        let result = match ctx.hub.get_instance(&ctx.namespace, &self.0).await {
            Err(e) => CheckResult::fail(name, e.to_string()),
            Ok(obj) => {
                // raw value: an absent phase is reported as empty, not defaulted
                let phase = nested_str(&obj, &["status", "phase"]);
                if phase == "Running" {
                    CheckResult::pass(name)
                } else {
                    CheckResult::fail(name, format!("Current phase: {}", phase))
                }
            }
        };
        vec![result]
    }
}

/// The instance's primary pod is Running with every container ready and not crash looping.
pub struct PodHealth(pub String);

#[async_trait::async_trait]
impl Check for PodHealth {
    async fn run(&self, ctx: &DoctorContext<'_>) -> Vec<CheckResult> {
        let selector = openclaw_core::instance_selector(&self.0);
        let result = match ctx.hub.list_pods(&ctx.namespace, &selector).await {
            Err(e) => CheckResult::fail(pod_check_name(&self.0), e.to_string()),
            Ok(pods) => {
                let pods: Vec<PodSummary> = pods.iter().map(summarize_pod).collect();
                evaluate_pod_health(&self.0, &pods, ctx.config.crash_loop_threshold)
            }
        };
        vec![result]
    }
}

fn pod_check_name(instance: &str) -> String { format!("Pod for {:?} is healthy", instance) }

/// Pod health verdict for `instance`. The first violation found wins.
pub fn evaluate_pod_health(instance: &str, pods: &[PodSummary], crash_loop_threshold: i64) -> CheckResult {
    let name = pod_check_name(instance);
    let Some(pod) = pods.first() else {
        return CheckResult::fail(
            name,
            format!("No pods found. Check events: kubectl describe openclawinstance {}", instance),
        );
    };
    if pod.phase != "Running" {
        return CheckResult::fail(name, format!("Pod {} is in phase {}", pod.name, pod.phase));
    }
    for c in &pod.containers {
        if !c.ready {
            return CheckResult::fail(name, format!("Container {} is not ready", c.name));
        }
        if c.restarts > crash_loop_threshold {
            return CheckResult::fail(
                name,
                format!("Container {} has {} restarts (possible crash loop)", c.name, c.restarts),
            );
        }
    }
    CheckResult::pass(name)
}

/// One result per status condition; passes iff the status is exactly `True`.
pub struct Conditions(pub String);

#[async_trait::async_trait]
impl Check for Conditions {
    async fn run(&self, ctx: &DoctorContext<'_>) -> Vec<CheckResult> {
        let obj = match ctx.hub.get_instance(&ctx.namespace, &self.0).await {
            Ok(obj) => obj,
            // already reported by the existence check
            Err(_) => return Vec::new(),
        };
        conditions(section(&obj, "status"))
            .into_iter()
            .map(|c| {
                let result = CheckResult { name: format!("Condition {}", c.kind), passed: c.is_true(), message: None };
                if result.passed { result } else { result.with_message(c.message) }
            })
            .collect()
    }
}
