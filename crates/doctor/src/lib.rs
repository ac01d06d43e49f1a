//! OpenClaw doctor: a fixed, ordered battery of independent health checks.
//!
//! Cluster checks always run; instance checks run when an instance name is given.
//! No result decides whether a later check runs, so one invocation reports every
//! problem it can see. Report order is insertion order.

#![forbid(unsafe_code)]

use std::io::{self, Write};

use openclaw_kubehub::Orchestrator;
use serde::Serialize;
use tracing::debug;

pub mod checks;

pub use checks::evaluate_pod_health;

/// Namespaces probed for the operator when none are configured.
pub const DEFAULT_OPERATOR_NAMESPACES: &[&str] = &["openclaw-operator-system", "openclaw-system"];
/// Label selector of the operator's controller-manager pod.
pub const OPERATOR_SELECTOR: &str = "control-plane=controller-manager";
/// Restart count above which a container is flagged as crash looping.
pub const DEFAULT_CRASH_LOOP_THRESHOLD: i64 = 5;
/// Remediation shown when the CRD is missing.
pub const INSTALL_HINT: &str =
    "helm install openclaw-operator oci://ghcr.io/openclaw-rocks/charts/openclaw-operator";

/// Outcome of a single named check.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>) -> Self {
        Self { name: name.into(), passed: true, message: None }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), passed: false, message: Some(message.into()) }
    }

    /// Attach a message; empty messages are dropped.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.message = (!message.is_empty()).then_some(message);
        self
    }
}

/// Tunables for the battery.
#[derive(Debug, Clone)]
pub struct DoctorConfig {
    pub operator_namespaces: Vec<String>,
    pub operator_selector: String,
    pub crash_loop_threshold: i64,
}

impl Default for DoctorConfig {
    fn default() -> Self {
        Self {
            operator_namespaces: DEFAULT_OPERATOR_NAMESPACES.iter().map(|s| s.to_string()).collect(),
            operator_selector: OPERATOR_SELECTOR.to_string(),
            crash_loop_threshold: DEFAULT_CRASH_LOOP_THRESHOLD,
        }
    }
}

impl DoctorConfig {
    /// Defaults overridden by `OPENCLAW_OPERATOR_NAMESPACES` (comma separated) and
    /// `OPENCLAW_CRASH_LOOP_THRESHOLD`.
    pub fn from_env() -> Self { Self::from_vars(|key| std::env::var(key).ok()) }

    /// Same as [`DoctorConfig::from_env`] with variables read through `var`.
    /// Blank namespace lists and unparsable thresholds keep the defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(raw) = var("OPENCLAW_OPERATOR_NAMESPACES") {
            let namespaces: Vec<String> =
                raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
            if !namespaces.is_empty() {
                cfg.operator_namespaces = namespaces;
            }
        }
        match var("OPENCLAW_CRASH_LOOP_THRESHOLD").map(|s| s.trim().parse::<i64>()) {
            Some(Ok(n)) => cfg.crash_loop_threshold = n,
            Some(Err(e)) => debug!(error = %e, "ignoring OPENCLAW_CRASH_LOOP_THRESHOLD"),
            None => {}
        }
        cfg
    }
}

/// Shared query context handed to every check.
pub struct DoctorContext<'a> {
    pub hub: &'a dyn Orchestrator,
    pub namespace: String,
    pub config: DoctorConfig,
}

/// One entry of the battery. Emits one or more results and never fails as a whole.
#[async_trait::async_trait]
pub trait Check: Send + Sync {
    async fn run(&self, ctx: &DoctorContext<'_>) -> Vec<CheckResult>;
}

/// The ordered battery: cluster checks, then instance checks when `instance` is set.
pub fn battery(instance: Option<&str>) -> Vec<Box<dyn Check>> {
    let mut list: Vec<Box<dyn Check>> = vec![Box::new(checks::CrdInstalled), Box::new(checks::OperatorRunning)];
    if let Some(name) = instance {
        let name = name.to_string();
        list.push(Box::new(checks::InstanceExists(name.clone())));
        list.push(Box::new(checks::InstancePhase(name.clone())));
        list.push(Box::new(checks::PodHealth(name.clone())));
        list.push(Box::new(checks::Conditions(name)));
    }
    list
}

/// Run `checks` in order, accumulating every result.
pub async fn run(ctx: &DoctorContext<'_>, checks: &[Box<dyn Check>]) -> Report {
    let mut report = Report::default();
    for check in checks {
        for result in check.run(ctx).await {
            debug!(check = %result.name, passed = result.passed, "check finished");
            report.results.push(result);
        }
    }
    report
}

/// Ordered, append-only list of results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub results: Vec<CheckResult>,
}

impl Report {
    pub fn passed(&self) -> usize { self.results.iter().filter(|r| r.passed).count() }

    pub fn failed(&self) -> usize { self.results.len() - self.passed() }

    pub fn is_healthy(&self) -> bool { self.failed() == 0 }

    /// Human rendering: one `[PASS]`/`[FAIL]` line per result, its message indented
    /// underneath, then the summary line.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for r in &self.results {
            let tag = if r.passed { "[PASS]" } else { "[FAIL]" };
            writeln!(out, "  {}  {}", tag, r.name)?;
            if let Some(msg) = &r.message {
                writeln!(out, "          {}", msg)?;
            }
        }
        writeln!(out)?;
        writeln!(out, "Results: {} passed, {} failed", self.passed(), self.failed())
    }
}
