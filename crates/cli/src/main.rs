use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use openclaw_doctor::DoctorConfig;
use openclaw_kubehub::{KubeHub, LogOptions};
use tracing::{debug, info};

mod commands;
mod render;

use commands::Output;

#[derive(Parser, Debug)]
#[command(name = "kubectl-openclaw", about = "Inspect and diagnose OpenClaw instances")]
struct Cli {
    /// Path to the kubeconfig file (default: standard discovery)
    #[arg(long = "kubeconfig", global = true)]
    kubeconfig: Option<PathBuf>,

    /// Kubernetes namespace (default: current context)
    #[arg(short = 'n', long = "namespace", global = true)]
    namespace: Option<String>,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List OpenClaw instances
    #[command(visible_alias = "ls")]
    List {
        /// List instances across all namespaces
        #[arg(short = 'A', long = "all-namespaces", action = ArgAction::SetTrue)]
        all_namespaces: bool,
    },
    /// Show detailed status of an instance
    Status {
        name: String,
    },
    /// Stream logs from an instance's pod
    Logs {
        name: String,
        /// Keep streaming new lines
        #[arg(short = 'f', long = "follow", action = ArgAction::SetTrue)]
        follow: bool,
        /// Container to read (default: the pod's default container)
        #[arg(short = 'c', long = "container")]
        container: Option<String>,
        /// Lines from the end of the log to start with (0 means all)
        #[arg(long = "tail", default_value_t = 0)]
        tail: i64,
        /// Read the previous container instance
        #[arg(long = "previous", action = ArgAction::SetTrue)]
        previous: bool,
    },
    /// Run health checks against the cluster and optionally one instance
    Doctor {
        name: Option<String>,
    },
    /// Print the plugin version
    Version,
}

/// Invocation-wide settings, built once from flags and environment.
#[derive(Debug, Clone)]
struct Settings {
    kubeconfig: Option<PathBuf>,
    namespace: Option<String>,
    output: Output,
    doctor: DoctorConfig,
}

impl Settings {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            kubeconfig: cli.kubeconfig.clone(),
            namespace: cli.namespace.clone(),
            output: cli.output,
            doctor: DoctorConfig::from_env(),
        }
    }

    /// Explicit `--namespace`, else the kubeconfig context's namespace.
    fn namespace_or(&self, fallback: &str) -> String {
        self.namespace.clone().unwrap_or_else(|| fallback.to_string())
    }
}

fn version() -> &'static str { option_env!("OPENCLAW_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")) }

fn log_options(follow: bool, container: Option<String>, tail: i64, previous: bool) -> LogOptions {
    LogOptions { follow, previous, tail_lines: (tail > 0).then_some(tail), container }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::from_cli(&cli);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let now = chrono::Utc::now();

    match cli.command {
        Commands::Version => {
            writeln!(out, "kubectl-openclaw {}", version())?;
        }
        Commands::List { all_namespaces } => {
            let (hub, ns) = connect(&settings).await?;
            let scope = (!all_namespaces).then_some(ns.as_str());
            commands::list(&hub, scope, settings.output, now, &mut out).await?;
        }
        Commands::Status { name } => {
            let (hub, ns) = connect(&settings).await?;
            let mut err = io::stderr();
            commands::status(&hub, &ns, &name, settings.output, now, &mut out, &mut err).await?;
        }
        Commands::Logs { name, follow, container, tail, previous } => {
            let (hub, ns) = connect(&settings).await?;
            let opts = log_options(follow, container, tail, previous);
            let mut err = io::stderr();
            tokio::select! {
                res = openclaw_ops::tail_logs(&hub, &ns, &name, &opts, &mut out, &mut err) => { res?; }
                _ = tokio::signal::ctrl_c() => { info!("interrupted; closing log stream"); }
            }
        }
        Commands::Doctor { name } => {
            let (hub, ns) = connect(&settings).await?;
            commands::doctor(&hub, &ns, name.as_deref(), settings.doctor.clone(), settings.output, &mut out).await?;
        }
    }
    Ok(())
}

/// Build the cluster client and settle the target namespace.
async fn connect(settings: &Settings) -> Result<(KubeHub, String)> {
    let hub = KubeHub::connect(settings.kubeconfig.as_deref()).await?;
    let ns = settings.namespace_or(hub.default_namespace());
    debug!(namespace = %ns, output = ?settings.output, "settings resolved");
    Ok((hub, ns))
}

fn init_tracing() {
    let env = std::env::var("OPENCLAW_LOG").unwrap_or_else(|_| "warn".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(io::stderr).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() { Cli::command().debug_assert(); }

    #[test]
    fn ls_alias_and_global_flags() {
        let cli = Cli::try_parse_from(["kubectl-openclaw", "ls", "-A", "-n", "agents", "-o", "json"]).expect("parse");
        assert!(matches!(cli.command, Commands::List { all_namespaces: true }));
        assert_eq!(cli.namespace.as_deref(), Some("agents"));
        assert_eq!(cli.output, Output::Json);
    }

    #[test]
    fn logs_flags_map_to_options() {
        let cli = Cli::try_parse_from(["kubectl-openclaw", "logs", "my-agent", "-f", "-c", "chromium", "--tail", "50"])
            .expect("parse");
        let Commands::Logs { name, follow, container, tail, previous } = cli.command else {
            panic!("expected logs");
        };
        assert_eq!(name, "my-agent");
        let opts = log_options(follow, container, tail, previous);
        assert_eq!(opts, LogOptions {
            follow: true,
            previous: false,
            tail_lines: Some(50),
            container: Some("chromium".into()),
        });
    }

    #[test]
    fn zero_tail_means_unbounded() {
        assert_eq!(log_options(false, None, 0, true).tail_lines, None);
        assert!(log_options(false, None, 0, true).previous);
    }

    #[test]
    fn doctor_name_is_optional_and_kubeconfig_is_global() {
        let cli = Cli::try_parse_from(["kubectl-openclaw", "doctor", "--kubeconfig", "/tmp/kc"]).expect("parse");
        assert!(matches!(cli.command, Commands::Doctor { name: None }));
        assert_eq!(cli.kubeconfig, Some(PathBuf::from("/tmp/kc")));
        let settings = Settings::from_cli(&cli);
        assert_eq!(settings.namespace_or("default"), "default");
    }

    #[test]
    fn status_requires_a_name() {
        assert!(Cli::try_parse_from(["kubectl-openclaw", "status"]).is_err());
    }
}
