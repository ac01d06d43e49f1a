//! OpenClaw Ops: resolve an instance's pod and tail its logs.

#![forbid(unsafe_code)]

use std::io::Write;

use anyhow::{anyhow, Context, Result};
use futures::{Stream, StreamExt};
use openclaw_core::project::multiple_pods_warning;
use openclaw_core::project::summarize_pod;
use openclaw_kubehub::{LogOptions, Orchestrator};
use tracing::{debug, info};

/// Longest line accepted from a log stream, in bytes.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Pod chosen to serve an instance, plus a warning when the choice was ambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodPick {
    pub name: String,
    pub warning: Option<String>,
}

/// Pick the first pod correlated with instance `name`.
pub async fn resolve_pod(hub: &dyn Orchestrator, namespace: &str, name: &str) -> Result<PodPick> {
    let selector = openclaw_core::instance_selector(name);
    let pods = hub.list_pods(namespace, &selector).await.context("failed to list pods")?;
    let pods: Vec<_> = pods.iter().map(summarize_pod).collect();
    let first = pods
        .first()
        .ok_or_else(|| anyhow!("no pods found for OpenClawInstance {:?} in namespace {:?}", name, namespace))?;
    debug!(instance = %name, pod = %first.name, matched = pods.len(), "pod resolved");
    Ok(PodPick { name: first.name.clone(), warning: multiple_pods_warning(&pods) })
}

/// Stream logs of instance `name` to `out`, one line at a time.
///
/// Returns the number of lines written. With `opts.follow` this only returns once the
/// server closes the stream; the stream is released on every exit path.
pub async fn tail_logs<W, E>(
    hub: &dyn Orchestrator,
    namespace: &str,
    name: &str,
    opts: &LogOptions,
    out: &mut W,
    err: &mut E,
) -> Result<u64>
where
    W: Write,
    E: Write,
{
    let pod = resolve_pod(hub, namespace, name).await?;
    if let Some(w) = &pod.warning {
        writeln!(err, "Warning: {}", w)?;
    }
    let stream = hub
        .log_stream(namespace, &pod.name, opts)
        .await
        .with_context(|| format!("failed to stream logs from pod {}", pod.name))?;
    let lines = pump_lines(stream, out).await.context("error reading logs")?;
    info!(pod = %pod.name, lines, "log stream ended");
    Ok(lines)
}

/// Split a byte stream into lines and echo each complete line to `out` as it arrives.
///
/// A trailing line without newline is flushed when the stream ends. `\r\n` endings are
/// normalised to `\n`. A line longer than [`MAX_LINE_BYTES`] aborts the pump.
pub async fn pump_lines<S, E, W>(stream: S, out: &mut W) -> Result<u64>
where
    S: Stream<Item = Result<bytes::Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
    W: Write,
{
    let stream = stream.fuse();
    futures::pin_mut!(stream);
    let mut buf = bytes::BytesMut::new();
    let mut lines = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buf.extend_from_slice(&chunk);
        while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            if pos > MAX_LINE_BYTES {
                return Err(anyhow!("log line exceeds {} bytes", MAX_LINE_BYTES));
            }
            let line = buf.split_to(pos);
            let _ = buf.split_to(1); // drop '\n'
            write_line(out, &line)?;
            lines += 1;
        }
        if buf.len() > MAX_LINE_BYTES {
            return Err(anyhow!("log line exceeds {} bytes", MAX_LINE_BYTES));
        }
    }
    if !buf.is_empty() {
        write_line(out, &buf)?;
        lines += 1;
    }
    Ok(lines)
}

fn write_line<W: Write>(out: &mut W, line: &[u8]) -> std::io::Result<()> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    out.write_all(line)?;
    out.write_all(b"\n")?;
    out.flush()
}
