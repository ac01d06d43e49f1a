//! Human rendering of projected views.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use openclaw_core::prelude::*;
use openclaw_core::view::phase_indicator;

/// Column-aligned text table. Every column but the last is padded to its widest
/// cell plus two spaces.
#[derive(Debug, Default)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: &[&str]) -> Self {
        Self { rows: vec![header.iter().map(|h| h.to_string()).collect()] }
    }

    pub fn push(&mut self, row: Vec<String>) { self.rows.push(row); }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let cols = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; cols];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        for row in &self.rows {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i + 1 == row.len() {
                    line.push_str(cell);
                } else {
                    line.push_str(&format!("{:<w$}", cell, w = widths[i] + 2));
                }
            }
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }
}

/// `Running  [ok]`; unrecognised phases are shown bare.
pub fn phase_with_indicator(phase: &str) -> String {
    match phase_indicator(phase) {
        Some(ind) => format!("{}  {}", phase, ind),
        None => phase.to_string(),
    }
}

/// The `list` table. The namespace column only appears across namespaces.
pub fn render_rows<W: Write>(rows: &[InstanceRow], all_namespaces: bool, out: &mut W) -> io::Result<()> {
    let mut table = if all_namespaces {
        Table::new(&["NAMESPACE", "NAME", "PHASE", "READY", "GATEWAY", "AGE"])
    } else {
        Table::new(&["NAME", "PHASE", "READY", "GATEWAY", "AGE"])
    };
    for r in rows {
        let mut row = Vec::with_capacity(6);
        if all_namespaces {
            row.push(r.namespace.clone());
        }
        row.extend([r.name.clone(), r.phase.clone(), r.ready.clone(), r.gateway.clone(), r.age.clone()]);
        table.push(row);
    }
    table.render(out)
}

/// The `status` report. `pods_error` replaces the pod section when listing failed.
pub fn render_status<W: Write>(
    view: &InstanceView,
    pods_error: Option<&str>,
    now: DateTime<Utc>,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "OpenClawInstance: {}/{}", view.namespace, view.name)?;
    writeln!(out, "Phase:           {}", phase_with_indicator(&view.phase))?;
    writeln!(out, "Age:             {}", age_since(view.created, now))?;
    writeln!(out)?;

    writeln!(out, "Image:    {}", view.image)?;
    writeln!(out)?;

    if !view.endpoints.is_empty() {
        writeln!(out, "Endpoints:")?;
        for ep in &view.endpoints {
            writeln!(out, "  {:<21}{}", format!("{}:", ep.name), ep.url)?;
        }
        writeln!(out)?;
    }

    if !view.conditions.is_empty() {
        writeln!(out, "Conditions:")?;
        let mut table = Table::new(&["  TYPE", "STATUS", "REASON", "MESSAGE"]);
        for c in &view.conditions {
            table.push(vec![
                format!("  {} {}", c.indicator(), c.kind),
                c.status.clone(),
                c.reason.clone(),
                c.message.clone(),
            ]);
        }
        table.render(out)?;
        writeln!(out)?;
    }

    if !view.managed.is_empty() {
        writeln!(out, "Managed Resources:")?;
        for m in &view.managed {
            writeln!(out, "  {:<16} {}", format!("{}:", m.kind), m.name)?;
        }
        writeln!(out)?;
    }

    render_pods(view, pods_error, now, out)
}

fn render_pods<W: Write>(view: &InstanceView, pods_error: Option<&str>, now: DateTime<Utc>, out: &mut W) -> io::Result<()> {
    if let Some(e) = pods_error {
        return writeln!(out, "Pod Status: failed to list pods: {}", e);
    }
    let Some(primary) = view.primary_pod() else {
        return writeln!(out, "Pods: none found");
    };

    writeln!(out, "Pods:")?;
    let mut table = Table::new(&["  NAME", "STATUS", "RESTARTS", "AGE"]);
    for p in &view.pods {
        table.push(vec![format!("  {}", p.name), p.phase.clone(), p.restarts.to_string(), age_since(p.created, now)]);
    }
    table.render(out)?;
    writeln!(out)?;

    if !primary.containers.is_empty() {
        writeln!(out, "Containers:")?;
        let mut table = Table::new(&["  NAME", "READY", "STATE", "RESTARTS"]);
        for c in &primary.containers {
            table.push(vec![format!("  {}", c.name), c.ready.to_string(), c.state.to_string(), c.restarts.to_string()]);
        }
        table.render(out)?;
    }
    Ok(())
}
