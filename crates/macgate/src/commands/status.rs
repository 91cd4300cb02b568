//! `status`: both lists, live stations and the audit log in one view.

use std::fmt::Write as _;

use tabled::Tabled;

use macgate_core::{ConnectedStation, Controller, GateSnapshot, LogRecord, PendingStation};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::commands::util::ListedRow;
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ConnectedRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Link")]
    link: String,
    #[tabled(rename = "Signal")]
    signal: String,
}

impl ConnectedRow {
    fn new(c: &ConnectedStation) -> Self {
        Self {
            mac: c.mac.to_string(),
            alias: c.alias.clone().unwrap_or_default(),
            link: c.link_id.to_string(),
            signal: format!("{} dBm", c.signal_dbm),
        }
    }
}

#[derive(Tabled)]
struct PendingRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Waiting")]
    waiting: String,
    #[tabled(rename = "Last Seen")]
    seen: String,
}

impl PendingRow {
    fn new(p: &PendingStation) -> Self {
        Self {
            mac: p.mac.to_string(),
            alias: p.alias.clone().unwrap_or_default(),
            waiting: format!("{}s", p.waiting_ms / 1000),
            seen: format!("{}s ago", p.seen_ms / 1000),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct LogRow {
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl LogRow {
    fn new(r: &LogRecord) -> Self {
        Self {
            age: r.age.clone(),
            level: r.level.to_string(),
            message: r.message.clone(),
        }
    }
}

// ── Rendering ───────────────────────────────────────────────────────

fn section<T, R: Tabled>(out: &mut String, title: &str, items: &[T], to_row: impl Fn(&T) -> R) {
    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "{title} ({})", items.len());
    if !items.is_empty() {
        let rows: Vec<R> = items.iter().map(to_row).collect();
        let _ = writeln!(out, "{}", output::render_table(&rows));
    }
}

/// Render a whole snapshot in the selected format.
pub(crate) fn render_snapshot(snap: &GateSnapshot, format: &OutputFormat) -> String {
    let detail = |s: &GateSnapshot| {
        let mut out = String::new();
        section(&mut out, "Allowed", &s.allowed, ListedRow::new);
        section(&mut out, "Denied", &s.denied, ListedRow::new);
        section(&mut out, "Connected", &s.connected, ConnectedRow::new);
        section(&mut out, "Waiting", &s.pending, PendingRow::new);
        section(&mut out, "Log", &s.log, LogRow::new);
        out.trim_end().to_owned()
    };
    let counts = |s: &GateSnapshot| {
        format!(
            "allowed={} denied={} connected={} waiting={}",
            s.allowed.len(),
            s.denied.len(),
            s.connected.len(),
            s.pending.len()
        )
    };
    output::render_single(format, snap, detail, counts)
}

/// Render audit log records in the selected format.
pub(crate) fn render_log(records: &[LogRecord], format: &OutputFormat) -> String {
    output::render_list(format, records, LogRow::new, |r| {
        format!("{} {}", r.age, r.message)
    })
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let snap = controller.query_state().await?;
    let out = render_snapshot(&snap, &global.output);
    output::print_output(&out, global.quiet);
    Ok(())
}
