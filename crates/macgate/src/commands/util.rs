//! Shared helpers for command handlers.

use std::io::IsTerminal;

use serde::Serialize;
use tabled::Tabled;

use macgate_core::{Durability, ListedAddress, MacAddress};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Mutation report ─────────────────────────────────────────────────

/// Outcome of one list or alias change, as printed to the user.
#[derive(Debug, Serialize)]
pub struct MutationReport {
    pub mac: String,
    pub action: &'static str,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl MutationReport {
    pub fn new(mac: &MacAddress, action: &'static str, durability: Durability) -> Self {
        let warning = match durability {
            Durability::Persisted => None,
            Durability::Degraded { reason } => Some(reason),
        };
        Self {
            mac: mac.to_string(),
            action,
            persisted: warning.is_none(),
            warning,
        }
    }
}

/// Print a mutation result; a degraded store write also warns on stderr.
pub fn report_mutation(report: &MutationReport, sentence: &str, global: &GlobalOpts) {
    if let Some(ref reason) = report.warning {
        output::print_warning(
            &format!("change applied but not saved: {reason}"),
            output::should_color(&global.color),
        );
    }
    let out = output::render_single(
        &global.output,
        report,
        |_| sentence.to_owned(),
        |r| r.mac.clone(),
    );
    output::print_output(&out, global.quiet);
}

/// Canonicalize operator input up front so errors name what was typed.
pub fn parse_mac(text: &str) -> Result<MacAddress, CliError> {
    Ok(MacAddress::parse(text)?)
}

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct ListedRow {
    #[tabled(rename = "MAC")]
    pub mac: String,
    #[tabled(rename = "Alias")]
    pub alias: String,
}

impl ListedRow {
    pub fn new(a: &ListedAddress) -> Self {
        Self {
            mac: a.mac.to_string(),
            alias: a.alias.clone().unwrap_or_default(),
        }
    }
}

// ── Prompts ─────────────────────────────────────────────────────────

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
