//! Clap derive structures for the `macgate` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// macgate -- MAC admission control for a WiFi access point
#[derive(Debug, Parser)]
#[command(
    name = "macgate",
    version,
    about = "Administer the MAC allow/deny lists of a WiFi access point",
    long_about = "Administer the MAC allow/deny lists of a WiFi access point.\n\n\
        Unknown stations are sent to a waiting list and disconnected until an\n\
        administrator approves or blocks them. Lists and aliases live in a\n\
        JSON store; `simulate` drives the full gating engine from a script.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "MACGATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// List store file (overrides `store_path` from config)
    #[arg(long, env = "MACGATE_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MACGATE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the allow list
    #[command(alias = "a")]
    Allow(ListArgs),

    /// Manage the deny list
    #[command(alias = "d")]
    Deny(ListArgs),

    /// Move an address between the lists
    #[command(alias = "mv")]
    Move(MoveArgs),

    /// Set or read device aliases
    Alias(AliasArgs),

    /// Print the canonical form of a MAC address
    Normalize {
        /// Address in any common notation (AA-BB-CC-DD-EE-FF, aabb.ccdd.eeff, ...)
        mac: String,
    },

    /// Show both lists and the engine's start-up log
    #[command(alias = "st")]
    Status,

    /// Run the gating engine against a scripted radio
    #[command(alias = "sim")]
    Simulate(SimulateArgs),

    /// Inspect the CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LISTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(subcommand)]
    pub command: ListCommand,
}

#[derive(Debug, Subcommand)]
pub enum ListCommand {
    /// Show every address on the list
    #[command(alias = "ls")]
    List,

    /// Add an address
    Add {
        /// MAC address
        mac: String,
    },

    /// Remove an address (also drops its alias)
    #[command(alias = "rm")]
    Remove {
        /// MAC address
        mac: String,
    },
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    #[command(subcommand)]
    pub command: MoveCommand,
}

#[derive(Debug, Subcommand)]
pub enum MoveCommand {
    /// Put an address on the allow list, taking it off the deny list
    ToAllow {
        /// MAC address
        mac: String,
    },

    /// Put an address on the deny list, taking it off the allow list
    ToDeny {
        /// MAC address
        mac: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ALIASES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AliasArgs {
    #[command(subcommand)]
    pub command: AliasCommand,
}

#[derive(Debug, Subcommand)]
pub enum AliasCommand {
    /// Give an address a human-readable name
    Set {
        /// MAC address
        mac: String,
        /// Alias text
        alias: String,
    },

    /// Show the alias for an address
    Get {
        /// MAC address
        mac: String,
    },

    /// Remove the alias for an address
    Clear {
        /// MAC address
        mac: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SIMULATE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Read the script from a file instead of stdin
    #[arg(long, short = 's')]
    pub script: Option<PathBuf>,

    /// Keep lists in memory only; the store file is never touched
    #[arg(long)]
    pub ephemeral: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration
    Show,

    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
