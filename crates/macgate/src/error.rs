//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use macgate_config::ConfigError;
use macgate_core::{CoreError, ListKind, StoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid MAC address: {input:?}")]
    #[diagnostic(
        code(macgate::invalid_mac),
        help("Use twelve hex digits, e.g. AA:BB:CC:DD:EE:FF, aa-bb-cc-dd-ee-ff or aabbccddeeff")
    )]
    InvalidMac { input: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(macgate::validation))]
    Validation { field: String, reason: String },

    // ── Lists ────────────────────────────────────────────────────────
    #[error("{mac} is not on the {list} list")]
    #[diagnostic(
        code(macgate::not_found),
        help("Run: macgate {list} list")
    )]
    NotFound { mac: String, list: ListKind },

    #[error("{mac} is already on the {list} list")]
    #[diagnostic(code(macgate::already_present))]
    AlreadyPresent { mac: String, list: ListKind },

    #[error("{mac} is on the {list} list")]
    #[diagnostic(
        code(macgate::conflict),
        help("Use `macgate move to-{target} {mac}` to switch lists")
    )]
    Conflict {
        mac: String,
        list: ListKind,
        target: ListKind,
    },

    #[error("The {list} list is full ({capacity} entries)")]
    #[diagnostic(
        code(macgate::capacity),
        help("Remove an entry first, or raise gate.{list}_capacity in the config file")
    )]
    CapacityExceeded { list: ListKind, capacity: usize },

    // ── Stations ─────────────────────────────────────────────────────
    #[error("Station {mac} is not connected")]
    #[diagnostic(code(macgate::not_connected))]
    NotConnected { mac: String },

    #[error("Radio error: {message}")]
    #[diagnostic(code(macgate::radio))]
    Radio { message: String },

    // ── Engine / storage ─────────────────────────────────────────────
    #[error("The gate engine stopped unexpectedly")]
    #[diagnostic(code(macgate::engine_stopped))]
    EngineStopped,

    #[error("Could not open list store at {path}")]
    #[diagnostic(
        code(macgate::store),
        help("Check the file permissions, or point --store at another file")
    )]
    Store {
        path: String,
        #[source]
        source: StoreError,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(macgate::config),
        help("Inspect the resolved settings with: macgate config show")
    )]
    Config { message: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(code(macgate::config_exists), help("Pass --force to overwrite it"))]
    ConfigExists { path: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(macgate::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(macgate::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidMac { .. }
            | Self::Validation { .. }
            | Self::Config { .. }
            | Self::ConfigExists { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::NotFound { .. } | Self::NotConnected { .. } => exit_code::NOT_FOUND,
            Self::AlreadyPresent { .. } | Self::Conflict { .. } | Self::CapacityExceeded { .. } => {
                exit_code::CONFLICT
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidFormat { input } => Self::InvalidMac { input },
            CoreError::NotFound { mac, list } => Self::NotFound {
                mac: mac.to_string(),
                list,
            },
            CoreError::AlreadyPresent { mac, list } => Self::AlreadyPresent {
                mac: mac.to_string(),
                list,
            },
            CoreError::Conflict { mac, list } => Self::Conflict {
                mac: mac.to_string(),
                list,
                target: list.opposite(),
            },
            CoreError::CapacityExceeded { list, capacity } => {
                Self::CapacityExceeded { list, capacity }
            }
            CoreError::NotConnected { mac } => Self::NotConnected {
                mac: mac.to_string(),
            },
            CoreError::Radio(e) => Self::Radio {
                message: e.to_string(),
            },
            CoreError::EngineStopped => Self::EngineStopped,
            CoreError::Config { message } => Self::Config { message },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
