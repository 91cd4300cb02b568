// ── Command API ──
//
// Every administrative request flows through one `Command` enum. Address
// arguments are raw operator text; the engine normalizes them before any
// container is touched.

use std::sync::Arc;

use crate::error::CoreError;
use crate::event_log::LogRecord;
use crate::model::{Durability, GateSnapshot};

/// A command envelope sent through the command channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All administrative operations against a running gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ── Waiting list decisions ───────────────────────────────────────
    Approve { mac: String },
    /// Block a waiting device (deny it).
    Block { mac: String },

    // ── List maintenance ─────────────────────────────────────────────
    AllowAdd { mac: String },
    AllowRemove { mac: String },
    DenyAdd { mac: String },
    DenyRemove { mac: String },
    MoveToAllow { mac: String },
    MoveToDeny { mac: String },

    // ── Aliases ──────────────────────────────────────────────────────
    /// `None` or blank clears the alias.
    SetAlias { mac: String, alias: Option<String> },
    GetAlias { mac: String },

    // ── Stations ─────────────────────────────────────────────────────
    ForceDisconnect { mac: String },

    // ── Maintenance / queries ────────────────────────────────────────
    Sweep,
    QueryState,
    QueryLog,
}

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    /// A list or alias mutation and how far it reached the store.
    Applied(Durability),
    Alias(Option<String>),
    /// Number of waiting entries the sweep expired.
    Swept(usize),
    State(Arc<GateSnapshot>),
    Log(Vec<LogRecord>),
}
