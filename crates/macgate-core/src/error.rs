// ── Core error types ──
//
// User-facing errors from macgate-core. Collaborator failures (store,
// radio) have their own types; store failures never surface here because
// persistence is best-effort and reported through `Durability` instead.

use thiserror::Error;

use crate::model::{ListKind, MacAddress};
use crate::radio::RadioError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid MAC address: {input:?}")]
    InvalidFormat { input: String },

    // ── Registry errors ──────────────────────────────────────────────
    #[error("{mac} is not on the {list} list")]
    NotFound { mac: MacAddress, list: ListKind },

    #[error("{mac} is already on the {list} list")]
    AlreadyPresent { mac: MacAddress, list: ListKind },

    #[error("The {list} list is full ({capacity} entries)")]
    CapacityExceeded { list: ListKind, capacity: usize },

    #[error("{mac} is on the {list} list -- move it instead of adding it")]
    Conflict { mac: MacAddress, list: ListKind },

    // ── Station errors ───────────────────────────────────────────────
    #[error("Station {mac} is not connected")]
    NotConnected { mac: MacAddress },

    #[error(transparent)]
    Radio(#[from] RadioError),

    // ── Engine errors ────────────────────────────────────────────────
    #[error("Gate engine stopped")]
    EngineStopped,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
