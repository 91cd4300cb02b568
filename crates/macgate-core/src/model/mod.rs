// ── Domain model ──
//
// Addresses, per-station records, and the structured snapshot handed to
// consumers. Nothing here knows about channels or persistence.

pub mod mac;
pub mod snapshot;
pub mod station;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Re-exports ──────────────────────────────────────────────────────

pub use mac::{LinkId, MacAddress, normalize};
pub use snapshot::{ConnectedStation, GateSnapshot, ListedAddress, PendingStation};
pub use station::{ConnectedEntry, PendingEntry};

/// Which admission list an operation targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListKind {
    Allow,
    Deny,
}

impl ListKind {
    /// The list an address leaves when moved onto this one.
    pub fn opposite(self) -> Self {
        match self {
            Self::Allow => Self::Deny,
            Self::Deny => Self::Allow,
        }
    }
}

/// Outcome of an association attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    /// Allow-listed: the station stays associated.
    Admit,
    /// Anything else: queued for review and force-disconnected.
    Quarantine,
}

/// How far a successful mutation made it to durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "durability", rename_all = "lowercase")]
pub enum Durability {
    Persisted,
    /// The in-memory change stands but the store write failed.
    Degraded { reason: String },
}

impl Durability {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }

    /// Keep the first degradation when two writes back one operation.
    pub(crate) fn and(self, other: Self) -> Self {
        match self {
            Self::Persisted => other,
            degraded @ Self::Degraded { .. } => degraded,
        }
    }
}
