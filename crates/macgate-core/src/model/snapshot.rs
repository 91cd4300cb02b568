// ── Structured state export ──
//
// A plain value describing every container at one instant. Consumers
// serialize it however they like; the core owns no wire format.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::mac::{LinkId, MacAddress};
use super::station::{ConnectedEntry, PendingEntry};
use crate::event_log::LogRecord;

/// Point-in-time view of the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSnapshot {
    pub allowed: Vec<ListedAddress>,
    pub denied: Vec<ListedAddress>,
    pub connected: Vec<ConnectedStation>,
    pub pending: Vec<PendingStation>,
    /// Count of new pending arrivals since start. Observers compare it to
    /// the last value they saw to detect new waiting devices.
    pub pending_sequence: u64,
    pub log: Vec<LogRecord>,
}

impl GateSnapshot {
    pub fn is_allowed(&self, mac: &MacAddress) -> bool {
        self.allowed.iter().any(|a| &a.mac == mac)
    }

    pub fn is_denied(&self, mac: &MacAddress) -> bool {
        self.denied.iter().any(|a| &a.mac == mac)
    }

    pub fn pending_entry(&self, mac: &MacAddress) -> Option<&PendingStation> {
        self.pending.iter().find(|p| &p.mac == mac)
    }

    pub fn connected_entry(&self, mac: &MacAddress) -> Option<&ConnectedStation> {
        self.connected.iter().find(|c| &c.mac == mac)
    }
}

/// An allow- or deny-list member with its alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedAddress {
    pub mac: MacAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedStation {
    pub mac: MacAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub link_id: LinkId,
    /// Milliseconds since the last association event.
    pub seen_ms: u64,
    pub signal_dbm: i8,
}

impl ConnectedStation {
    pub(crate) fn from_entry(entry: &ConnectedEntry, now: Instant) -> Self {
        Self {
            mac: entry.mac.clone(),
            alias: entry.alias.clone(),
            link_id: entry.link_id,
            seen_ms: millis_since(entry.last_seen, now),
            signal_dbm: entry.signal_dbm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingStation {
    pub mac: MacAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub link_id: LinkId,
    /// Milliseconds since the most recent attempt.
    pub seen_ms: u64,
    /// Milliseconds since the first attempt.
    pub waiting_ms: u64,
}

impl PendingStation {
    pub(crate) fn from_entry(entry: &PendingEntry, now: Instant) -> Self {
        Self {
            mac: entry.mac.clone(),
            alias: entry.alias.clone(),
            link_id: entry.link_id,
            seen_ms: millis_since(entry.last_seen, now),
            waiting_ms: millis_since(entry.first_seen, now),
        }
    }
}

pub(crate) fn millis_since(then: Instant, now: Instant) -> u64 {
    duration_millis(now.saturating_duration_since(then))
}

pub(crate) fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
