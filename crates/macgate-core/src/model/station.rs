// ── Per-station records ──

use tokio::time::Instant;

use super::mac::{LinkId, MacAddress};

/// An unrecognized station waiting for an administrator decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub mac: MacAddress,
    pub alias: Option<String>,
    pub link_id: LinkId,
    pub first_seen: Instant,
    pub last_seen: Instant,
}

/// An allow-listed station that is currently associated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedEntry {
    pub mac: MacAddress,
    pub alias: Option<String>,
    pub link_id: LinkId,
    pub last_seen: Instant,
    /// Last reported RSSI in dBm; 0 when the radio did not report the station.
    pub signal_dbm: i8,
}
