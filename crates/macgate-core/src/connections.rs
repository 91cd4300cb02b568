// ── Connection table ──
//
// Allow-listed stations that are currently associated. Only an explicit
// disassociation removes an entry; a missing signal sample just zeroes it.

use tokio::time::Instant;
use tracing::warn;

use crate::model::{ConnectedEntry, LinkId, MacAddress};
use crate::radio::SignalSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Refreshed,
    /// Table full; the station is admitted but not tracked.
    Dropped,
}

#[derive(Debug)]
pub struct ConnectionTable {
    entries: Vec<ConnectedEntry>,
    capacity: usize,
}

impl ConnectionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn upsert(
        &mut self,
        mac: &MacAddress,
        alias: Option<String>,
        link_id: LinkId,
        now: Instant,
    ) -> UpsertOutcome {
        if let Some(entry) = self.entries.iter_mut().find(|e| &e.mac == mac) {
            entry.last_seen = now;
            entry.link_id = link_id;
            return UpsertOutcome::Refreshed;
        }

        if self.entries.len() >= self.capacity {
            warn!(%mac, capacity = self.capacity, "connection table full, station not tracked");
            return UpsertOutcome::Dropped;
        }

        self.entries.push(ConnectedEntry {
            mac: mac.clone(),
            alias,
            link_id,
            last_seen: now,
            signal_dbm: 0,
        });
        UpsertOutcome::Inserted
    }

    pub fn remove(&mut self, mac: &MacAddress) -> Option<ConnectedEntry> {
        let idx = self.entries.iter().position(|e| &e.mac == mac)?;
        Some(self.entries.remove(idx))
    }

    /// Apply a radio signal snapshot. Tracked stations missing from it read 0.
    pub fn refresh_signal(&mut self, samples: &[SignalSample]) {
        for entry in &mut self.entries {
            entry.signal_dbm = samples
                .iter()
                .find(|s| s.mac == entry.mac)
                .map_or(0, |s| s.signal_dbm);
        }
    }

    pub fn set_alias(&mut self, mac: &MacAddress, alias: Option<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| &e.mac == mac) {
            entry.alias = alias;
        }
    }

    pub fn get(&self, mac: &MacAddress) -> Option<&ConnectedEntry> {
        self.entries.iter().find(|e| &e.mac == mac)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectedEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn mac(n: u8) -> MacAddress {
        MacAddress::from_octets([0x02, 0, 0, 0, 1, n])
    }

    #[test]
    fn upsert_inserts_then_refreshes() {
        let mut table = ConnectionTable::new(4);
        let t0 = Instant::now();
        assert_eq!(
            table.upsert(&mac(1), Some("laptop".into()), LinkId(1), t0),
            UpsertOutcome::Inserted
        );
        let t1 = t0 + Duration::from_secs(3);
        assert_eq!(
            table.upsert(&mac(1), None, LinkId(2), t1),
            UpsertOutcome::Refreshed
        );
        let entry = table.get(&mac(1)).unwrap();
        assert_eq!(entry.link_id, LinkId(2));
        assert_eq!(entry.last_seen, t1);
        assert_eq!(entry.alias.as_deref(), Some("laptop"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn full_table_drops_silently() {
        let mut table = ConnectionTable::new(1);
        let now = Instant::now();
        table.upsert(&mac(1), None, LinkId(1), now);
        assert_eq!(
            table.upsert(&mac(2), None, LinkId(2), now),
            UpsertOutcome::Dropped
        );
        assert_eq!(table.len(), 1);
        assert!(table.get(&mac(2)).is_none());
    }

    #[test]
    fn signal_refresh_zeroes_unmatched_but_keeps_them() {
        let mut table = ConnectionTable::new(4);
        let now = Instant::now();
        table.upsert(&mac(1), None, LinkId(1), now);
        table.upsert(&mac(2), None, LinkId(2), now);

        table.refresh_signal(&[
            SignalSample {
                mac: mac(1),
                signal_dbm: -48,
            },
            SignalSample {
                mac: mac(2),
                signal_dbm: -70,
            },
        ]);
        assert_eq!(table.get(&mac(2)).unwrap().signal_dbm, -70);

        table.refresh_signal(&[SignalSample {
            mac: mac(1),
            signal_dbm: -52,
        }]);
        assert_eq!(table.get(&mac(1)).unwrap().signal_dbm, -52);
        assert_eq!(table.get(&mac(2)).unwrap().signal_dbm, 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn remove_only_touches_the_named_station() {
        let mut table = ConnectionTable::new(4);
        let now = Instant::now();
        table.upsert(&mac(1), None, LinkId(1), now);
        table.upsert(&mac(2), None, LinkId(2), now);
        assert!(table.remove(&mac(3)).is_none());
        assert_eq!(table.remove(&mac(1)).unwrap().link_id, LinkId(1));
        assert_eq!(table.iter().map(|e| e.mac.clone()).collect::<Vec<_>>(), [mac(2)]);
    }
}
