// ── Pending (quarantine) queue ──
//
// Bounded holding area for stations that tried to associate without being
// allow-listed. Entries age out after a TTL; when the queue is full the
// entry with the oldest `last_seen` makes room for the newcomer.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::model::{LinkId, MacAddress, PendingEntry};

/// Result of [`PendingQueue::record_attempt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// First attempt from this address. Carries the address evicted to make
    /// room, if the queue was full.
    New { evicted: Option<MacAddress> },
    /// The address was already queued; its `last_seen` and link id moved.
    Refreshed,
}

#[derive(Debug)]
pub struct PendingQueue {
    entries: Vec<PendingEntry>,
    capacity: usize,
    sequence: u64,
}

impl PendingQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            sequence: 0,
        }
    }

    /// Record an association attempt from a non-admitted station.
    pub fn record_attempt(
        &mut self,
        mac: &MacAddress,
        link_id: LinkId,
        alias: Option<String>,
        now: Instant,
    ) -> AttemptOutcome {
        if let Some(entry) = self.entries.iter_mut().find(|e| &e.mac == mac) {
            entry.last_seen = now;
            entry.link_id = link_id;
            if alias.is_some() {
                entry.alias = alias;
            }
            return AttemptOutcome::Refreshed;
        }

        self.sequence += 1;
        let entry = PendingEntry {
            mac: mac.clone(),
            alias,
            link_id,
            first_seen: now,
            last_seen: now,
        };

        if self.entries.len() < self.capacity {
            self.entries.push(entry);
            return AttemptOutcome::New { evicted: None };
        }

        let oldest = self
            .entries
            .iter_mut()
            .min_by_key(|e| e.last_seen);
        let Some(slot) = oldest else {
            // Zero capacity: the arrival is counted but nothing is kept.
            return AttemptOutcome::New { evicted: None };
        };
        let evicted = std::mem::replace(slot, entry);
        debug!(evicted = %evicted.mac, admitted = %mac, "pending queue full, evicted oldest");
        AttemptOutcome::New {
            evicted: Some(evicted.mac),
        }
    }

    /// Drop every entry whose age exceeds `ttl`. Returns the removed addresses.
    pub fn sweep_expired(&mut self, now: Instant, ttl: Duration) -> Vec<MacAddress> {
        let mut expired = Vec::new();
        self.entries.retain(|e| {
            let keep = now.saturating_duration_since(e.last_seen) <= ttl;
            if !keep {
                expired.push(e.mac.clone());
            }
            keep
        });
        expired
    }

    pub fn remove_if_present(&mut self, mac: &MacAddress) -> Option<PendingEntry> {
        let idx = self.entries.iter().position(|e| &e.mac == mac)?;
        Some(self.entries.remove(idx))
    }

    /// Replace the alias of a queued entry, if any.
    pub fn set_alias(&mut self, mac: &MacAddress, alias: Option<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| &e.mac == mac) {
            entry.alias = alias;
        }
    }

    pub fn get(&self, mac: &MacAddress) -> Option<&PendingEntry> {
        self.entries.iter().find(|e| &e.mac == mac)
    }

    pub fn contains(&self, mac: &MacAddress) -> bool {
        self.get(mac).is_some()
    }

    /// Entries in insertion order (evictions reuse the evicted slot).
    pub fn iter(&self) -> impl Iterator<Item = &PendingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Monotonic count of `New` outcomes.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mac(n: u8) -> MacAddress {
        MacAddress::from_octets([0x02, 0, 0, 0, 0, n])
    }

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn first_attempt_is_new_and_bumps_sequence() {
        let mut q = PendingQueue::new(4);
        let now = Instant::now();
        assert_eq!(
            q.record_attempt(&mac(1), LinkId(1), None, now),
            AttemptOutcome::New { evicted: None }
        );
        assert_eq!(q.sequence(), 1);
        assert!(q.contains(&mac(1)));
    }

    #[test]
    fn repeat_attempt_refreshes_without_new_arrival() {
        let mut q = PendingQueue::new(4);
        let t0 = Instant::now();
        q.record_attempt(&mac(1), LinkId(1), None, t0);
        let t1 = t0 + Duration::from_secs(10);
        assert_eq!(
            q.record_attempt(&mac(1), LinkId(7), None, t1),
            AttemptOutcome::Refreshed
        );
        let entry = q.get(&mac(1)).unwrap();
        assert_eq!(entry.link_id, LinkId(7));
        assert_eq!(entry.first_seen, t0);
        assert_eq!(entry.last_seen, t1);
        assert_eq!(q.sequence(), 1);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn full_queue_evicts_smallest_last_seen() {
        let mut q = PendingQueue::new(3);
        let t0 = Instant::now();
        q.record_attempt(&mac(1), LinkId(1), None, t0 + Duration::from_secs(2));
        q.record_attempt(&mac(2), LinkId(2), None, t0);
        q.record_attempt(&mac(3), LinkId(3), None, t0 + Duration::from_secs(1));

        let outcome = q.record_attempt(&mac(4), LinkId(4), None, t0 + Duration::from_secs(3));
        assert_eq!(
            outcome,
            AttemptOutcome::New {
                evicted: Some(mac(2))
            }
        );
        assert_eq!(q.len(), 3);
        assert!(!q.contains(&mac(2)));
        assert!(q.contains(&mac(4)));
    }

    #[test]
    fn queue_never_exceeds_capacity() {
        let mut q = PendingQueue::new(5);
        let t0 = Instant::now();
        for n in 0..40 {
            q.record_attempt(&mac(n), LinkId(1), None, t0 + Duration::from_secs(u64::from(n)));
            assert!(q.len() <= 5);
        }
        assert_eq!(q.sequence(), 40);
    }

    #[test]
    fn sweep_removes_everything_past_ttl() {
        let mut q = PendingQueue::new(4);
        let t0 = Instant::now();
        q.record_attempt(&mac(1), LinkId(1), None, t0);
        q.record_attempt(&mac(2), LinkId(2), None, t0);

        let removed = q.sweep_expired(t0 + TTL + Duration::from_millis(1), TTL);
        assert_eq!(removed, vec![mac(1), mac(2)]);
        assert!(q.is_empty());
    }

    #[test]
    fn sweep_keeps_entries_at_exactly_ttl() {
        let mut q = PendingQueue::new(4);
        let t0 = Instant::now();
        q.record_attempt(&mac(1), LinkId(1), None, t0);
        assert!(q.sweep_expired(t0 + TTL, TTL).is_empty());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn sweep_is_idempotent() {
        let mut q = PendingQueue::new(4);
        let t0 = Instant::now();
        q.record_attempt(&mac(1), LinkId(1), None, t0);
        q.record_attempt(&mac(2), LinkId(2), None, t0 + Duration::from_secs(200));

        let now = t0 + Duration::from_secs(301);
        assert_eq!(q.sweep_expired(now, TTL), vec![mac(1)]);
        assert!(q.sweep_expired(now, TTL).is_empty());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn remove_if_present_is_tolerant() {
        let mut q = PendingQueue::new(2);
        q.record_attempt(&mac(1), LinkId(1), None, Instant::now());
        assert!(q.remove_if_present(&mac(9)).is_none());
        assert_eq!(q.remove_if_present(&mac(1)).unwrap().mac, mac(1));
        assert!(q.is_empty());
    }

    #[test]
    fn zero_capacity_counts_but_keeps_nothing() {
        let mut q = PendingQueue::new(0);
        q.record_attempt(&mac(1), LinkId(1), None, Instant::now());
        assert!(q.is_empty());
        assert_eq!(q.sequence(), 1);
    }
}
