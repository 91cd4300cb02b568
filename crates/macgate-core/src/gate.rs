// ── Gate state machine ──
//
// Owns every container and applies radio events, administrative commands
// and maintenance ticks to them one at a time. The engine task in
// `controller` is the only caller outside tests, so nothing here locks.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::GateConfig;
use crate::connections::ConnectionTable;
use crate::error::CoreError;
use crate::event_log::{EventLog, LogRecord};
use crate::model::{
    ConnectedStation, Decision, Durability, GateSnapshot, LinkId, ListKind, MacAddress,
    PendingStation,
};
use crate::pending::{AttemptOutcome, PendingQueue};
use crate::radio::Radio;
use crate::registry::AdmissionRegistry;
use crate::store::ListStore;

pub struct Gate {
    config: GateConfig,
    registry: AdmissionRegistry,
    pending: PendingQueue,
    connections: ConnectionTable,
    log: EventLog,
    radio: Arc<dyn Radio>,
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("registry", &self.registry)
            .field("pending", &self.pending.len())
            .field("connected", &self.connections.len())
            .finish_non_exhaustive()
    }
}

impl Gate {
    /// Load the lists, apply bootstrap devices and write the start entry.
    pub fn open(
        config: GateConfig,
        store: Arc<dyn ListStore>,
        radio: Arc<dyn Radio>,
        now: Instant,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let registry =
            AdmissionRegistry::load(store, config.allow_capacity, config.deny_capacity);
        let mut gate = Self {
            pending: PendingQueue::new(config.pending_capacity),
            connections: ConnectionTable::new(config.connected_capacity),
            log: EventLog::new(config.log_capacity),
            registry,
            radio,
            config,
        };

        gate.apply_bootstrap(now)?;
        gate.log.info("System started.", now);
        info!(
            allowed = gate.registry.members(ListKind::Allow).len(),
            denied = gate.registry.members(ListKind::Deny).len(),
            "gate started"
        );
        Ok(gate)
    }

    fn apply_bootstrap(&mut self, now: Instant) -> Result<(), CoreError> {
        let devices = self.config.bootstrap.clone();
        for device in devices {
            let mac = MacAddress::parse(&device.mac).map_err(|_| CoreError::Config {
                message: format!("bootstrap device {:?} is not a MAC address", device.mac),
            })?;
            if self.registry.is_allowed(&mac) {
                continue;
            }
            let mut durability = match self.registry.move_to(&mac, ListKind::Allow) {
                Ok(durability) => durability,
                Err(e @ CoreError::CapacityExceeded { .. }) => {
                    warn!(%mac, error = %e, "skipping bootstrap device");
                    self.log
                        .warning(format!("Could not add {mac} to the allow list: {e}"), now);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if let Some(alias) = device.alias.as_deref() {
                durability = durability.and(self.registry.set_alias(&mac, Some(alias)));
            }
            self.record(
                durability,
                &mac,
                format!("{mac} added to the allow list by default."),
                now,
            );
        }
        Ok(())
    }

    // ── Radio events ────────────────────────────────────────────────

    /// Gate one association. Quarantined stations are kicked exactly once.
    pub fn on_associate(&mut self, mac: &MacAddress, link_id: LinkId, now: Instant) -> Decision {
        let alias = self.registry.alias(mac);

        if self.registry.is_allowed(mac) {
            self.connections.upsert(mac, alias, link_id, now);
            self.pending.remove_if_present(mac);
            self.log.info(format!("{mac} connected."), now);
            debug!(%mac, %link_id, "station admitted");
            return Decision::Admit;
        }

        let outcome = self.pending.record_attempt(mac, link_id, alias, now);
        self.log.info(
            format!("New device {mac} tried to connect and was sent to the waiting list."),
            now,
        );
        if let AttemptOutcome::New { evicted: Some(old) } = &outcome {
            debug!(evicted = %old, "waiting list full");
        }

        if let Err(e) = self.radio.force_disconnect(link_id) {
            warn!(%mac, %link_id, error = %e, "force disconnect failed");
            self.log
                .warning(format!("Could not disconnect {mac}: {e}"), now);
        }
        debug!(%mac, %link_id, denied = self.registry.is_denied(mac), "station quarantined");
        Decision::Quarantine
    }

    pub fn on_disassociate(&mut self, mac: &MacAddress, now: Instant) {
        self.log.info(format!("{mac} disconnected."), now);
        if self.connections.remove(mac).is_some() {
            debug!(%mac, "station left");
        }
    }

    // ── Administrative operations ───────────────────────────────────

    /// Allow a waiting device: onto the allow list, off the deny list and
    /// out of the waiting list.
    pub fn approve(&mut self, mac: &MacAddress, now: Instant) -> Result<Durability, CoreError> {
        let durability = self.registry.move_to(mac, ListKind::Allow)?;
        self.pending.remove_if_present(mac);
        Ok(self.record(
            durability,
            mac,
            format!("{mac} approved and added to the allow list."),
            now,
        ))
    }

    /// Block a waiting device. Same effect as [`Gate::move_to_deny`].
    pub fn block(&mut self, mac: &MacAddress, now: Instant) -> Result<Durability, CoreError> {
        self.move_to_deny(mac, now)
    }

    pub fn allow_add(&mut self, mac: &MacAddress, now: Instant) -> Result<Durability, CoreError> {
        let durability = self.registry.allow(mac)?;
        Ok(self.record(durability, mac, format!("{mac} added to the allow list."), now))
    }

    pub fn allow_remove(
        &mut self,
        mac: &MacAddress,
        now: Instant,
    ) -> Result<Durability, CoreError> {
        let durability = self.registry.remove(mac, ListKind::Allow)?;
        self.forget_alias(mac);
        Ok(self.record(
            durability,
            mac,
            format!("{mac} removed from the allow list."),
            now,
        ))
    }

    pub fn deny_add(&mut self, mac: &MacAddress, now: Instant) -> Result<Durability, CoreError> {
        let durability = self.registry.deny(mac)?;
        Ok(self.record(durability, mac, format!("{mac} added to the deny list."), now))
    }

    pub fn deny_remove(&mut self, mac: &MacAddress, now: Instant) -> Result<Durability, CoreError> {
        let durability = self.registry.remove(mac, ListKind::Deny)?;
        self.forget_alias(mac);
        Ok(self.record(
            durability,
            mac,
            format!("{mac} removed from the deny list."),
            now,
        ))
    }

    pub fn move_to_allow(
        &mut self,
        mac: &MacAddress,
        now: Instant,
    ) -> Result<Durability, CoreError> {
        let durability = self.registry.move_to(mac, ListKind::Allow)?;
        self.pending.remove_if_present(mac);
        Ok(self.record(durability, mac, format!("{mac} moved to the allow list."), now))
    }

    /// Deny an address. A live session is left alone; only the next
    /// association attempt is gated.
    pub fn move_to_deny(&mut self, mac: &MacAddress, now: Instant) -> Result<Durability, CoreError> {
        let durability = self.registry.move_to(mac, ListKind::Deny)?;
        self.pending.remove_if_present(mac);
        Ok(self.record(durability, mac, format!("{mac} moved to the deny list."), now))
    }

    /// Set or clear an alias. Live entries pick up the new label.
    pub fn set_alias(&mut self, mac: &MacAddress, alias: Option<&str>, now: Instant) -> Durability {
        let durability = self.registry.set_alias(mac, alias);
        let current = self.registry.alias(mac);
        self.pending.set_alias(mac, current.clone());
        self.connections.set_alias(mac, current);
        self.record(durability, mac, format!("Alias for {mac} changed."), now)
    }

    pub fn alias(&self, mac: &MacAddress) -> Option<String> {
        self.registry.alias(mac)
    }

    /// Kick a connected station. The entry stays until the radio reports
    /// the disassociation.
    pub fn force_disconnect(&mut self, mac: &MacAddress, now: Instant) -> Result<(), CoreError> {
        let link_id = self
            .connections
            .get(mac)
            .map(|c| c.link_id)
            .ok_or_else(|| CoreError::NotConnected { mac: mac.clone() })?;
        if let Err(e) = self.radio.force_disconnect(link_id) {
            warn!(%mac, %link_id, error = %e, "force disconnect failed");
            self.log
                .warning(format!("Could not disconnect {mac}: {e}"), now);
            return Err(e.into());
        }
        self.log
            .info(format!("{mac} was disconnected from the network."), now);
        info!(%mac, %link_id, "station disconnected by administrator");
        Ok(())
    }

    // ── Maintenance ─────────────────────────────────────────────────

    /// Expire stale waiting entries. Returns how many were dropped.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let expired = self.pending.sweep_expired(now, self.config.pending_ttl);
        if !expired.is_empty() {
            self.log
                .info(format!("Expired {} waiting device(s).", expired.len()), now);
            debug!(count = expired.len(), "waiting list swept");
        }
        expired.len()
    }

    /// Pull signal strength for connected stations from the radio.
    pub fn refresh_signal(&mut self) {
        match self.radio.signal_snapshot() {
            Ok(samples) => self.connections.refresh_signal(&samples),
            Err(e) => warn!(error = %e, "signal refresh failed"),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn snapshot(&self, now: Instant) -> GateSnapshot {
        GateSnapshot {
            allowed: self.registry.listed(ListKind::Allow),
            denied: self.registry.listed(ListKind::Deny),
            connected: self
                .connections
                .iter()
                .map(|e| ConnectedStation::from_entry(e, now))
                .collect(),
            pending: self
                .pending
                .iter()
                .map(|e| PendingStation::from_entry(e, now))
                .collect(),
            pending_sequence: self.pending.sequence(),
            log: self.log.records(now),
        }
    }

    pub fn log_records(&self, now: Instant) -> Vec<LogRecord> {
        self.log.records(now)
    }

    pub fn pending_sequence(&self) -> u64 {
        self.pending.sequence()
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn registry(&self) -> &AdmissionRegistry {
        &self.registry
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn forget_alias(&mut self, mac: &MacAddress) {
        self.pending.set_alias(mac, None);
        self.connections.set_alias(mac, None);
    }

    /// Write the success entry, plus a warning when the store lagged.
    fn record(
        &mut self,
        durability: Durability,
        mac: &MacAddress,
        message: String,
        now: Instant,
    ) -> Durability {
        self.log.info(message, now);
        if let Durability::Degraded { reason } = &durability {
            self.log
                .warning(format!("Could not save change for {mac}: {reason}"), now);
        }
        durability
    }
}
