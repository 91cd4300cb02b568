// ── Admission registry ──
//
// Owns the allow and deny sets plus the alias cache, and writes every
// change through to the `ListStore`. Store failures never undo an
// in-memory change; they come back as `Durability::Degraded`. A cleared
// alias is cached as `None` so a failed delete cannot resurface it.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Durability, ListKind, ListedAddress, MacAddress};
use crate::store::{ALLOW_KEY, DENY_KEY, ListStore, StoreError, alias_key};

// ── AddressSet ──────────────────────────────────────────────────────

/// Bounded ordered set of addresses. Linear scans; capacity is small.
#[derive(Debug)]
struct AddressSet {
    kind: ListKind,
    members: Vec<MacAddress>,
    capacity: usize,
}

impl AddressSet {
    fn new(kind: ListKind, capacity: usize) -> Self {
        Self {
            kind,
            members: Vec::new(),
            capacity,
        }
    }

    fn contains(&self, mac: &MacAddress) -> bool {
        self.members.iter().any(|m| m == mac)
    }

    fn check_insert(&self, mac: &MacAddress) -> Result<(), CoreError> {
        if self.contains(mac) {
            return Err(CoreError::AlreadyPresent {
                mac: mac.clone(),
                list: self.kind,
            });
        }
        if self.members.len() >= self.capacity {
            return Err(CoreError::CapacityExceeded {
                list: self.kind,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn remove(&mut self, mac: &MacAddress) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != mac);
        self.members.len() != before
    }

    fn key(&self) -> &'static str {
        match self.kind {
            ListKind::Allow => ALLOW_KEY,
            ListKind::Deny => DENY_KEY,
        }
    }

    fn encode(&self) -> Bytes {
        let joined = self
            .members
            .iter()
            .map(MacAddress::as_str)
            .collect::<Vec<_>>()
            .join(",");
        Bytes::from(joined)
    }

    /// Fill from a stored value, skipping anything unparseable or surplus.
    fn decode_into(&mut self, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let Ok(mac) = MacAddress::parse(token) else {
                warn!(list = %self.kind, entry = token, "skipping malformed stored address");
                continue;
            };
            if self.contains(&mac) {
                continue;
            }
            if self.members.len() >= self.capacity {
                warn!(list = %self.kind, capacity = self.capacity, "stored list exceeds capacity, truncating");
                break;
            }
            self.members.push(mac);
        }
    }
}

// ── AdmissionRegistry ───────────────────────────────────────────────

pub struct AdmissionRegistry {
    allow: AddressSet,
    deny: AddressSet,
    aliases: HashMap<MacAddress, Option<String>>,
    store: Arc<dyn ListStore>,
}

impl std::fmt::Debug for AdmissionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionRegistry")
            .field("allow", &self.allow)
            .field("deny", &self.deny)
            .field("aliases", &self.aliases.values().flatten().count())
            .finish_non_exhaustive()
    }
}

impl AdmissionRegistry {
    /// Read both lists and the aliases of their members from `store`.
    ///
    /// Unreadable keys start empty. An address stored on both lists stays
    /// denied only.
    pub fn load(store: Arc<dyn ListStore>, allow_capacity: usize, deny_capacity: usize) -> Self {
        let mut registry = Self {
            allow: AddressSet::new(ListKind::Allow, allow_capacity),
            deny: AddressSet::new(ListKind::Deny, deny_capacity),
            aliases: HashMap::new(),
            store,
        };

        for kind in [ListKind::Deny, ListKind::Allow] {
            let key = registry.set(kind).key();
            match registry.store.get(key) {
                Ok(Some(raw)) => registry.set_mut(kind).decode_into(&raw),
                Ok(None) => {}
                Err(e) => warn!(key, error = %e, "could not read stored list, starting empty"),
            }
        }

        let overlap: Vec<MacAddress> = registry
            .allow
            .members
            .iter()
            .filter(|m| registry.deny.contains(m))
            .cloned()
            .collect();
        for mac in &overlap {
            warn!(%mac, "address stored on both lists, keeping it denied");
            registry.allow.remove(mac);
        }

        let members: Vec<MacAddress> = registry
            .allow
            .members
            .iter()
            .chain(&registry.deny.members)
            .cloned()
            .collect();
        for mac in &members {
            registry.warm_alias(mac);
        }

        debug!(
            allowed = registry.allow.members.len(),
            denied = registry.deny.members.len(),
            "admission lists loaded"
        );
        registry
    }

    pub fn is_allowed(&self, mac: &MacAddress) -> bool {
        self.allow.contains(mac)
    }

    pub fn is_denied(&self, mac: &MacAddress) -> bool {
        self.deny.contains(mac)
    }

    pub fn members(&self, kind: ListKind) -> &[MacAddress] {
        &self.set(kind).members
    }

    /// Members of `kind` with their cached aliases.
    pub fn listed(&self, kind: ListKind) -> Vec<ListedAddress> {
        self.set(kind)
            .members
            .iter()
            .map(|mac| ListedAddress {
                mac: mac.clone(),
                alias: self.aliases.get(mac).cloned().flatten(),
            })
            .collect()
    }

    pub fn capacity(&self, kind: ListKind) -> usize {
        self.set(kind).capacity
    }

    /// Add to the allow list. Rejected if the address is denied.
    pub fn allow(&mut self, mac: &MacAddress) -> Result<Durability, CoreError> {
        self.add(mac, ListKind::Allow)
    }

    /// Add to the deny list. Rejected if the address is allowed.
    pub fn deny(&mut self, mac: &MacAddress) -> Result<Durability, CoreError> {
        self.add(mac, ListKind::Deny)
    }

    fn add(&mut self, mac: &MacAddress, kind: ListKind) -> Result<Durability, CoreError> {
        if self.set(kind.opposite()).contains(mac) {
            return Err(CoreError::Conflict {
                mac: mac.clone(),
                list: kind.opposite(),
            });
        }
        self.set(kind).check_insert(mac)?;
        self.set_mut(kind).members.push(mac.clone());
        self.warm_alias(mac);
        debug!(%mac, list = %kind, "address added");
        Ok(self.persist(kind))
    }

    /// Remove from `kind` and drop the stored alias.
    pub fn remove(&mut self, mac: &MacAddress, kind: ListKind) -> Result<Durability, CoreError> {
        if !self.set_mut(kind).remove(mac) {
            return Err(CoreError::NotFound {
                mac: mac.clone(),
                list: kind,
            });
        }
        debug!(%mac, list = %kind, "address removed");
        let durability = self.persist(kind);
        Ok(durability.and(self.write_alias(mac, None)))
    }

    /// Place `mac` on `dest`, taking it off the other list if needed.
    ///
    /// Succeeds from any prior state. The destination is written before
    /// the source so an interrupted move leaves the address on both lists
    /// (load resolves that as denied) rather than on neither.
    pub fn move_to(&mut self, mac: &MacAddress, dest: ListKind) -> Result<Durability, CoreError> {
        let source = dest.opposite();
        let mut durability = Durability::Persisted;

        if !self.set(dest).contains(mac) {
            self.set(dest).check_insert(mac)?;
            self.set_mut(dest).members.push(mac.clone());
            self.warm_alias(mac);
            durability = self.persist(dest);
        }
        if self.set_mut(source).remove(mac) {
            durability = durability.and(self.persist(source));
        }
        debug!(%mac, list = %dest, "address moved");
        Ok(durability)
    }

    /// Set or clear (`None` / empty) the alias for any address.
    pub fn set_alias(&mut self, mac: &MacAddress, alias: Option<&str>) -> Durability {
        let alias = alias.map(str::trim).filter(|a| !a.is_empty());
        self.write_alias(mac, alias)
    }

    /// Alias for `mac`, from the cache or read through from the store.
    pub fn alias(&self, mac: &MacAddress) -> Option<String> {
        if let Some(cached) = self.aliases.get(mac) {
            return cached.clone();
        }
        self.read_alias(mac)
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn set(&self, kind: ListKind) -> &AddressSet {
        match kind {
            ListKind::Allow => &self.allow,
            ListKind::Deny => &self.deny,
        }
    }

    fn set_mut(&mut self, kind: ListKind) -> &mut AddressSet {
        match kind {
            ListKind::Allow => &mut self.allow,
            ListKind::Deny => &mut self.deny,
        }
    }

    fn persist(&self, kind: ListKind) -> Durability {
        let set = self.set(kind);
        degrade(set.key(), self.store.put(set.key(), set.encode()))
    }

    fn write_alias(&mut self, mac: &MacAddress, alias: Option<&str>) -> Durability {
        let key = alias_key(mac);
        let result = match alias {
            Some(alias) => {
                self.aliases.insert(mac.clone(), Some(alias.to_owned()));
                self.store.put(&key, Bytes::from(alias.to_owned()))
            }
            None => {
                self.aliases.insert(mac.clone(), None);
                self.store.delete(&key)
            }
        };
        degrade(&key, result)
    }

    fn read_alias(&self, mac: &MacAddress) -> Option<String> {
        let key = alias_key(mac);
        match self.store.get(&key) {
            Ok(Some(raw)) => match String::from_utf8(raw.to_vec()) {
                Ok(alias) if !alias.is_empty() => Some(alias),
                Ok(_) => None,
                Err(_) => {
                    warn!(key = %key, "stored alias is not valid UTF-8");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "could not read alias");
                None
            }
        }
    }

    fn warm_alias(&mut self, mac: &MacAddress) {
        if self.aliases.contains_key(mac) {
            return;
        }
        if let Some(alias) = self.read_alias(mac) {
            self.aliases.insert(mac.clone(), Some(alias));
        }
    }
}

fn degrade(key: &str, result: Result<(), StoreError>) -> Durability {
    match result {
        Ok(()) => Durability::Persisted,
        Err(e) => {
            warn!(key, error = %e, "store write failed, keeping in-memory change");
            Durability::Degraded {
                reason: e.to_string(),
            }
        }
    }
}
