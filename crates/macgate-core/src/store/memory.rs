// ── In-memory store ──

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use dashmap::DashMap;

use super::{ListStore, StoreError};

/// `DashMap`-backed store. Nothing survives the process; writes can be
/// made to fail on demand to exercise degraded durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, Bytes>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put`/`delete` fail (reads keep working).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "writes disabled".into(),
            });
        }
        Ok(())
    }
}

impl ListStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    fn put(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        self.check_writable()?;
        self.values.insert(key.to_owned(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete() {
        let store = MemoryStore::new();
        assert!(store.get("allow").unwrap().is_none());

        store.put("allow", Bytes::from_static(b"AA:BB:CC:DD:EE:FF")).unwrap();
        assert_eq!(
            store.get("allow").unwrap().unwrap(),
            Bytes::from_static(b"AA:BB:CC:DD:EE:FF")
        );

        store.delete("allow").unwrap();
        assert!(store.get("allow").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn failing_writes_leave_contents_untouched() {
        let store = MemoryStore::new();
        store.put("deny", Bytes::from_static(b"x")).unwrap();
        store.set_fail_writes(true);

        assert!(store.put("deny", Bytes::from_static(b"y")).is_err());
        assert!(store.delete("deny").is_err());
        assert_eq!(store.get("deny").unwrap().unwrap(), Bytes::from_static(b"x"));
    }
}
