// ── Persistent list store ──
//
// The durable key/value collaborator behind the admission lists. The
// engine only needs get/put/delete; byte layout inside a value is owned
// by the registry (comma-separated addresses, UTF-8 aliases).

mod file;
mod memory;

use bytes::Bytes;
use thiserror::Error;

use crate::model::MacAddress;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key holding the serialized allow list.
pub const ALLOW_KEY: &str = "allow";
/// Key holding the serialized deny list.
pub const DENY_KEY: &str = "deny";

/// Key holding the alias for one address.
pub fn alias_key(mac: &MacAddress) -> String {
    format!("alias/{mac}")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("value for '{key}' is not valid UTF-8")]
    Encoding { key: String },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Durable string-keyed byte store.
///
/// Calls are synchronous and bounded. Implementations must make `put`
/// and `delete` durable before returning `Ok`.
pub trait ListStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    fn put(&self, key: &str, value: Bytes) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;
}
