// macgate-core: MAC admission engine for a WiFi access point.
//
// Decides on every association whether a station is admitted or sent to
// a waiting list for an administrator, keeps the allow/deny lists durable
// through a `ListStore`, and publishes its state as `GateSnapshot`s.

pub mod command;
pub mod config;
pub mod connections;
pub mod controller;
pub mod error;
pub mod event_log;
pub mod gate;
pub mod model;
pub mod pending;
pub mod radio;
pub mod registry;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{BootstrapDevice, GateConfig};
pub use controller::{Controller, RadioEvents};
pub use error::CoreError;
pub use event_log::{LogLevel, LogRecord};
pub use gate::Gate;
pub use radio::{LoopbackRadio, Radio, RadioError, RadioEvent, SignalSample};
pub use store::{FileStore, ListStore, MemoryStore, StoreError};
pub use stream::StateStream;

pub use model::{
    ConnectedStation, Decision, Durability, GateSnapshot, LinkId, ListKind, ListedAddress,
    MacAddress, PendingStation, normalize,
};
