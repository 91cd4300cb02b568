// ── Radio collaborator interface ──
//
// The driver side of the access point: the engine asks it to kick a link
// and to report signal strength, and it pushes association events into
// the engine through `RadioEvents` (see `controller`).

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{LinkId, MacAddress};

#[derive(Debug, Error)]
pub enum RadioError {
    #[error("Radio driver error: {0}")]
    Driver(String),
}

/// One entry of a signal-strength report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSample {
    pub mac: MacAddress,
    pub signal_dbm: i8,
}

/// Association events delivered by the radio, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    Associated { mac: MacAddress, link_id: LinkId },
    Disassociated { mac: MacAddress },
}

/// Driver primitives the engine calls. Both are bounded and never retried.
pub trait Radio: Send + Sync {
    fn force_disconnect(&self, link_id: LinkId) -> Result<(), RadioError>;

    fn signal_snapshot(&self) -> Result<Vec<SignalSample>, RadioError>;
}

// ── LoopbackRadio ────────────────────────────────────────────────

/// In-process radio that records disconnect requests and serves a
/// settable signal report. Backs the CLI simulator and tests.
#[derive(Debug, Default)]
pub struct LoopbackRadio {
    state: Mutex<LoopbackState>,
}

#[derive(Debug, Default)]
struct LoopbackState {
    disconnects: Vec<LinkId>,
    signals: Vec<SignalSample>,
    failing: bool,
}

impl LoopbackRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link ids passed to `force_disconnect`, oldest first.
    pub fn disconnects(&self) -> Vec<LinkId> {
        self.lock().disconnects.clone()
    }

    pub fn set_signals(&self, samples: Vec<SignalSample>) {
        self.lock().signals = samples;
    }

    /// Make every subsequent driver call fail.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LoopbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Radio for LoopbackRadio {
    fn force_disconnect(&self, link_id: LinkId) -> Result<(), RadioError> {
        let mut state = self.lock();
        if state.failing {
            return Err(RadioError::Driver("deauth rejected".into()));
        }
        state.disconnects.push(link_id);
        Ok(())
    }

    fn signal_snapshot(&self) -> Result<Vec<SignalSample>, RadioError> {
        let state = self.lock();
        if state.failing {
            return Err(RadioError::Driver("station list unavailable".into()));
        }
        Ok(state.signals.clone())
    }
}
