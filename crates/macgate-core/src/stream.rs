// ── Reactive state stream ──
//
// Subscription handle over the engine's published snapshots.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::GateSnapshot;

/// A subscription to gate state.
///
/// Holds the snapshot seen at creation and can wait for newer ones, or be
/// turned into a `Stream`.
pub struct StateStream {
    current: Arc<GateSnapshot>,
    receiver: watch::Receiver<Arc<GateSnapshot>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<GateSnapshot>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or at the last `changed`).
    pub fn current(&self) -> &Arc<GateSnapshot> {
        &self.current
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> Arc<GateSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publication. `None` once the engine has stopped.
    pub async fn changed(&mut self) -> Option<Arc<GateSnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    pub fn into_stream(self) -> StateWatchStream {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding every published snapshot, starting with the
/// current one.
pub struct StateWatchStream {
    inner: WatchStream<Arc<GateSnapshot>>,
}

impl Stream for StateWatchStream {
    type Item = Arc<GateSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
