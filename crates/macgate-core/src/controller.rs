// ── Controller ──
//
// Runs a `Gate` on a single tokio task. Radio events, administrative
// commands and the two maintenance timers are arms of one select loop,
// so every container is touched from exactly one place.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::GateConfig;
use crate::error::CoreError;
use crate::event_log::LogRecord;
use crate::gate::Gate;
use crate::model::{Decision, Durability, GateSnapshot, LinkId, MacAddress};
use crate::radio::{Radio, RadioEvent};
use crate::store::ListStore;
use crate::stream::StateStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── RadioEvents ──────────────────────────────────────────────────

/// Non-blocking sender for driver callbacks.
///
/// Safe to call from any thread, including outside the runtime. Events
/// are applied in the order they are sent.
#[derive(Debug, Clone)]
pub struct RadioEvents {
    tx: mpsc::UnboundedSender<RadioEvent>,
}

impl RadioEvents {
    pub fn send(&self, event: RadioEvent) -> Result<(), CoreError> {
        self.tx.send(event).map_err(|_| CoreError::EngineStopped)
    }

    pub fn associated(&self, octets: [u8; 6], link_id: LinkId) -> Result<(), CoreError> {
        self.send(RadioEvent::Associated {
            mac: MacAddress::from_octets(octets),
            link_id,
        })
    }

    pub fn disassociated(&self, octets: [u8; 6]) -> Result<(), CoreError> {
        self.send(RadioEvent::Disassociated {
            mac: MacAddress::from_octets(octets),
        })
    }
}

// ── Controller ───────────────────────────────────────────────────

/// Handle to a running gate engine.
///
/// Cheaply cloneable. Dropping every clone without calling
/// [`shutdown`](Self::shutdown) also stops the engine once its channels
/// close.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    command_tx: mpsc::Sender<CommandEnvelope>,
    radio_tx: mpsc::UnboundedSender<RadioEvent>,
    state: watch::Receiver<Arc<GateSnapshot>>,
    arrivals: watch::Receiver<u64>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    /// Open the gate and spawn its engine task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: GateConfig,
        store: Arc<dyn ListStore>,
        radio: Arc<dyn Radio>,
    ) -> Result<Self, CoreError> {
        let gate = Gate::open(config, store, radio, Instant::now())?;

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (radio_tx, radio_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(Arc::new(gate.snapshot(Instant::now())));
        let (arrivals_tx, arrivals) = watch::channel(gate.pending_sequence());
        let cancel = CancellationToken::new();

        let engine = Engine {
            gate,
            commands: command_rx,
            radio_events: radio_rx,
            state_tx,
            arrivals_tx,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(engine.run());
        info!("gate engine started");

        Ok(Self {
            inner: Arc::new(ControllerInner {
                command_tx,
                radio_tx,
                state,
                arrivals,
                cancel,
                task: Mutex::new(Some(handle)),
            }),
        })
    }

    /// Start, run `f`, shut down. For single-request callers like the CLI.
    pub async fn oneshot<F, Fut, T>(
        config: GateConfig,
        store: Arc<dyn ListStore>,
        radio: Arc<dyn Radio>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let controller = Self::start(config, store, radio)?;
        let result = f(controller.clone()).await;
        controller.shutdown().await;
        result
    }

    /// Cancel the engine and wait for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "gate engine task failed");
            }
        }
        debug!("gate engine shut down");
    }

    // ── Command execution ────────────────────────────────────────

    /// Send a command to the engine and await its result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::EngineStopped);
        }

        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::EngineStopped)?;

        rx.await.map_err(|_| CoreError::EngineStopped)?
    }

    pub async fn approve(&self, mac: &str) -> Result<Durability, CoreError> {
        self.apply(Command::Approve { mac: mac.into() }).await
    }

    pub async fn block(&self, mac: &str) -> Result<Durability, CoreError> {
        self.apply(Command::Block { mac: mac.into() }).await
    }

    pub async fn allow_add(&self, mac: &str) -> Result<Durability, CoreError> {
        self.apply(Command::AllowAdd { mac: mac.into() }).await
    }

    pub async fn allow_remove(&self, mac: &str) -> Result<Durability, CoreError> {
        self.apply(Command::AllowRemove { mac: mac.into() }).await
    }

    pub async fn deny_add(&self, mac: &str) -> Result<Durability, CoreError> {
        self.apply(Command::DenyAdd { mac: mac.into() }).await
    }

    pub async fn deny_remove(&self, mac: &str) -> Result<Durability, CoreError> {
        self.apply(Command::DenyRemove { mac: mac.into() }).await
    }

    pub async fn move_to_allow(&self, mac: &str) -> Result<Durability, CoreError> {
        self.apply(Command::MoveToAllow { mac: mac.into() }).await
    }

    pub async fn move_to_deny(&self, mac: &str) -> Result<Durability, CoreError> {
        self.apply(Command::MoveToDeny { mac: mac.into() }).await
    }

    pub async fn set_alias(&self, mac: &str, alias: Option<&str>) -> Result<Durability, CoreError> {
        self.apply(Command::SetAlias {
            mac: mac.into(),
            alias: alias.map(str::to_owned),
        })
        .await
    }

    pub async fn get_alias(&self, mac: &str) -> Result<Option<String>, CoreError> {
        match self.execute(Command::GetAlias { mac: mac.into() }).await? {
            CommandResult::Alias(alias) => Ok(alias),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn force_disconnect(&self, mac: &str) -> Result<(), CoreError> {
        match self
            .execute(Command::ForceDisconnect { mac: mac.into() })
            .await?
        {
            CommandResult::Ok => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Run the waiting-list sweep now instead of on the next tick.
    pub async fn sweep(&self) -> Result<usize, CoreError> {
        match self.execute(Command::Sweep).await? {
            CommandResult::Swept(n) => Ok(n),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn query_state(&self) -> Result<Arc<GateSnapshot>, CoreError> {
        match self.execute(Command::QueryState).await? {
            CommandResult::State(snap) => Ok(snap),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn query_log(&self) -> Result<Vec<LogRecord>, CoreError> {
        match self.execute(Command::QueryLog).await? {
            CommandResult::Log(records) => Ok(records),
            other => Err(unexpected(&other)),
        }
    }

    async fn apply(&self, cmd: Command) -> Result<Durability, CoreError> {
        match self.execute(cmd).await? {
            CommandResult::Applied(durability) => Ok(durability),
            other => Err(unexpected(&other)),
        }
    }

    // ── Observation ──────────────────────────────────────────────

    /// Sender for driver callbacks.
    pub fn radio_events(&self) -> RadioEvents {
        RadioEvents {
            tx: self.inner.radio_tx.clone(),
        }
    }

    /// Snapshots published after every processed message.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.inner.state.clone())
    }

    /// Waiting-list arrival counter. Changes only when a new address is
    /// queued; compare with the last value seen.
    pub fn subscribe_arrivals(&self) -> watch::Receiver<u64> {
        self.inner.arrivals.clone()
    }

    /// Last published snapshot, without a round trip to the engine.
    pub fn snapshot(&self) -> Arc<GateSnapshot> {
        self.inner.state.borrow().clone()
    }
}

fn unexpected(result: &CommandResult) -> CoreError {
    CoreError::Internal(format!("unexpected command result: {result:?}"))
}

// ── Engine task ──────────────────────────────────────────────────

struct Engine {
    gate: Gate,
    commands: mpsc::Receiver<CommandEnvelope>,
    radio_events: mpsc::UnboundedReceiver<RadioEvent>,
    state_tx: watch::Sender<Arc<GateSnapshot>>,
    arrivals_tx: watch::Sender<u64>,
    cancel: CancellationToken,
}

impl Engine {
    async fn run(mut self) {
        let mut sweep = tokio::time::interval(self.gate.config().sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        sweep.tick().await; // consume the immediate first tick

        let mut signal = tokio::time::interval(self.gate.config().signal_refresh_interval);
        signal.set_missed_tick_behavior(MissedTickBehavior::Delay);
        signal.tick().await;

        loop {
            // Radio events are polled last so a burst of associations
            // cannot hold back commands or the timers.
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                envelope = self.commands.recv() => {
                    let Some(envelope) = envelope else { break };
                    self.drain_queued_radio_events();
                    let result = route_command(&mut self.gate, envelope.command);
                    let _ = envelope.response_tx.send(result);
                }
                _ = sweep.tick() => {
                    self.gate.sweep(Instant::now());
                }
                _ = signal.tick() => {
                    self.gate.refresh_signal();
                }
                event = self.radio_events.recv() => {
                    let Some(event) = event else { break };
                    self.on_radio_event(event);
                }
            }
            self.publish();
        }

        debug!("gate engine loop exited");
    }

    /// Apply the radio events already queued when a command arrives, so
    /// a command observes every event sent before it.
    fn drain_queued_radio_events(&mut self) {
        for _ in 0..self.radio_events.len() {
            match self.radio_events.try_recv() {
                Ok(event) => self.on_radio_event(event),
                Err(_) => break,
            }
        }
    }

    fn on_radio_event(&mut self, event: RadioEvent) {
        let now = Instant::now();
        match event {
            RadioEvent::Associated { mac, link_id } => {
                let decision = self.gate.on_associate(&mac, link_id, now);
                if decision == Decision::Quarantine {
                    info!(%mac, %link_id, "station sent to waiting list");
                }
            }
            RadioEvent::Disassociated { mac } => self.gate.on_disassociate(&mac, now),
        }
    }

    fn publish(&self) {
        let snapshot = self.gate.snapshot(Instant::now());
        self.state_tx.send_replace(Arc::new(snapshot));

        let sequence = self.gate.pending_sequence();
        self.arrivals_tx.send_if_modified(|seen| {
            if *seen == sequence {
                return false;
            }
            *seen = sequence;
            true
        });
    }
}

/// Normalize the address argument and apply one command.
fn route_command(gate: &mut Gate, command: Command) -> Result<CommandResult, CoreError> {
    let now = Instant::now();
    let applied = |r: Result<Durability, CoreError>| r.map(CommandResult::Applied);

    match command {
        Command::Approve { mac } => applied(gate.approve(&MacAddress::parse(mac)?, now)),
        Command::Block { mac } => applied(gate.block(&MacAddress::parse(mac)?, now)),
        Command::AllowAdd { mac } => applied(gate.allow_add(&MacAddress::parse(mac)?, now)),
        Command::AllowRemove { mac } => {
            applied(gate.allow_remove(&MacAddress::parse(mac)?, now))
        }
        Command::DenyAdd { mac } => applied(gate.deny_add(&MacAddress::parse(mac)?, now)),
        Command::DenyRemove { mac } => applied(gate.deny_remove(&MacAddress::parse(mac)?, now)),
        Command::MoveToAllow { mac } => {
            applied(gate.move_to_allow(&MacAddress::parse(mac)?, now))
        }
        Command::MoveToDeny { mac } => applied(gate.move_to_deny(&MacAddress::parse(mac)?, now)),
        Command::SetAlias { mac, alias } => {
            let mac = MacAddress::parse(mac)?;
            Ok(CommandResult::Applied(gate.set_alias(
                &mac,
                alias.as_deref(),
                now,
            )))
        }
        Command::GetAlias { mac } => Ok(CommandResult::Alias(
            gate.alias(&MacAddress::parse(mac)?),
        )),
        Command::ForceDisconnect { mac } => {
            gate.force_disconnect(&MacAddress::parse(mac)?, now)?;
            Ok(CommandResult::Ok)
        }
        Command::Sweep => Ok(CommandResult::Swept(gate.sweep(now))),
        Command::QueryState => Ok(CommandResult::State(Arc::new(gate.snapshot(now)))),
        Command::QueryLog => Ok(CommandResult::Log(gate.log_records(now))),
    }
}
