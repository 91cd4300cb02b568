#![allow(clippy::unwrap_used)]
// Integration tests for `Controller` driving the engine task end to end,
// with an in-memory store, a loopback radio and paused tokio time.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;

use macgate_core::{
    BootstrapDevice, Command, CommandResult, Controller, CoreError, Durability, GateConfig,
    LinkId, ListStore, LoopbackRadio, MacAddress, MemoryStore, Radio, SignalSample,
};

// ── Helpers ─────────────────────────────────────────────────────────

const PHONE: [u8; 6] = [0x3C, 0x22, 0xFB, 0x10, 0x20, 0x30];
const STRANGER: [u8; 6] = [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01];

struct Setup {
    controller: Controller,
    store: Arc<MemoryStore>,
    radio: Arc<LoopbackRadio>,
}

fn start(config: GateConfig) -> Setup {
    let store = Arc::new(MemoryStore::new());
    let radio = Arc::new(LoopbackRadio::new());
    let controller = Controller::start(
        config,
        Arc::clone(&store) as Arc<dyn ListStore>,
        Arc::clone(&radio) as Arc<dyn Radio>,
    )
    .unwrap();
    Setup {
        controller,
        store,
        radio,
    }
}

fn mac(octets: [u8; 6]) -> MacAddress {
    MacAddress::from_octets(octets)
}

// ── Gating ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_unknown_station_goes_to_waiting_list() {
    let s = start(GateConfig::default());
    s.controller
        .radio_events()
        .associated(STRANGER, LinkId(4))
        .unwrap();

    let state = s.controller.query_state().await.unwrap();
    assert!(state.pending_entry(&mac(STRANGER)).is_some());
    assert!(state.connected.is_empty());
    assert_eq!(state.pending_sequence, 1);
    assert_eq!(s.radio.disconnects(), vec![LinkId(4)]);

    s.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_command_sees_every_event_queued_before_it() {
    let s = start(GateConfig::default());
    let events = s.controller.radio_events();
    for n in 0..300u16 {
        let [hi, lo] = n.to_be_bytes();
        events
            .associated([0xDE, 0xAD, 0x00, 0x00, hi, lo], LinkId(n))
            .unwrap();
    }

    let approved = s.controller.approve("de:ad:00:00:01:2b").await.unwrap();
    assert_eq!(approved, Durability::Persisted);

    let state = s.controller.query_state().await.unwrap();
    assert_eq!(state.pending_sequence, 300);
    assert_eq!(state.pending.len(), 127);
    assert!(state.pending_entry(&mac([0xDE, 0xAD, 0, 0, 0x01, 0x2B])).is_none());
    assert_eq!(s.radio.disconnects().len(), 300);

    s.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_approve_then_reassociate_admits() {
    let s = start(GateConfig::default());
    let events = s.controller.radio_events();
    events.associated(STRANGER, LinkId(1)).unwrap();

    let durability = s.controller.approve("de:ad:be:ef:00:01").await.unwrap();
    assert_eq!(durability, Durability::Persisted);

    events.associated(STRANGER, LinkId(2)).unwrap();
    let state = s.controller.query_state().await.unwrap();
    assert!(state.is_allowed(&mac(STRANGER)));
    assert!(state.pending.is_empty());
    assert_eq!(
        state.connected_entry(&mac(STRANGER)).unwrap().link_id,
        LinkId(2)
    );
    assert_eq!(s.radio.disconnects(), vec![LinkId(1)]);

    s.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_move_to_deny_keeps_session_but_gates_next_attempt() {
    let s = start(GateConfig::default());
    let events = s.controller.radio_events();
    s.controller.allow_add("3C22FB102030").await.unwrap();
    events.associated(PHONE, LinkId(7)).unwrap();

    s.controller.move_to_deny("3c-22-fb-10-20-30").await.unwrap();
    let state = s.controller.query_state().await.unwrap();
    assert!(state.is_denied(&mac(PHONE)));
    assert!(state.connected_entry(&mac(PHONE)).is_some());

    events.disassociated(PHONE).unwrap();
    events.associated(PHONE, LinkId(8)).unwrap();
    let state = s.controller.query_state().await.unwrap();
    assert!(state.connected.is_empty());
    assert!(state.pending_entry(&mac(PHONE)).is_some());
    assert_eq!(s.radio.disconnects(), vec![LinkId(8)]);

    s.controller.shutdown().await;
}

// ── Administrative surface ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_invalid_mac_is_rejected_without_log_entry() {
    let s = start(GateConfig::default());
    let before = s.controller.query_log().await.unwrap().len();

    let err = s.controller.allow_add("AA:BB:CC").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidFormat { .. }));
    assert_eq!(s.controller.query_log().await.unwrap().len(), before);

    s.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_aliases_round_trip_through_store() {
    let s = start(GateConfig::default());
    s.controller
        .set_alias("3C:22:FB:10:20:30", Some("Hall phone"))
        .await
        .unwrap();
    assert_eq!(
        s.controller.get_alias("3c22fb102030").await.unwrap().as_deref(),
        Some("Hall phone")
    );
    assert!(s.store.get("alias/3C:22:FB:10:20:30").unwrap().is_some());

    s.controller.set_alias("3C:22:FB:10:20:30", None).await.unwrap();
    assert_eq!(s.controller.get_alias("3C:22:FB:10:20:30").await.unwrap(), None);

    s.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_degraded_store_still_applies_change() {
    let s = start(GateConfig::default());
    s.store.set_fail_writes(true);

    let durability = s.controller.deny_add("DE:AD:BE:EF:00:01").await.unwrap();
    assert!(matches!(durability, Durability::Degraded { .. }));

    let state = s.controller.query_state().await.unwrap();
    assert!(state.is_denied(&mac(STRANGER)));
    assert!(
        state
            .log
            .iter()
            .any(|r| r.message.starts_with("Could not save change"))
    );

    s.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_force_disconnect_requires_connected_station() {
    let s = start(GateConfig::default());
    let err = s
        .controller
        .force_disconnect("3C:22:FB:10:20:30")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotConnected { .. }));

    s.controller.allow_add("3C:22:FB:10:20:30").await.unwrap();
    s.controller
        .radio_events()
        .associated(PHONE, LinkId(3))
        .unwrap();
    s.controller
        .force_disconnect("3C:22:FB:10:20:30")
        .await
        .unwrap();
    assert_eq!(s.radio.disconnects(), vec![LinkId(3)]);

    s.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_execute_returns_typed_results() {
    let s = start(GateConfig::default());
    let result = s
        .controller
        .execute(Command::GetAlias {
            mac: "DE:AD:BE:EF:00:01".into(),
        })
        .await
        .unwrap();
    assert_eq!(result, CommandResult::Alias(None));

    let result = s.controller.execute(Command::Sweep).await.unwrap();
    assert_eq!(result, CommandResult::Swept(0));

    s.controller.shutdown().await;
}

// ── Timers ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_periodic_sweep_expires_waiting_devices() {
    let s = start(GateConfig::default());
    s.controller
        .radio_events()
        .associated(STRANGER, LinkId(1))
        .unwrap();
    assert_eq!(s.controller.query_state().await.unwrap().pending.len(), 1);

    tokio::time::advance(Duration::from_secs(301)).await;
    tokio::time::sleep(Duration::from_secs(6)).await;

    let state = s.controller.query_state().await.unwrap();
    assert!(state.pending.is_empty());
    assert!(
        state
            .log
            .iter()
            .any(|r| r.message == "Expired 1 waiting device(s).")
    );

    s.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_signal_refresh_runs_on_its_timer() {
    let s = start(GateConfig::default());
    s.controller.allow_add("3C:22:FB:10:20:30").await.unwrap();
    s.controller
        .radio_events()
        .associated(PHONE, LinkId(1))
        .unwrap();
    s.radio.set_signals(vec![SignalSample {
        mac: mac(PHONE),
        signal_dbm: -55,
    }]);

    tokio::time::sleep(Duration::from_secs(3)).await;
    let state = s.controller.query_state().await.unwrap();
    assert_eq!(state.connected_entry(&mac(PHONE)).unwrap().signal_dbm, -55);

    s.controller.shutdown().await;
}

// ── Observation ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_arrival_counter_is_edge_triggered() {
    let s = start(GateConfig::default());
    let mut arrivals = s.controller.subscribe_arrivals();
    let events = s.controller.radio_events();

    events.associated(STRANGER, LinkId(1)).unwrap();
    arrivals.changed().await.unwrap();
    assert_eq!(*arrivals.borrow_and_update(), 1);

    events.associated(STRANGER, LinkId(2)).unwrap();
    s.controller.query_state().await.unwrap();
    assert!(!arrivals.has_changed().unwrap());

    s.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_state_stream_publishes_after_events() {
    let s = start(GateConfig::default());
    let mut states = s.controller.subscribe();
    assert!(states.current().pending.is_empty());

    s.controller
        .radio_events()
        .associated(STRANGER, LinkId(1))
        .unwrap();
    let snap = states.changed().await.unwrap();
    assert_eq!(snap.pending.len(), 1);

    let mut stream = s.controller.subscribe().into_stream();
    let first = stream.next().await.unwrap();
    assert_eq!(first.pending.len(), 1);

    s.controller.shutdown().await;
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_bootstrap_and_start_entries() {
    let config = GateConfig {
        bootstrap: vec![BootstrapDevice {
            mac: "3c:22:fb:10:20:30".into(),
            alias: Some("My Laptop".into()),
        }],
        ..GateConfig::default()
    };
    let s = start(config);

    let log = s.controller.query_log().await.unwrap();
    let messages: Vec<_> = log.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(
        messages,
        [
            "3C:22:FB:10:20:30 added to the allow list by default.",
            "System started."
        ]
    );
    assert_eq!(
        s.controller.get_alias("3C:22:FB:10:20:30").await.unwrap().as_deref(),
        Some("My Laptop")
    );

    s.controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_commands_after_shutdown_fail() {
    let s = start(GateConfig::default());
    s.controller.shutdown().await;
    let err = s.controller.query_state().await.unwrap_err();
    assert!(matches!(err, CoreError::EngineStopped));
}

#[tokio::test(start_paused = true)]
async fn test_oneshot_runs_closure_and_stops() {
    let store = Arc::new(MemoryStore::new());
    let allowed = Controller::oneshot(
        GateConfig::default(),
        Arc::clone(&store) as Arc<dyn ListStore>,
        Arc::new(LoopbackRadio::new()),
        |controller| async move {
            controller.allow_add("3C:22:FB:10:20:30").await?;
            Ok(controller.query_state().await?.allowed.len())
        },
    )
    .await
    .unwrap();
    assert_eq!(allowed, 1);
    assert!(store.get("allow").unwrap().is_some());
}
