//! SyncSession - the driver for one sync session.
//!
//! This module provides [`SyncSession`], the object whatever layer owns
//! activation (a focused screen, a headless test) starts and stops.
//!
//! # Architecture
//!
//! SyncSession uses the pure registry and lifecycle from sync-core and
//! interprets the lifecycle's actions as real tokio timers.
//!
//! ```text
//! ProgressSource → SyncSession task → watch channel → subscribers
//!                        ↓
//!              sync-core (registry, aggregate, lifecycle)
//! ```
//!
//! While running, a single spawned task owns the registry and lifecycle
//! and is the only thing that mutates them. It waits on three things:
//! the shutdown signal, the discovery window, and the tick interval.
//! Snapshots are published through a `watch` channel, so readers always
//! see the latest value and never hold the driver up.

use std::future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use peersync_core::{
    DiscoveryLifecycle, LifecycleAction, LifecycleEvent, PeerRegistry, DEFAULT_DISCOVERY_WINDOW,
};
use peersync_types::{AggregateProgress, DiscoveryState, SyncSnapshot};
use thiserror::Error;
use tokio::sync::{oneshot, watch, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior, Sleep};
use tracing::{debug, error, info, trace, warn};

use crate::source::ProgressSource;

/// Tick interval used when none is configured.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration rejected by [`SessionConfig::validate`].
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Configuration for SyncSession.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time between ticks.
    pub tick_interval: Duration,
    /// How long to search before declaring peers found or idle.
    pub discovery_window: Duration,
}

impl SessionConfig {
    /// Set the tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the discovery window.
    pub fn with_discovery_window(mut self, window: Duration) -> Self {
        self.discovery_window = window;
        self
    }

    /// Validate the configuration.
    ///
    /// Returns an error if either duration is zero.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.tick_interval.is_zero() {
            return Err(SessionError::InvalidConfig(
                "tick_interval must be greater than zero".to_string(),
            ));
        }
        if self.discovery_window.is_zero() {
            return Err(SessionError::InvalidConfig(
                "discovery_window must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            discovery_window: DEFAULT_DISCOVERY_WINDOW,
        }
    }
}

/// State owned by the session timeline.
struct SessionCore<S> {
    registry: PeerRegistry,
    lifecycle: DiscoveryLifecycle,
    source: S,
    ticks: u64,
}

impl<S: ProgressSource> SessionCore<S> {
    fn handle(&mut self, event: LifecycleEvent) -> Vec<LifecycleAction> {
        let lifecycle = std::mem::take(&mut self.lifecycle);
        let (lifecycle, actions) = lifecycle.on_event(event);
        self.lifecycle = lifecycle;

        for action in &actions {
            if let LifecycleAction::StateChanged { from, to } = action {
                debug!(%from, %to, peers = self.registry.count(), "discovery state changed");
            }
        }
        actions
    }

    fn snapshot(&self) -> SyncSnapshot {
        let state = self.lifecycle.state();
        let peers = if state.presents_peers() {
            self.registry.list_all().cloned().collect()
        } else {
            Vec::new()
        };
        SyncSnapshot {
            tick: self.ticks,
            state,
            progress: self.registry.aggregate(),
            peers,
        }
    }

    async fn tick(&mut self) -> SyncSnapshot {
        self.ticks += 1;
        self.ingest().await;

        let snapshot = self.snapshot();
        trace!(
            tick = snapshot.tick,
            state = %snapshot.state,
            percentage = snapshot.progress.percentage,
            peers = snapshot.progress.peer_count,
            "tick"
        );
        snapshot
    }

    /// Poll the source once and apply whatever it reports.
    async fn ingest(&mut self) {
        match self.source.poll(&self.registry).await {
            Ok(inputs) => {
                for input in inputs {
                    let id = input.peer_id().clone();
                    let change = self.registry.apply(input);
                    trace!(peer = %id, ?change, "applied input");
                }
            }
            // A failed poll still publishes what the registry holds now.
            Err(e) => warn!(tick = self.ticks, error = %e, "progress source poll failed"),
        }
    }
}

/// Discovery window timer armed under one lifecycle epoch.
struct WindowTimer {
    epoch: u64,
    sleep: Pin<Box<Sleep>>,
}

impl WindowTimer {
    fn from_actions(actions: &[LifecycleAction]) -> Option<Self> {
        actions.iter().find_map(|action| match action {
            LifecycleAction::StartWindowTimer { epoch, window } => Some(Self {
                epoch: *epoch,
                sleep: Box::pin(time::sleep(*window)),
            }),
            _ => None,
        })
    }
}

/// Resolve with the timer's epoch once it fires; never resolve without one.
async fn window_elapsed(timer: &mut Option<WindowTimer>) -> u64 {
    match timer {
        Some(timer) => {
            timer.sleep.as_mut().await;
            timer.epoch
        }
        None => future::pending().await,
    }
}

fn changes_state(actions: &[LifecycleAction]) -> bool {
    actions
        .iter()
        .any(|action| matches!(action, LifecycleAction::StateChanged { .. }))
}

fn cancels(actions: &[LifecycleAction], timer: &Option<WindowTimer>) -> bool {
    timer.as_ref().is_some_and(|timer| {
        actions.iter().any(|action| {
            matches!(action, LifecycleAction::CancelWindowTimer { epoch } if *epoch == timer.epoch)
        })
    })
}

struct Running {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Driver for one sync session.
///
/// Owns the peer registry, the discovery lifecycle and the source. State
/// survives `stop`/`start` cycles except the lifecycle, which restarts at
/// `Searching` every time. Independent sessions share nothing.
///
/// `start`, `subscribe` and `watch` consumers must run inside a tokio
/// runtime.
pub struct SyncSession<S> {
    config: SessionConfig,
    core: Arc<Mutex<SessionCore<S>>>,
    snapshots: Arc<watch::Sender<SyncSnapshot>>,
    running: Option<Running>,
}

impl<S: ProgressSource + 'static> SyncSession<S> {
    /// Create a stopped session.
    pub fn new(config: SessionConfig, source: S) -> Result<Self, SessionError> {
        config.validate()?;
        let core = SessionCore {
            registry: PeerRegistry::new(),
            lifecycle: DiscoveryLifecycle::new(config.discovery_window),
            source,
            ticks: 0,
        };
        let (snapshots, _) = watch::channel(SyncSnapshot::default());
        Ok(Self {
            config,
            core: Arc::new(Mutex::new(core)),
            snapshots: Arc::new(snapshots),
            running: None,
        })
    }

    /// Begin the session: reset discovery to `Searching` and start ticking.
    ///
    /// The `Searching` snapshot is published before this returns. Calling
    /// `start` on a running session does nothing.
    pub async fn start(&mut self) {
        if self.is_running() {
            debug!("session already running");
            return;
        }
        // A task that ended on its own (panic) still needs reaping.
        self.stop().await;

        let mut core = Arc::clone(&self.core).lock_owned().await;
        let actions = core.handle(LifecycleEvent::SessionStarted);
        let window = WindowTimer::from_actions(&actions);
        self.snapshots.send_replace(core.snapshot());

        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(
            core,
            window,
            self.config.tick_interval,
            Arc::clone(&self.snapshots),
            shutdown_rx,
        ));
        self.running = Some(Running { shutdown, task });

        info!(
            tick_interval = ?self.config.tick_interval,
            discovery_window = ?self.config.discovery_window,
            "sync session started"
        );
    }

    /// End the session: halt ticking and cancel any pending discovery window.
    ///
    /// Returns once the task has exited, so nothing mutates the session
    /// afterwards. Calling `stop` on a stopped session does nothing.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        // The task may already be gone; that is fine.
        let _ = running.shutdown.send(());
        match running.task.await {
            Ok(()) => info!("sync session stopped"),
            Err(e) if e.is_panic() => error!("sync session task panicked"),
            Err(e) => warn!(error = %e, "sync session task ended abnormally"),
        }
    }
}

impl<S> SyncSession<S> {
    /// Whether the tick loop is active.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// The session's configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Latest published discovery state.
    pub fn state(&self) -> DiscoveryState {
        self.snapshots.borrow().state
    }

    /// Latest published aggregate progress.
    pub fn progress(&self) -> AggregateProgress {
        self.snapshots.borrow().progress
    }

    /// Receiver that observes every snapshot published from now on.
    pub fn watch(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshots.subscribe()
    }

    /// Invoke `callback` with each snapshot published from now on.
    ///
    /// The callback runs on its own task. If it is slower than the tick
    /// interval, intermediate snapshots are skipped and it receives the
    /// latest one next; the driver never waits for it. Delivery stops when
    /// the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(&SyncSnapshot) + Send + 'static,
    {
        let mut rx = self.snapshots.subscribe();
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                callback(&snapshot);
            }
        });
        Subscription { task }
    }
}

impl<S> Drop for SyncSession<S> {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
        }
    }
}

/// Handle for a callback registered with [`SyncSession::subscribe`].
///
/// Dropping it stops delivery.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stop delivery now.
    pub fn unsubscribe(self) {}

    /// Whether delivery has ended (session dropped or callback panicked).
    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The session timeline. Holds the core lock until shutdown.
async fn run<S: ProgressSource>(
    mut core: OwnedMutexGuard<SessionCore<S>>,
    mut window: Option<WindowTimer>,
    tick_interval: Duration,
    snapshots: Arc<watch::Sender<SyncSnapshot>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = time::interval_at(Instant::now() + tick_interval, tick_interval);
    // A late tick reads current state; missed ticks are not replayed.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,

            epoch = window_elapsed(&mut window) => {
                window = None;
                // Whatever the source holds at the deadline counts toward it.
                core.ingest().await;
                let peer_count = core.registry.count();
                let actions = core.handle(LifecycleEvent::WindowElapsed { epoch, peer_count });
                if changes_state(&actions) {
                    snapshots.send_replace(core.snapshot());
                }
            }

            _ = ticker.tick() => {
                let snapshot = core.tick().await;
                snapshots.send_replace(snapshot);
            }
        }
    }

    let actions = core.handle(LifecycleEvent::SessionStopped);
    if cancels(&actions, &window) {
        debug!("discovery window cancelled by teardown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{channel, MockSource, SimulatedSource};
    use peersync_types::{PeerId, ProgressUpdate, SyncInput};
    use std::sync::Mutex as StdMutex;

    const TICK: Duration = Duration::from_millis(100);
    const WINDOW: Duration = Duration::from_millis(3000);

    fn config() -> SessionConfig {
        SessionConfig::default()
            .with_tick_interval(TICK)
            .with_discovery_window(WINDOW)
    }

    fn appeared(id: &str) -> SyncInput {
        SyncInput::PeerAppeared {
            id: PeerId::from(id),
            name: None,
        }
    }

    fn progress(id: &str, has: i64, wants: i64) -> SyncInput {
        SyncInput::Progress(ProgressUpdate::Snapshot {
            id: PeerId::from(id),
            has,
            wants,
        })
    }

    // ===========================================
    // Configuration
    // ===========================================

    #[test]
    fn default_config_uses_production_intervals() {
        let config = SessionConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(500));
        assert_eq!(config.discovery_window, Duration::from_millis(3000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_durations_are_rejected() {
        let zero_tick = SessionConfig::default().with_tick_interval(Duration::ZERO);
        assert!(matches!(
            SyncSession::new(zero_tick, MockSource::new()),
            Err(SessionError::InvalidConfig(_))
        ));

        let zero_window = SessionConfig::default().with_discovery_window(Duration::ZERO);
        assert!(zero_window.validate().is_err());
    }

    // ===========================================
    // Discovery lifecycle
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn start_publishes_searching_immediately() {
        let mut session = SyncSession::new(config(), MockSource::new()).unwrap();
        session.start().await;

        assert!(session.is_running());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, DiscoveryState::Searching);
        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.progress, AggregateProgress::EMPTY);

        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_window_ends_idle_and_stays_idle() {
        let mut session = SyncSession::new(config(), MockSource::new()).unwrap();
        session.start().await;

        time::sleep(WINDOW - TICK / 2).await;
        assert_eq!(session.state(), DiscoveryState::Searching);

        time::sleep(TICK * 2).await;
        assert_eq!(session.state(), DiscoveryState::Idle);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(session.state(), DiscoveryState::Idle);

        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn peer_during_window_ends_peers_found() {
        let source = MockSource::new();
        source.queue_batch(vec![appeared("a"), progress("a", 2, 10)]);

        let mut session = SyncSession::new(config(), source).unwrap();
        session.start().await;

        time::sleep(TICK + TICK / 2).await;
        let searching = session.snapshot();
        assert_eq!(searching.state, DiscoveryState::Searching);
        assert_eq!(searching.progress.peer_count, 1);
        assert!(searching.peers.is_empty(), "peers hidden while searching");

        time::sleep(WINDOW).await;
        let found = session.snapshot();
        assert_eq!(found.state, DiscoveryState::PeersFound);
        assert_eq!(found.peers.len(), 1);
        assert_eq!(found.progress.percentage, 20);

        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_window_suppresses_transition() {
        let source = MockSource::new();
        source.queue_batch(vec![appeared("a")]);

        let mut session = SyncSession::new(config(), source.clone()).unwrap();
        session.start().await;
        time::sleep(Duration::from_millis(1000)).await;
        session.stop().await;
        assert!(!session.is_running());

        let polls = source.poll_count();
        time::sleep(WINDOW * 3).await;

        assert_eq!(session.state(), DiscoveryState::Searching);
        assert_eq!(source.poll_count(), polls, "no ticks after teardown");
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_to_searching_and_keeps_peers() {
        let source = MockSource::new();
        source.queue_batch(vec![appeared("a")]);

        let mut session = SyncSession::new(config(), source).unwrap();
        session.start().await;
        time::sleep(WINDOW + TICK).await;
        assert_eq!(session.state(), DiscoveryState::PeersFound);
        session.stop().await;

        session.start().await;
        assert_eq!(session.state(), DiscoveryState::Searching);
        assert_eq!(session.progress().peer_count, 1);

        time::sleep(WINDOW + TICK).await;
        assert_eq!(session.state(), DiscoveryState::PeersFound);
        session.stop().await;
    }

    fn long_tick_config(tick: Duration) -> SessionConfig {
        SessionConfig::default()
            .with_tick_interval(tick)
            .with_discovery_window(WINDOW)
    }

    #[tokio::test(start_paused = true)]
    async fn tick_coinciding_with_window_still_finds_peers() {
        let source = MockSource::new();
        source.queue_batch(vec![appeared("a")]);

        let mut session = SyncSession::new(long_tick_config(WINDOW), source).unwrap();
        session.start().await;

        time::sleep(WINDOW + Duration::from_millis(10)).await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, DiscoveryState::PeersFound);
        assert_eq!(snapshot.progress.peer_count, 1);

        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_peers_found_when_tick_equals_window() {
        let source = SimulatedSource::seeded(3, 1);
        let mut session = SyncSession::new(long_tick_config(WINDOW), source).unwrap();
        session.start().await;

        time::sleep(WINDOW + Duration::from_millis(10)).await;
        assert_eq!(session.state(), DiscoveryState::PeersFound);

        time::sleep(WINDOW * 2).await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, DiscoveryState::PeersFound);
        assert_eq!(snapshot.progress.peer_count, 3);

        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn tick_longer_than_window_uses_inputs_fed_before_deadline() {
        let (inputs, source) = channel();
        let mut session =
            SyncSession::new(long_tick_config(Duration::from_millis(5000)), source).unwrap();
        let rx = session.watch();
        session.start().await;
        inputs.peer_appeared("a", None).unwrap();

        time::sleep(WINDOW + Duration::from_millis(10)).await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, DiscoveryState::PeersFound);
        assert_eq!(snapshot.tick, 0, "published before the first tick");
        assert_eq!(snapshot.peers.len(), 1);
        assert_eq!(rx.borrow().state, DiscoveryState::PeersFound);

        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn window_transition_is_published_without_waiting_for_a_tick() {
        let mut session = SyncSession::new(
            long_tick_config(Duration::from_millis(5000)),
            MockSource::new(),
        )
        .unwrap();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = session.subscribe(move |snapshot| {
            sink.lock().unwrap().push(snapshot.state);
        });
        session.start().await;

        time::sleep(WINDOW + Duration::from_millis(10)).await;
        assert_eq!(session.state(), DiscoveryState::Idle);
        assert_eq!(session.snapshot().tick, 0);
        assert_eq!(seen.lock().unwrap().last(), Some(&DiscoveryState::Idle));

        session.stop().await;
    }

    // ===========================================
    // Start / stop semantics
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn double_start_and_double_stop_are_noops() {
        let source = MockSource::new();
        let mut session = SyncSession::new(config(), source.clone()).unwrap();

        session.stop().await;
        session.start().await;
        session.start().await;

        time::sleep(TICK * 5 + TICK / 2).await;
        assert_eq!(source.poll_count(), 5, "one tick loop, not two");

        session.stop().await;
        session.stop().await;
        assert!(!session.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_running_session_stops_ticking() {
        let source = MockSource::new();
        let mut session = SyncSession::new(config(), source.clone()).unwrap();
        session.start().await;
        time::sleep(TICK * 2 + TICK / 2).await;

        drop(session);
        let polls = source.poll_count();
        time::sleep(TICK * 10).await;
        assert_eq!(source.poll_count(), polls);
    }

    // ===========================================
    // Ticks and publication
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn each_tick_reports_current_peer_count() {
        let source = MockSource::new();
        source.queue_batch(vec![appeared("a")]);
        source.queue_batch(vec![appeared("b"), appeared("c")]);
        source.queue_batch(vec![SyncInput::PeerLost {
            id: PeerId::from("a"),
        }]);

        let mut session = SyncSession::new(config(), source.clone()).unwrap();
        let mut rx = session.watch();
        session.start().await;

        let mut counts = Vec::new();
        for _ in 0..4 {
            rx.changed().await.unwrap();
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.tick > 0 {
                counts.push(snapshot.progress.peer_count);
            }
        }
        session.stop().await;

        assert_eq!(counts, vec![1, 3, 2]);
        // The source saw the registry as of the previous tick.
        assert_eq!(&source.seen_counts()[..3], &[0, 1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn source_failure_still_publishes() {
        let source = MockSource::new();
        source.fail_next_poll("transport hiccup");

        let mut session = SyncSession::new(config(), source).unwrap();
        session.start().await;
        time::sleep(TICK + TICK / 2).await;

        assert_eq!(session.snapshot().tick, 1);
        assert!(session.is_running());
        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn aggregate_uses_weighted_sums() {
        let source = MockSource::new();
        source.queue_batch(vec![progress("a", 10, 10), progress("b", 0, 990)]);

        let mut session = SyncSession::new(config(), source).unwrap();
        session.start().await;
        time::sleep(TICK + TICK / 2).await;

        assert_eq!(session.progress().percentage, 1);
        assert_eq!(session.progress().peer_count, 2);
        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn subscriber_gets_at_most_one_call_per_tick() {
        let mut session = SyncSession::new(config(), MockSource::new()).unwrap();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = session.subscribe(move |snapshot| {
            sink.lock().unwrap().push(snapshot.tick);
        });

        session.start().await;
        time::sleep(TICK * 5 + TICK / 2).await;
        session.stop().await;

        let ticks = seen.lock().unwrap().clone();
        assert!(!ticks.is_empty());
        assert!(ticks.len() <= 6, "at most start + 5 ticks, got {ticks:?}");
        assert!(ticks.windows(2).all(|w| w[0] < w[1]), "no duplicates: {ticks:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_subscription_stops_delivery() {
        let mut session = SyncSession::new(config(), MockSource::new()).unwrap();
        let calls = Arc::new(StdMutex::new(0u32));
        let sink = Arc::clone(&calls);
        let subscription = session.subscribe(move |_| {
            *sink.lock().unwrap() += 1;
        });

        session.start().await;
        time::sleep(TICK * 2 + TICK / 2).await;
        subscription.unsubscribe();
        let after_unsubscribe = *calls.lock().unwrap();

        time::sleep(TICK * 5).await;
        assert_eq!(*calls.lock().unwrap(), after_unsubscribe);
        session.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn slow_subscriber_does_not_delay_ticks() {
        let config = SessionConfig::default()
            .with_tick_interval(Duration::from_millis(10))
            .with_discovery_window(Duration::from_millis(50));
        let mut session = SyncSession::new(config, MockSource::new()).unwrap();
        let _slow = session.subscribe(|_| std::thread::sleep(Duration::from_millis(200)));

        session.start().await;
        time::sleep(Duration::from_millis(150)).await;
        let tick = session.snapshot().tick;
        session.stop().await;

        assert!(tick >= 5, "driver kept ticking, reached {tick}");
    }

    #[tokio::test(start_paused = true)]
    async fn transport_fed_session_applies_events_in_order() {
        let (inputs, source) = channel();
        let mut session = SyncSession::new(config(), source).unwrap();
        session.start().await;

        inputs.peer_appeared("a", Some("Phone".into())).unwrap();
        inputs.progress("a", 10, 100).unwrap();
        inputs.peer_appeared("b", None).unwrap();
        inputs.progress("b", 90, 100).unwrap();

        time::sleep(WINDOW + TICK).await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, DiscoveryState::PeersFound);
        assert_eq!(snapshot.progress.percentage, 50);
        let ids: Vec<_> = snapshot.peers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        inputs.peer_lost("a").unwrap();
        time::sleep(TICK).await;
        assert_eq!(session.progress().peer_count, 1);
        assert_eq!(session.progress().percentage, 90);

        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn independent_sessions_share_nothing() {
        let busy = MockSource::new();
        busy.queue_batch(vec![appeared("a")]);

        let mut first = SyncSession::new(config(), busy).unwrap();
        let mut second = SyncSession::new(config(), MockSource::new()).unwrap();
        first.start().await;
        second.start().await;

        time::sleep(WINDOW + TICK).await;
        assert_eq!(first.state(), DiscoveryState::PeersFound);
        assert_eq!(second.state(), DiscoveryState::Idle);

        first.stop().await;
        second.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_session_reaches_completion() {
        let source = SimulatedSource::seeded(3, 11).with_max_step(50);
        let mut session = SyncSession::new(config(), source).unwrap();
        session.start().await;

        time::sleep(WINDOW + TICK * 20).await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, DiscoveryState::PeersFound);
        assert_eq!(snapshot.peers.len(), 3);
        assert!(snapshot.progress.is_complete());

        session.stop().await;
    }
}
