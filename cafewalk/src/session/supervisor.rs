//! Session supervisor: lifecycle, cleanup and the event loop.
//!
//! The supervisor owns the single-live-session invariant. Starting
//! navigation tears down whatever session came before it, fetches the
//! initial route, starts position tracking and spawns the event-loop
//! task; stopping cancels the task, the tracker subscription and any
//! pending auto-end timer through one idempotent teardown path, which is
//! also what component teardown uses.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     NavigationSupervisor                     │
//! │                                                              │
//! │  PositionTracker ──fixes──► SessionLoop ──effects──► timers, │
//! │                              │      ▲                reroute │
//! │                              │      └── InstallRoute/Failed  │
//! │                   snapshots ▼                    (spawned)   │
//! │            watch<Snapshot> + broadcast<SessionEvent>         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reroute fetches are fire-and-forget tasks reporting back through the
//! loop's command channel; position handling never awaits the network.

use std::pin::Pin;
use std::sync::{Arc, RwLock};

use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::directions::{DirectionsError, DirectionsProvider};
use crate::error::NavigationError;
use crate::geo::GeoPoint;
use crate::position::{
    PositionSensor, PositionTracker, TrackerHandle, TrackerUpdate, WatchOptions, DEFAULT_POSITION,
};

use super::config::SessionConfig;
use super::model::NavigationSession;
use super::state::{NavigationSnapshot, SessionEffect, SessionEvent};

/// Capacity of the session event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Result of a spawned reroute fetch, reported back to the loop.
enum LoopCommand {
    InstallRoute(crate::route::Route),
    RerouteFailed(DirectionsError),
}

/// A running session and the handles needed to tear it down.
struct LiveSession {
    target: GeoPoint,
    cancel: CancellationToken,
    tracker: TrackerHandle,
    task: Option<JoinHandle<()>>,
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        // Safety net for component teardown without an explicit stop
        self.cancel.cancel();
        self.tracker.stop();
    }
}

/// Owns at most one live navigation session and its UI-facing surface.
pub struct NavigationSupervisor<P, S> {
    provider: Arc<P>,
    sensor: Arc<S>,
    config: SessionConfig,
    watch_options: WatchOptions,

    /// The single live session, if any.
    live: Mutex<Option<LiveSession>>,

    /// Latest snapshot for UI subscribers.
    snapshot_tx: watch::Sender<NavigationSnapshot>,

    /// Push events for UI and map overlay subscribers.
    event_tx: broadcast::Sender<SessionEvent>,

    /// Most recent fix across sessions; seeds the next route request.
    last_position: Arc<RwLock<Option<GeoPoint>>>,
}

impl<P, S> NavigationSupervisor<P, S>
where
    P: DirectionsProvider + 'static,
    S: PositionSensor,
{
    /// Create a supervisor with default watch options.
    pub fn new(provider: Arc<P>, sensor: Arc<S>, config: SessionConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(NavigationSnapshot::default());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            provider,
            sensor,
            config,
            watch_options: WatchOptions::default(),
            live: Mutex::new(None),
            snapshot_tx,
            event_tx,
            last_position: Arc::new(RwLock::new(None)),
        }
    }

    /// Override the position watch options.
    pub fn with_watch_options(mut self, options: WatchOptions) -> Self {
        self.watch_options = options;
        self
    }

    /// Subscribe to state snapshots. The current value is observable
    /// immediately; every transition publishes a fresh one.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<NavigationSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to push events (route overlay, arrival, errors).
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> NavigationSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Seed the supervisor with a known position (e.g. the map's first
    /// one-shot fix) before any tracking has run.
    pub fn seed_position(&self, point: GeoPoint) {
        *self.last_position.write().unwrap() = Some(point);
    }

    /// Most recent position seen by any session, if any.
    pub fn last_known_position(&self) -> Option<GeoPoint> {
        *self.last_position.read().unwrap()
    }

    /// Whether a session is currently live.
    pub async fn is_navigating(&self) -> bool {
        self.live
            .lock()
            .await
            .as_ref()
            .map(|s| !s.cancel.is_cancelled())
            .unwrap_or(false)
    }

    /// Start guiding toward `target`.
    ///
    /// A no-op when already navigating to the same target (rapid UI
    /// double-taps must not duplicate subscriptions). Any other prior
    /// session is torn down first. A failed initial route fetch is a
    /// blocking error: the session never starts.
    pub async fn start_navigation_to(&self, target: GeoPoint) -> Result<(), NavigationError> {
        let mut live = self.live.lock().await;

        if let Some(current) = live.as_ref() {
            if !current.cancel.is_cancelled() && current.target == target {
                debug!(%target, "already navigating to this destination, ignoring");
                return Ok(());
            }
        }
        if let Some(previous) = live.take() {
            teardown(previous).await;
        }

        let origin = self.last_known_position().unwrap_or(DEFAULT_POSITION);
        let route = self
            .provider
            .fetch_route(origin, target)
            .await
            .map_err(|e| {
                warn!(%target, error = %e, "initial route fetch failed");
                NavigationError::RouteFetch(e)
            })?;

        let session = NavigationSession::start(route, target, self.config.clone(), Instant::now());
        let (tracker, updates) =
            PositionTracker::start(Arc::clone(&self.sensor), self.watch_options);
        let cancel = CancellationToken::new();

        let _ = self.event_tx.send(SessionEvent::RouteAvailable {
            polyline: session.route().full_polyline(),
        });
        self.snapshot_tx
            .send_replace(session.snapshot(tracker.is_tracking()));

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let session_loop = SessionLoop {
            session,
            target,
            provider: Arc::clone(&self.provider),
            tracker: tracker.clone(),
            updates,
            cmd_tx,
            cmd_rx,
            cancel: cancel.clone(),
            snapshot_tx: self.snapshot_tx.clone(),
            event_tx: self.event_tx.clone(),
            last_position: Arc::clone(&self.last_position),
            auto_end_delay: self.config.auto_end_delay,
        };
        let task = tokio::spawn(session_loop.run());

        *live = Some(LiveSession {
            target,
            cancel,
            tracker,
            task: Some(task),
        });
        Ok(())
    }

    /// Stop the live session, if any.
    ///
    /// Cancels the position subscription, the pending auto-end timer and
    /// the route overlay in one pass. Safe to call multiple times and
    /// before any session ever started.
    pub async fn stop_navigation(&self) {
        let mut live = self.live.lock().await;
        match live.take() {
            Some(previous) => {
                info!("stopping navigation");
                teardown(previous).await;
            }
            None => debug!("stop requested with no live session"),
        }
    }
}

/// Cancel a session's resources and wait for its task to finish.
async fn teardown(mut previous: LiveSession) {
    previous.cancel.cancel();
    previous.tracker.stop();
    if let Some(task) = previous.task.take() {
        if let Err(e) = task.await {
            tracing::error!("session task panicked: {}", e);
        }
    }
}

/// The per-session event loop.
///
/// Consumes tracker updates and internal commands until cancelled or
/// auto-ended, then publishes the idle state. Everything it does is
/// non-blocking; reroute fetches run in their own tasks.
struct SessionLoop<P> {
    session: NavigationSession,
    target: GeoPoint,
    provider: Arc<P>,
    tracker: TrackerHandle,
    updates: mpsc::UnboundedReceiver<TrackerUpdate>,
    cmd_tx: mpsc::UnboundedSender<LoopCommand>,
    cmd_rx: mpsc::UnboundedReceiver<LoopCommand>,
    cancel: CancellationToken,
    snapshot_tx: watch::Sender<NavigationSnapshot>,
    event_tx: broadcast::Sender<SessionEvent>,
    last_position: Arc<RwLock<Option<GeoPoint>>>,
    auto_end_delay: std::time::Duration,
}

impl<P: DirectionsProvider + 'static> SessionLoop<P> {
    async fn run(mut self) {
        let mut auto_end: Option<Pin<Box<Sleep>>> = None;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,

                maybe = self.updates.recv() => match maybe {
                    None => break,
                    Some(TrackerUpdate::Fix(fix)) => {
                        *self.last_position.write().unwrap() = Some(fix.point);
                        let effects = self.session.handle_position(&fix, Instant::now());
                        for effect in effects {
                            self.perform(effect, &mut auto_end);
                        }
                        self.publish_snapshot();
                    }
                    Some(TrackerUpdate::SensorError { kind, message, fallback }) => {
                        debug!(%kind, %fallback, "surfacing sensor error");
                        let _ = self.event_tx.send(SessionEvent::Error(
                            NavigationError::Sensor { kind, message },
                        ));
                    }
                },

                Some(command) = self.cmd_rx.recv() => match command {
                    LoopCommand::InstallRoute(route) => {
                        let polyline = route.full_polyline();
                        self.session.install_reroute(route, Instant::now());
                        let _ = self.event_tx.send(SessionEvent::Rerouted);
                        let _ = self.event_tx.send(SessionEvent::RouteAvailable { polyline });
                        self.publish_snapshot();
                    }
                    LoopCommand::RerouteFailed(error) => {
                        warn!(error = %error, "reroute failed, keeping stale route");
                        self.session.reroute_failed();
                        let _ = self.event_tx.send(SessionEvent::Error(
                            NavigationError::Reroute(error),
                        ));
                    }
                },

                _ = async { auto_end.as_mut().unwrap().as_mut().await }, if auto_end.is_some() => {
                    info!("auto-ending session after arrival");
                    break;
                }
            }
        }

        // One cleanup path for every exit: explicit stop, auto-end,
        // sensor stream closing.
        self.tracker.stop();
        self.cancel.cancel();
        let _ = self.event_tx.send(SessionEvent::RouteCleared);
        self.snapshot_tx.send_replace(NavigationSnapshot::default());
        debug!("session loop finished");
    }

    /// Turn a transition effect into timers or spawned work.
    fn perform(&self, effect: SessionEffect, auto_end: &mut Option<Pin<Box<Sleep>>>) {
        match effect {
            SessionEffect::Arrived => {
                let _ = self.event_tx.send(SessionEvent::Arrived);
                *auto_end = Some(Box::pin(tokio::time::sleep(self.auto_end_delay)));
            }
            SessionEffect::RequestReroute { origin } => {
                let _ = self.event_tx.send(SessionEvent::Deviated);
                let provider = Arc::clone(&self.provider);
                let cmd_tx = self.cmd_tx.clone();
                let target = self.target;
                tokio::spawn(async move {
                    match provider.fetch_route(origin, target).await {
                        Ok(route) => {
                            let _ = cmd_tx.send(LoopCommand::InstallRoute(route));
                        }
                        Err(error) => {
                            let _ = cmd_tx.send(LoopCommand::RerouteFailed(error));
                        }
                    }
                });
            }
        }
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx
            .send_replace(self.session.snapshot(self.tracker.is_tracking()));
    }
}
