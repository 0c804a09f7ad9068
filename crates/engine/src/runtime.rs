//! Engine actor - drives one `GameSession` on the tokio clock.
//!
//! The actor is the only owner of the session. Intents arrive over a bounded
//! mpsc queue and timer deadlines are served by a single outstanding
//! `sleep_until`, so an intent and a timer firing can never interleave. Before
//! every intent the session clock is brought up to "now", which fires any
//! deadline that is already due first.
//!
//! Observers read state through a `watch` channel of [`GameSnapshot`] (only
//! published when it changes) and transient signals through a `broadcast`
//! channel of [`CoreEvent`].

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use number_match_core::{GameSession, GameSnapshot};
use number_match_types::{CoreEvent, GameAction};

use crate::config::EngineConfig;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine has shut down")]
    Closed,

    #[error("intent queue is full")]
    Backpressure,

    #[error("engine task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

enum Request {
    Apply {
        action: GameAction,
        reply: Option<oneshot::Sender<bool>>,
    },
    Shutdown,
}

/// Cloneable access to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    requests: mpsc::Sender<Request>,
    snapshots: watch::Receiver<GameSnapshot>,
    events: broadcast::Sender<CoreEvent>,
}

impl EngineHandle {
    /// Apply an intent and wait until it has been processed.
    ///
    /// Returns whether the session accepted it.
    pub async fn apply(&self, action: GameAction) -> Result<bool, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(Request::Apply {
                action,
                reply: Some(tx),
            })
            .await
            .map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Queue an intent without waiting for room.
    ///
    /// The receiver resolves once the intent has been applied and the new
    /// snapshot published.
    pub fn try_apply(&self, action: GameAction) -> Result<oneshot::Receiver<bool>, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .try_send(Request::Apply {
                action,
                reply: Some(tx),
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => EngineError::Backpressure,
                mpsc::error::TrySendError::Closed(_) => EngineError::Closed,
            })?;
        Ok(rx)
    }

    /// Free slots in the intent queue
    pub fn capacity(&self) -> usize {
        self.requests.capacity()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> GameSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<GameSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Ask the actor to stop. Pending intents queued before this are still applied.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.requests
            .send(Request::Shutdown)
            .await
            .map_err(|_| EngineError::Closed)
    }
}

/// A spawned engine actor
pub struct Engine {
    handle: EngineHandle,
    task: JoinHandle<GameSession>,
}

impl Engine {
    pub fn spawn(config: EngineConfig) -> Self {
        let session = GameSession::with_timings(config.seed, config.timings);
        Self::spawn_session(session, config.max_pending)
    }

    /// Drive an existing session. Must be called inside a tokio runtime.
    pub fn spawn_session(session: GameSession, max_pending: usize) -> Self {
        let (request_tx, request_rx) = mpsc::channel(max_pending.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let task = tokio::spawn(run(session, request_rx, snapshot_tx, event_tx.clone()));

        Self {
            handle: EngineHandle {
                requests: request_tx,
                snapshots: snapshot_rx,
                events: event_tx,
            },
            task,
        }
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop the actor and return the session it owned.
    pub async fn shutdown(self) -> Result<GameSession, EngineError> {
        // The actor also stops when every handle is gone, so a closed queue is fine here.
        let _ = self.handle.shutdown().await;
        Ok(self.task.await?)
    }
}

async fn run(
    mut session: GameSession,
    mut requests: mpsc::Receiver<Request>,
    snapshots: watch::Sender<GameSnapshot>,
    events: broadcast::Sender<CoreEvent>,
) -> GameSession {
    let origin = Instant::now();
    let base_ms = session.now_ms();
    let mut scratch = session.snapshot();

    info!(seed = session.seed(), "engine started");

    loop {
        let wake = session
            .next_deadline_ms()
            .map(|ms| origin + Duration::from_millis(ms.saturating_sub(base_ms)));
        let mut reply = None;

        tokio::select! {
            request = requests.recv() => match request {
                Some(Request::Apply { action, reply: tx }) => {
                    session.advance_to(clock_ms(origin, base_ms));
                    let applied = session.apply_action(action);
                    debug!(action = action.as_str(), applied, "intent");
                    reply = tx.map(|tx| (tx, applied));
                }
                Some(Request::Shutdown) | None => break,
            },
            _ = sleep_until(wake) => {
                session.advance_to(clock_ms(origin, base_ms));
            }
        }

        publish(&mut session, &mut scratch, &snapshots, &events);

        if let Some((tx, applied)) = reply {
            let _ = tx.send(applied);
        }
    }

    // Teardown cancels every pending timer.
    session.go_to_menu();
    publish(&mut session, &mut scratch, &snapshots, &events);
    info!(episode = session.episode_id(), "engine stopped");

    session
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn clock_ms(origin: Instant, base_ms: u64) -> u64 {
    base_ms.saturating_add(origin.elapsed().as_millis() as u64)
}

fn publish(
    session: &mut GameSession,
    scratch: &mut GameSnapshot,
    snapshots: &watch::Sender<GameSnapshot>,
    events: &broadcast::Sender<CoreEvent>,
) {
    for event in session.take_events() {
        match event {
            CoreEvent::StatusChanged(status) => info!(
                status = status.as_str(),
                level = session.level().name,
                episode = session.episode_id(),
                "status changed"
            ),
            other => debug!(event = other.as_str(), "signal"),
        }
        // No subscribers is fine.
        let _ = events.send(event);
    }

    session.snapshot_into(scratch);
    snapshots.send_if_modified(|current| {
        if *current == *scratch {
            false
        } else {
            std::mem::swap(current, scratch);
            true
        }
    });
}
