//! Tokio driver: runs a `MatchEngine` against wall-clock time.
//!
//! The engine lives inside one task. The task waits for either the next
//! command or the engine's next deadline, moves the engine clock to the
//! elapsed wall time, then handles whatever woke it. Commands and callbacks
//! are therefore handled one at a time, in time order.
//!
//! ```
//! use memory_match::core::{CardId, EngineConfig, Phase};
//! use memory_match::deck::{CatalogProvider, DeckItem};
//! use memory_match::engine::MatchEngine;
//! use memory_match::runtime::SessionDriver;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let catalog = CatalogProvider::new(
//!     (1..=12).map(|i| DeckItem::new(CardId::new(i), format!("c{i}"), format!("{i}.png"))),
//! );
//! let engine = MatchEngine::new(EngineConfig::default(), catalog, 7);
//! let (handle, task) = SessionDriver::spawn(engine);
//!
//! handle.start("hard").await.unwrap();
//! assert_eq!(handle.snapshot().phase(), Phase::Running);
//!
//! handle.shutdown().await.unwrap();
//! let engine = task.await.unwrap();
//! assert_eq!(engine.session().cards().len(), 24);
//! # });
//! ```

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::core::{EngineError, Position, Session, SessionId};
use crate::deck::DeckProvider;
use crate::engine::{MatchEngine, SessionEvent};

const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 256;

enum Command {
    Start {
        difficulty: String,
        reply: oneshot::Sender<Result<SessionId, EngineError>>,
    },
    Flip {
        position: Position,
        reply: oneshot::Sender<bool>,
    },
    Powerup {
        reply: oneshot::Sender<bool>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Cloneable front end to a running driver.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Session>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Start a session. See `MatchEngine::start`.
    pub async fn start(&self, difficulty: &str) -> Result<SessionId, EngineError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Start {
            difficulty: difficulty.to_string(),
            reply,
        })
        .await?;
        response.await.map_err(|_| EngineError::DriverClosed)?
    }

    /// Flip a card. Returns whether the flip was accepted.
    pub async fn flip(&self, position: Position) -> Result<bool, EngineError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Flip { position, reply }).await?;
        response.await.map_err(|_| EngineError::DriverClosed)
    }

    /// Activate the power-up. Returns whether it was activated.
    pub async fn activate_powerup(&self) -> Result<bool, EngineError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Powerup { reply }).await?;
        response.await.map_err(|_| EngineError::DriverClosed)
    }

    /// Reset to an idle session.
    pub async fn reset(&self) -> Result<(), EngineError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Reset { reply }).await?;
        response.await.map_err(|_| EngineError::DriverClosed)
    }

    /// Stop the driver. The task then returns the engine.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.send(Command::Shutdown).await
    }

    /// Latest published session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.snapshots.clone()
    }

    /// Receive events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn send(&self, command: Command) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::DriverClosed)
    }
}

/// Task state of a running engine.
pub struct SessionDriver<P> {
    engine: MatchEngine<P>,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<Session>,
    events: broadcast::Sender<SessionEvent>,
    /// Wall time at spawn.
    origin: Instant,
    /// Engine time at spawn.
    base: Duration,
}

impl<P: DeckProvider + 'static> SessionDriver<P> {
    /// Move `engine` into a new task.
    ///
    /// The engine clock keeps its current reading and advances with wall
    /// time from the moment of the call. The task ends on `shutdown` or once
    /// every handle is dropped, returning the engine.
    pub fn spawn(engine: MatchEngine<P>) -> (SessionHandle, JoinHandle<MatchEngine<P>>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.session().clone());
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let base = engine.now();
        let driver = SessionDriver {
            engine,
            commands: command_rx,
            snapshots: snapshot_tx,
            events: event_tx.clone(),
            origin: Instant::now(),
            base,
        };

        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx,
        };

        (handle, tokio::spawn(driver.run()))
    }

    async fn run(mut self) -> MatchEngine<P> {
        loop {
            let deadline = self.engine.next_deadline().map(|at| self.wall_time(at));

            tokio::select! {
                command = self.commands.recv() => {
                    self.catch_up();
                    match command {
                        None | Some(Command::Shutdown) => break,
                        Some(command) => self.handle(command).await,
                    }
                }
                () = wait_until(deadline) => {
                    self.catch_up();
                    self.publish();
                }
            }
        }

        tracing::debug!("session driver stopped");
        self.publish();
        self.engine
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start { difficulty, reply } => {
                let result = match self.engine.prepare_start(&difficulty) {
                    Ok(ticket) => {
                        let deck = self.engine.provider().request_deck(ticket.pair_count()).await;
                        // The fetch may have taken a while; deal at the current time
                        self.catch_up();
                        self.engine.complete_start(ticket, deck)
                    }
                    Err(error) => Err(error),
                };
                self.publish();
                let _ = reply.send(result);
            }
            Command::Flip { position, reply } => {
                let accepted = self.engine.flip(position);
                self.publish();
                let _ = reply.send(accepted);
            }
            Command::Powerup { reply } => {
                let activated = self.engine.activate_powerup();
                self.publish();
                let _ = reply.send(activated);
            }
            Command::Reset { reply } => {
                self.engine.reset();
                self.publish();
                let _ = reply.send(());
            }
            Command::Shutdown => {}
        }
    }

    fn catch_up(&mut self) {
        self.engine.advance_to(self.elapsed());
    }

    /// Engine time now.
    fn elapsed(&self) -> Duration {
        self.base + Instant::now().saturating_duration_since(self.origin)
    }

    /// Wall time at which the engine clock reads `at`.
    fn wall_time(&self, at: Duration) -> Instant {
        self.origin + at.saturating_sub(self.base)
    }

    fn publish(&mut self) {
        for event in self.engine.drain_events() {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
        self.snapshots.send_replace(self.engine.session().clone());
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
