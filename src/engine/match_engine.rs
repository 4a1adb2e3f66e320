//! The match-game session engine.
//!
//! `MatchEngine` owns the current `Session` and is its only mutator. It is
//! driven by discrete calls (`start`, `flip`, `activate_powerup`, `reset`)
//! and by its virtual clock (`advance`), which fires the delayed callbacks:
//!
//! - selection resolution, 500 ms after the second flip
//! - mismatch revert and lock release, 500 ms after resolution
//! - win announcement, 500 ms after the last match
//! - power-up expiry, 3000 ms after activation
//! - the countdown, every second while running
//!
//! Starting or resetting a session cancels every pending callback, so a
//! callback from an old session can never touch the new one.

use std::time::Duration;

use super::events::{Outcome, SessionEvent};
use crate::core::{
    CardFace, DeckError, Difficulty, DifficultyConfig, EngineConfig, EngineError, GameRng,
    GameRngState, Phase, Position, Session, SessionId, UnlockPolicy,
};
use crate::deck::{deal, validate_deck, DeckItem, DeckProvider};
use crate::timing::{Scheduler, TimerId, TimerTask};

/// A start in progress, between the deck request and dealing.
#[derive(Debug)]
#[must_use]
pub struct StartTicket {
    session: SessionId,
    difficulty: Difficulty,
    tier: DifficultyConfig,
}

impl StartTicket {
    /// Id the new session will have.
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Number of distinct items to request.
    pub fn pair_count(&self) -> usize {
        self.tier.pair_count
    }
}

/// Delayed work owned by the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EngineTask {
    ResolveSelection,
    RevertMismatch([Position; 2]),
    Unlock,
    AnnounceWin,
    PeekExpiry,
    CountdownTick,
}

impl TimerTask for EngineTask {
    fn rank(&self) -> u8 {
        // Anything due together with a tick runs first, so a win announced
        // in the final second beats the timeout.
        match self {
            EngineTask::CountdownTick => 1,
            _ => 0,
        }
    }
}

/// Session engine over a deck provider.
///
/// ```
/// use std::time::Duration;
/// use memory_match::core::{CardId, EngineConfig, Phase};
/// use memory_match::deck::{CatalogProvider, DeckItem};
/// use memory_match::engine::MatchEngine;
///
/// let catalog = CatalogProvider::new(
///     (1..=12).map(|i| DeckItem::new(CardId::new(i), format!("c{i}"), format!("{i}.png"))),
/// );
/// let mut engine = MatchEngine::new(EngineConfig::default(), catalog, 42);
///
/// let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// runtime.block_on(engine.start("easy")).unwrap();
/// assert_eq!(engine.session().phase(), Phase::Running);
/// assert_eq!(engine.session().cards().len(), 6);
///
/// engine.advance(Duration::from_secs(120));
/// assert_eq!(engine.session().phase(), Phase::Lost);
/// ```
#[derive(Debug)]
pub struct MatchEngine<P> {
    config: EngineConfig,
    provider: P,
    rng: GameRng,
    session: Session,
    scheduler: Scheduler<EngineTask>,
    countdown: Option<TimerId>,
    events: Vec<SessionEvent>,
}

impl<P: DeckProvider> MatchEngine<P> {
    /// Create an engine with an idle session. `seed` drives the shuffles.
    pub fn new(config: EngineConfig, provider: P, seed: u64) -> Self {
        Self::with_rng(config, provider, GameRng::new(seed))
    }

    /// Create an engine that shuffles with `rng`.
    ///
    /// Together with [`rng_state`](Self::rng_state) this lets a host rebuild
    /// an engine that deals the same boards the old one would have.
    pub fn with_rng(config: EngineConfig, provider: P, rng: GameRng) -> Self {
        Self {
            config,
            provider,
            rng,
            session: Session::idle(SessionId::default()),
            scheduler: Scheduler::new(),
            countdown: None,
            events: Vec::new(),
        }
    }

    /// Create an engine whose shuffles are seeded from the OS.
    pub fn with_entropy(config: EngineConfig, provider: P) -> Self {
        let seed = GameRng::from_entropy().seed();
        Self::new(config, provider, seed)
    }

    // === Read access ===

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Current session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Virtual time of the next pending callback.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Whether the countdown is armed.
    #[must_use]
    pub fn countdown_active(&self) -> bool {
        self.countdown.is_some_and(|id| self.scheduler.is_pending(id))
    }

    /// Position of the shuffle RNG.
    #[must_use]
    pub fn rng_state(&self) -> GameRngState {
        self.rng.state()
    }

    /// Take all events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // === Operations ===

    /// Deal a new board for `difficulty_key` and start the countdown.
    ///
    /// Fails with `AlreadyRunning` while a session is running, with
    /// `UnknownDifficulty` for a bad key, and with `DeckUnavailable` when the
    /// provider fails; in the last case the engine is left idle.
    pub async fn start(&mut self, difficulty_key: &str) -> Result<SessionId, EngineError> {
        let ticket = self.prepare_start(difficulty_key)?;
        let deck = self.provider.request_deck(ticket.pair_count()).await;
        self.complete_start(ticket, deck)
    }

    /// First half of [`start`](Self::start): check the request and discard
    /// the previous session.
    ///
    /// Drivers that need to do work between the deck request and dealing
    /// (such as syncing the clock after a slow fetch) call this, request the
    /// deck from [`provider`](Self::provider), then call
    /// [`complete_start`](Self::complete_start).
    pub fn prepare_start(&mut self, difficulty_key: &str) -> Result<StartTicket, EngineError> {
        if self.session.is_running() {
            return Err(EngineError::AlreadyRunning);
        }

        let difficulty: Difficulty = difficulty_key.parse()?;
        let tier = *self.config.difficulty(difficulty);

        self.discard_session();

        Ok(StartTicket {
            session: self.session.id,
            difficulty,
            tier,
        })
    }

    /// Second half of [`start`](Self::start): validate the deck and deal.
    pub fn complete_start(
        &mut self,
        ticket: StartTicket,
        deck: Result<Vec<DeckItem>, DeckError>,
    ) -> Result<SessionId, EngineError> {
        let StartTicket {
            session: id,
            difficulty,
            tier,
        } = ticket;

        if id != self.session.id || self.session.phase != Phase::Idle {
            return Err(EngineError::Superseded);
        }

        let items = match deck {
            Ok(items) => items,
            Err(error) => {
                tracing::warn!(%id, %difficulty, %error, "deck provider failed");
                return Err(error.into());
            }
        };
        if let Err(error) = validate_deck(&items, tier.pair_count) {
            tracing::warn!(%id, %difficulty, %error, "deck rejected");
            return Err(error.into());
        }

        let mut deal_rng = self.rng.fork();
        let cards = deal(&items, &mut deal_rng);

        self.session = Session {
            difficulty: Some(difficulty),
            rows: tier.rows,
            columns: tier.columns,
            cards,
            items: items.into_iter().collect(),
            total_pairs: tier.pair_count,
            time_limit_secs: tier.time_limit_secs,
            time_remaining_secs: tier.time_limit_secs,
            phase: Phase::Running,
            ..Session::idle(id)
        };
        self.countdown = Some(
            self.scheduler
                .schedule(self.config.tick_interval(), EngineTask::CountdownTick),
        );

        tracing::info!(%id, %difficulty, pairs = tier.pair_count, "session started");

        self.emit(SessionEvent::BoardReady {
            session: id,
            total_pairs: tier.pair_count,
            rows: tier.rows,
            columns: tier.columns,
        });
        self.emit_counters();
        self.emit(SessionEvent::TimeChanged {
            remaining_secs: tier.time_limit_secs,
        });

        Ok(id)
    }

    /// Turn a face-down card face up.
    ///
    /// Ignored (returns `false`) unless the session is running, the turn is
    /// not locked, and the card at `position` is face down.
    pub fn flip(&mut self, position: Position) -> bool {
        if !self.session.is_running() || self.session.turn_locked {
            return false;
        }
        if self.session.face(position) != Some(CardFace::FaceDown) {
            return false;
        }

        self.session.click_count += 1;
        self.set_face(position, CardFace::FaceUp);
        self.session.face_up_selection.push(position);
        self.emit_counters();

        if self.session.face_up_selection.len() == 2 {
            self.session.turn_locked = true;
            self.scheduler
                .schedule(self.config.resolve_delay(), EngineTask::ResolveSelection);
        }

        true
    }

    /// Reveal every unmatched, unselected card for a while. Once per session.
    ///
    /// Returns whether the power-up was activated.
    pub fn activate_powerup(&mut self) -> bool {
        if !self.session.is_running() || self.session.powerup_used {
            return false;
        }

        self.session.powerup_used = true;
        self.session.peek_active = true;

        let hidden: Vec<Position> = self.session.positions_with(CardFace::FaceDown).collect();
        for position in hidden {
            self.set_face(position, CardFace::Peeking);
        }

        self.emit(SessionEvent::PowerupChanged { active: true });
        self.scheduler
            .schedule(self.config.powerup_duration(), EngineTask::PeekExpiry);

        tracing::debug!(id = %self.session.id, "power-up activated");
        true
    }

    /// One countdown step. Runs the timeout when the clock reaches zero.
    ///
    /// The engine's own countdown calls this every tick interval; drivers
    /// that advance the clock should not call it as well.
    pub fn tick(&mut self) {
        if !self.session.is_running() {
            return;
        }

        self.session.time_remaining_secs = self.session.time_remaining_secs.saturating_sub(1);
        self.emit(SessionEvent::TimeChanged {
            remaining_secs: self.session.time_remaining_secs,
        });

        if self.session.time_remaining_secs == 0 {
            if self.session.all_matched() {
                self.finish(Outcome::Won);
            } else {
                self.finish(Outcome::Lost);
            }
        }
    }

    /// Drop the current session and go back to a fresh idle one.
    pub fn reset(&mut self) {
        self.discard_session();
        tracing::info!(id = %self.session.id, "session reset");
        self.emit(SessionEvent::SessionReset {
            session: self.session.id,
        });
    }

    // === Clock ===

    /// Move the virtual clock forward by `delta`.
    pub fn advance(&mut self, delta: Duration) {
        self.advance_to(self.scheduler.now() + delta);
    }

    /// Move the virtual clock to `now`, firing due callbacks in order.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some(fired) = self.scheduler.pop_due(now) {
            self.run(fired.task);
        }
        self.scheduler.advance_clock(now);
    }

    fn run(&mut self, task: EngineTask) {
        match task {
            EngineTask::ResolveSelection => self.resolve_selection(),
            EngineTask::RevertMismatch(positions) => self.revert_mismatch(positions),
            EngineTask::Unlock => self.session.turn_locked = false,
            EngineTask::AnnounceWin => self.win(),
            EngineTask::PeekExpiry => self.end_peek(),
            EngineTask::CountdownTick => {
                self.countdown = None;
                self.tick();
                if self.session.is_running() {
                    self.countdown = Some(
                        self.scheduler
                            .schedule(self.config.tick_interval(), EngineTask::CountdownTick),
                    );
                }
            }
        }
    }

    // === Transitions ===

    fn resolve_selection(&mut self) {
        let [first, second] = match self.session.face_up_selection.as_slice() {
            &[first, second] => [first, second],
            _ => return,
        };
        self.session.face_up_selection.clear();

        let identity = |position: Position| self.session.card(position).map(|card| card.identity);
        let matched = identity(first).is_some() && identity(first) == identity(second);

        if !matched {
            tracing::debug!(%first, %second, "mismatch");
            self.scheduler.schedule(
                self.config.resolve_delay(),
                EngineTask::RevertMismatch([first, second]),
            );
            return;
        }

        self.set_face(first, CardFace::Matched);
        self.set_face(second, CardFace::Matched);
        self.session.matched_pair_count += 1;
        self.emit_counters();
        tracing::debug!(%first, %second, matched = self.session.matched_pair_count, "match");

        if self.session.all_matched() {
            self.scheduler
                .schedule(self.config.resolve_delay(), EngineTask::AnnounceWin);
            return;
        }

        match self.config.match_unlock {
            UnlockPolicy::Immediate => self.session.turn_locked = false,
            UnlockPolicy::Delayed => {
                self.scheduler
                    .schedule(self.config.resolve_delay(), EngineTask::Unlock);
            }
        }
    }

    fn revert_mismatch(&mut self, positions: [Position; 2]) {
        for position in positions {
            if self.session.face(position) == Some(CardFace::FaceUp) {
                self.set_face(position, CardFace::FaceDown);
            }
        }
        self.session.turn_locked = false;
    }

    fn win(&mut self) {
        if self.session.is_running() {
            self.finish(Outcome::Won);
        }
    }

    fn end_peek(&mut self) {
        if !self.session.peek_active {
            return;
        }
        self.session.peek_active = false;

        let peeking: Vec<Position> = self.session.positions_with(CardFace::Peeking).collect();
        for position in peeking {
            self.set_face(position, CardFace::FaceDown);
        }
        self.emit(SessionEvent::PowerupChanged { active: false });
    }

    /// Leave `Running`: stop every callback, settle transient state, report.
    fn finish(&mut self, outcome: Outcome) {
        self.scheduler.cancel_all();
        self.countdown = None;

        self.end_peek();
        self.session.face_up_selection.clear();
        self.session.turn_locked = false;
        self.session.phase = match outcome {
            Outcome::Won => Phase::Won,
            Outcome::Lost => Phase::Lost,
        };

        let stats = self.session.stats();
        tracing::info!(
            id = %self.session.id,
            ?outcome,
            elapsed_secs = stats.elapsed_secs,
            clicks = stats.clicks,
            matched = stats.matched_pairs,
            total = stats.total_pairs,
            "session ended"
        );
        self.emit(SessionEvent::SessionEnded { outcome, stats });
    }

    fn discard_session(&mut self) {
        self.scheduler.cancel_all();
        self.countdown = None;
        self.session = Session::idle(self.session.id.next());
    }

    // === Helpers ===

    fn set_face(&mut self, position: Position, face: CardFace) {
        if self.session.set_face(position, face) {
            self.emit(SessionEvent::CardChanged { position, face });
        }
    }

    fn emit_counters(&mut self) {
        self.emit(SessionEvent::CountersChanged {
            clicks: self.session.click_count,
            matched_pairs: self.session.matched_pair_count,
        });
    }

    fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}
