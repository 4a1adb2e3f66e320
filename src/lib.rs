//! # memory-match
//!
//! Session engine for a memory-matching card game: flip two cards, keep
//! the pairs, beat the countdown.
//!
//! ## Design Principles
//!
//! 1. **One Mutator**: `MatchEngine` owns the `Session`; UIs get snapshots
//!    and events, never mutable access.
//!
//! 2. **Virtual Time**: Every delay is a scheduler entry on a clock the
//!    caller advances, so the whole game is testable without real timers.
//!
//! 3. **No Stale Callbacks**: Starting, resetting or ending a session cancels
//!    everything that session scheduled.
//!
//! ## Modules
//!
//! - `core`: Cards, sessions, configuration, RNG, errors
//! - `deck`: Deck provider boundary, validation, dealing
//! - `timing`: Scheduler and countdown formatting
//! - `engine`: The session state machine and its events
//! - `runtime`: Tokio task driving an engine in real time

pub mod core;
pub mod deck;
pub mod engine;
pub mod runtime;
pub mod timing;

// Re-export commonly used types
pub use crate::core::{
    Card, CardFace, CardId, ConfigError, DeckError, Difficulty, DifficultyConfig, EngineConfig,
    EngineError, GameRng, GameRngState, Phase, Position, Session, SessionId, SessionStats, UnlockPolicy,
};

pub use crate::deck::{deal, validate_deck, CatalogProvider, DeckItem, DeckProvider};

pub use crate::engine::{MatchEngine, Outcome, SessionEvent, StartTicket};

pub use crate::runtime::{SessionDriver, SessionHandle};

pub use crate::timing::{format_clock, Scheduler, TimerId, TimerTask};
