//! Core value types: cards, sessions, configuration, RNG, errors.
//!
//! Nothing in here schedules or mutates on its own; the engine drives it.

pub mod card;
pub mod config;
pub mod error;
pub mod rng;
pub mod session;

pub use card::{Card, CardFace, CardId, Position};
pub use config::{Difficulty, DifficultyConfig, EngineConfig, UnlockPolicy};
pub use error::{ConfigError, DeckError, EngineError};
pub use rng::{GameRng, GameRngState};
pub use session::{Phase, Session, SessionId, SessionStats};
