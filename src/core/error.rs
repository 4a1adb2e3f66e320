//! Error types.
//!
//! - [`DeckError`]: The deck provider could not supply a valid deck
//! - [`EngineError`]: `start` (or the runtime driver) failed
//! - [`ConfigError`]: Configuration could not be parsed or is inconsistent
//!
//! Board operations (`flip`, `activate_powerup`, `reset`, `tick`) never fail;
//! calls that are not allowed are ignored.

use thiserror::Error;

use super::card::CardId;

/// Failure to produce a deck of distinct items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    /// The source itself failed (network, malformed response).
    #[error("deck source unavailable: {message}")]
    Unavailable {
        /// Detailed error message.
        message: String,
    },

    /// The catalog holds fewer distinct items than requested.
    #[error("requested {requested} distinct items but only {available} are available")]
    Insufficient { requested: usize, available: usize },

    /// The provider returned the wrong number of items.
    #[error("expected {expected} items, provider returned {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// Two items share an identity.
    #[error("identity {0} appears more than once in the deck")]
    DuplicateIdentity(CardId),

    /// An item has no image to show on its face.
    #[error("item {0} has no image reference")]
    MissingImage(CardId),
}

impl DeckError {
    /// Creates a new `Unavailable` error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Failure of an engine operation that can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `start` was called while a session is running.
    #[error("a session is already running")]
    AlreadyRunning,

    /// The difficulty key does not name a tier.
    #[error("unknown difficulty '{0}'")]
    UnknownDifficulty(String),

    /// The deck provider failed; the session stays idle.
    #[error("deck unavailable: {0}")]
    DeckUnavailable(#[from] DeckError),

    /// A reset or another start replaced the session this start was for.
    #[error("start was superseded by a newer session")]
    Superseded,

    /// The runtime driver task has stopped.
    #[error("session driver is closed")]
    DriverClosed,
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {message}")]
    Invalid {
        /// Detailed error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates a new `Invalid` error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
