//! Events emitted by the engine for UIs.

use serde::{Deserialize, Serialize};

use crate::core::{CardFace, Position, SessionId, SessionStats};

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

/// Something a renderer should react to.
///
/// Events are queued in the order the state changed and drained with
/// `MatchEngine::drain_events`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A new board was dealt and the countdown started.
    BoardReady {
        session: SessionId,
        total_pairs: usize,
        rows: usize,
        columns: usize,
    },

    /// A card changed face.
    CardChanged { position: Position, face: CardFace },

    /// Click or match counters changed.
    CountersChanged { clicks: u32, matched_pairs: usize },

    /// The countdown moved.
    TimeChanged { remaining_secs: u32 },

    /// The power-up reveal started or ended.
    PowerupChanged { active: bool },

    /// The session ended.
    SessionEnded { outcome: Outcome, stats: SessionStats },

    /// The engine went back to an empty idle session.
    SessionReset { session: SessionId },
}

impl SessionEvent {
    /// The outcome, for `SessionEnded`.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            SessionEvent::SessionEnded { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }
}
