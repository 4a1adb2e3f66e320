//! Cards on the board.
//!
//! A `Card` is one of the two copies of a `DeckItem` identity. Its
//! `Position` is fixed at deal time; only its `CardFace` changes.

use serde::{Deserialize, Serialize};

/// Identity shared by the two cards of a pair.
///
/// Opaque to the engine; providers map it to their own catalog ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card identity.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Index of a card in the board sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position(pub usize);

impl Position {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Visible state of a card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardFace {
    /// Hidden; the only face a player can flip.
    #[default]
    FaceDown,
    /// Turned by the player and part of the current selection.
    FaceUp,
    /// Shown by the power-up. Never part of a selection.
    Peeking,
    /// Paired; stays revealed for the rest of the session.
    Matched,
}

impl CardFace {
    /// Whether the card's picture is visible.
    #[must_use]
    pub const fn is_revealed(self) -> bool {
        !matches!(self, CardFace::FaceDown)
    }
}

/// A dealt card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub identity: CardId,
    pub position: Position,
    pub face: CardFace,
}

impl Card {
    /// Create a face-down card.
    #[must_use]
    pub const fn new(identity: CardId, position: Position) -> Self {
        Self {
            identity,
            position,
            face: CardFace::FaceDown,
        }
    }

    #[must_use]
    pub const fn is_matched(&self) -> bool {
        matches!(self.face, CardFace::Matched)
    }
}
