//! Deck items: what a provider hands to the engine.

use serde::{Deserialize, Serialize};

use crate::core::CardId;

/// One distinct catalog entry. Each becomes two cards.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeckItem {
    /// Identity shared by the pair.
    pub identity: CardId,

    /// Name shown under the picture.
    pub display_name: String,

    /// Image URL or asset path for the card face.
    pub image_ref: String,
}

impl DeckItem {
    /// Create a deck item.
    pub fn new(identity: CardId, display_name: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            identity,
            display_name: display_name.into(),
            image_ref: image_ref.into(),
        }
    }
}
