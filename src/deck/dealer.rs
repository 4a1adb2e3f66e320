//! Dealing: pair every item, shuffle, number the positions.

use im::Vector;

use super::DeckItem;
use crate::core::{Card, CardId, GameRng, Position};

/// Lay out a board for `items`.
///
/// Every identity is duplicated once, the sequence is shuffled with
/// Fisher-Yates, and the resulting order becomes each card's position.
pub fn deal(items: &[DeckItem], rng: &mut GameRng) -> Vector<Card> {
    let mut identities: Vec<CardId> = items
        .iter()
        .flat_map(|item| [item.identity, item.identity])
        .collect();

    rng.shuffle(&mut identities);

    identities
        .into_iter()
        .enumerate()
        .map(|(index, identity)| Card::new(identity, Position::new(index)))
        .collect()
}
