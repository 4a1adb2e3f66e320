//! The deck provider boundary.
//!
//! The engine asks a provider for `pair_count` distinct items and checks
//! whatever comes back with [`validate_deck`] before dealing. Providers are
//! free to hit the network; the engine never retries.

use std::future::Future;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::DeckItem;
use crate::core::DeckError;

/// Source of distinct card identities and their art.
///
/// Implementations must fail rather than return fewer than `pair_count`
/// items. A returned deck is treated as final: it is dealt as-is.
pub trait DeckProvider: Send + Sync {
    /// Request `pair_count` items with distinct identities.
    fn request_deck(
        &self,
        pair_count: usize,
    ) -> impl Future<Output = Result<Vec<DeckItem>, DeckError>> + Send;
}

impl<P: DeckProvider> DeckProvider for Arc<P> {
    fn request_deck(
        &self,
        pair_count: usize,
    ) -> impl Future<Output = Result<Vec<DeckItem>, DeckError>> + Send {
        (**self).request_deck(pair_count)
    }
}

/// Check a provider's deck: exact count, distinct identities, non-blank images.
pub fn validate_deck(items: &[DeckItem], pair_count: usize) -> Result<(), DeckError> {
    if items.len() != pair_count {
        return Err(DeckError::CountMismatch {
            expected: pair_count,
            actual: items.len(),
        });
    }

    let mut seen = FxHashSet::default();
    for item in items {
        if !seen.insert(item.identity) {
            return Err(DeckError::DuplicateIdentity(item.identity));
        }
        if item.image_ref.trim().is_empty() {
            return Err(DeckError::MissingImage(item.identity));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardId;

    fn item(id: u32) -> DeckItem {
        DeckItem::new(CardId::new(id), format!("creature-{id}"), format!("img/{id}.png"))
    }

    #[test]
    fn test_valid_deck() {
        let items = vec![item(1), item(2), item(3)];
        assert!(validate_deck(&items, 3).is_ok());
    }

    #[test]
    fn test_short_deck() {
        let items = vec![item(1), item(2)];
        assert_eq!(
            validate_deck(&items, 3),
            Err(DeckError::CountMismatch { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_duplicate_identity() {
        let items = vec![item(1), item(2), item(1)];
        assert_eq!(
            validate_deck(&items, 3),
            Err(DeckError::DuplicateIdentity(CardId::new(1)))
        );
    }

    #[test]
    fn test_blank_image() {
        let mut items = vec![item(1), item(2)];
        items[1].image_ref = "  ".to_string();
        assert_eq!(validate_deck(&items, 2), Err(DeckError::MissingImage(CardId::new(2))));
    }
}
