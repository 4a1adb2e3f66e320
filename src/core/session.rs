//! Session snapshot.
//!
//! ## Session
//!
//! Everything a UI needs to render one game:
//! - Phase, difficulty, grid layout
//! - Cards and the deck items behind them
//! - Selection, turn lock, counters
//! - Countdown and power-up state
//!
//! Uses `im` persistent vectors so handing a snapshot to a renderer is O(1).
//! Only the engine mutates a session; everything public here is read-only.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::card::{Card, CardFace, CardId, Position};
use super::config::Difficulty;
use crate::deck::DeckItem;

/// Identifies one session. A new id is issued by every `start` and `reset`,
/// and scheduled callbacks carry the id of the session that created them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The id issued after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

/// Session lifecycle phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No board yet (fresh, reset, or failed start).
    #[default]
    Idle,
    /// Accepting flips; countdown active.
    Running,
    /// Every pair matched.
    Won,
    /// Countdown ran out.
    Lost,
}

impl Phase {
    /// Whether the session has ended.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }
}

/// Statistics reported when a session ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Seconds of the budget used.
    pub elapsed_secs: u32,
    pub clicks: u32,
    pub matched_pairs: usize,
    pub total_pairs: usize,
}

/// Complete state of one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) difficulty: Option<Difficulty>,
    pub(crate) rows: usize,
    pub(crate) columns: usize,

    pub(crate) cards: Vector<Card>,
    pub(crate) items: Vector<DeckItem>,

    /// Positions flipped this turn (at most 2).
    pub(crate) face_up_selection: SmallVec<[Position; 2]>,
    pub(crate) turn_locked: bool,

    pub(crate) matched_pair_count: usize,
    pub(crate) total_pairs: usize,
    pub(crate) click_count: u32,

    pub(crate) time_limit_secs: u32,
    pub(crate) time_remaining_secs: u32,

    pub(crate) phase: Phase,
    pub(crate) powerup_used: bool,
    pub(crate) peek_active: bool,
}

impl Session {
    /// Create an empty idle session.
    #[must_use]
    pub fn idle(id: SessionId) -> Self {
        Self {
            id,
            difficulty: None,
            rows: 0,
            columns: 0,
            cards: Vector::new(),
            items: Vector::new(),
            face_up_selection: SmallVec::new(),
            turn_locked: false,
            matched_pair_count: 0,
            total_pairs: 0,
            click_count: 0,
            time_limit_secs: 0,
            time_remaining_secs: 0,
            phase: Phase::Idle,
            powerup_used: false,
            peek_active: false,
        }
    }

    // === Lifecycle ===

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    /// Grid layout as `(rows, columns)`, once a board is dealt.
    #[must_use]
    pub fn layout(&self) -> Option<(usize, usize)> {
        self.difficulty.map(|_| (self.rows, self.columns))
    }

    // === Board ===

    /// All cards in position order.
    #[must_use]
    pub fn cards(&self) -> &Vector<Card> {
        &self.cards
    }

    /// Card at a position.
    #[must_use]
    pub fn card(&self, position: Position) -> Option<&Card> {
        self.cards.get(position.index())
    }

    /// Deck items dealt into this session.
    #[must_use]
    pub fn items(&self) -> &Vector<DeckItem> {
        &self.items
    }

    /// Deck item behind an identity.
    #[must_use]
    pub fn item(&self, identity: CardId) -> Option<&DeckItem> {
        self.items.iter().find(|item| item.identity == identity)
    }

    /// Positions currently holding a given face.
    pub fn positions_with(&self, face: CardFace) -> impl Iterator<Item = Position> + '_ {
        self.cards
            .iter()
            .filter(move |card| card.face == face)
            .map(|card| card.position)
    }

    // === Turn ===

    #[must_use]
    pub fn face_up_selection(&self) -> &[Position] {
        &self.face_up_selection
    }

    #[must_use]
    pub fn is_turn_locked(&self) -> bool {
        self.turn_locked
    }

    // === Counters ===

    #[must_use]
    pub fn matched_pair_count(&self) -> usize {
        self.matched_pair_count
    }

    #[must_use]
    pub fn total_pairs(&self) -> usize {
        self.total_pairs
    }

    #[must_use]
    pub fn click_count(&self) -> u32 {
        self.click_count
    }

    /// Whether every pair has been matched.
    #[must_use]
    pub fn all_matched(&self) -> bool {
        self.total_pairs > 0 && self.matched_pair_count == self.total_pairs
    }

    // === Timing ===

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn time_remaining_secs(&self) -> u32 {
        self.time_remaining_secs
    }

    // === Power-up ===

    #[must_use]
    pub fn powerup_used(&self) -> bool {
        self.powerup_used
    }

    #[must_use]
    pub fn is_peek_active(&self) -> bool {
        self.peek_active
    }

    /// Statistics as of now.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            elapsed_secs: self.time_limit_secs.saturating_sub(self.time_remaining_secs),
            clicks: self.click_count,
            matched_pairs: self.matched_pair_count,
            total_pairs: self.total_pairs,
        }
    }

    /// Describe the first violated structural invariant, if any.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.face_up_selection.len() > 2 {
            return Err(format!("selection holds {} cards", self.face_up_selection.len()));
        }

        for &position in &self.face_up_selection {
            match self.card(position) {
                None => return Err(format!("selection references missing card {position}")),
                Some(card) if card.is_matched() => {
                    return Err(format!("matched card {position} is selected"));
                }
                Some(_) => {}
            }
        }

        if self.cards.len() != self.total_pairs * 2 {
            return Err(format!(
                "{} cards for {} pairs",
                self.cards.len(),
                self.total_pairs
            ));
        }

        let matched = self.cards.iter().filter(|card| card.is_matched()).count();
        if matched != self.matched_pair_count * 2 {
            return Err(format!(
                "{matched} matched cards but matched_pair_count is {}",
                self.matched_pair_count
            ));
        }

        let mut copies: FxHashMap<CardId, usize> = FxHashMap::default();
        for (index, card) in self.cards.iter().enumerate() {
            if card.position.index() != index {
                return Err(format!("card at index {index} claims position {}", card.position));
            }
            *copies.entry(card.identity).or_insert(0) += 1;
        }
        if let Some((identity, count)) = copies.iter().find(|(_, &count)| count != 2) {
            return Err(format!("{identity} appears {count} times"));
        }

        if self.time_remaining_secs > self.time_limit_secs {
            return Err("time remaining exceeds the limit".to_string());
        }
        if self.phase == Phase::Running && self.time_remaining_secs == 0 {
            return Err("running with no time left".to_string());
        }

        Ok(())
    }

    // === Engine mutation ===

    /// Set a card's face. Returns whether it changed.
    pub(crate) fn set_face(&mut self, position: Position, face: CardFace) -> bool {
        match self.cards.get_mut(position.index()) {
            Some(card) if card.face != face => {
                card.face = face;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn face(&self, position: Position) -> Option<CardFace> {
        self.card(position).map(|card| card.face)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::card::Card;

    fn dealt(identities: &[u32]) -> Session {
        let mut session = Session::idle(SessionId::new(1));
        session.cards = identities
            .iter()
            .enumerate()
            .map(|(i, &id)| Card::new(CardId::new(id), Position::new(i)))
            .collect();
        session.total_pairs = identities.len() / 2;
        session.time_limit_secs = 60;
        session.time_remaining_secs = 60;
        session.phase = Phase::Running;
        session
    }

    #[test]
    fn test_idle_session() {
        let session = Session::idle(SessionId::new(3));
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.click_count(), 0);
        assert!(session.layout().is_none());
        assert!(!session.all_matched());
        assert!(session.check_invariants().is_ok());
    }

    #[test]
    fn test_session_id_next() {
        assert_eq!(SessionId::new(4).next(), SessionId::new(5));
        assert_eq!(SessionId::new(4).to_string(), "Session(4)");
    }

    #[test]
    fn test_invariants_hold_on_fresh_board() {
        let session = dealt(&[1, 2, 1, 3, 2, 3]);
        assert!(session.check_invariants().is_ok());
    }

    #[test]
    fn test_invariants_catch_triplicate() {
        let session = dealt(&[1, 1, 1, 2]);
        let err = session.check_invariants().unwrap_err();
        assert!(err.contains("appears"));
    }

    #[test]
    fn test_invariants_catch_selected_matched_card() {
        let mut session = dealt(&[1, 1, 2, 2]);
        session.set_face(Position::new(0), CardFace::Matched);
        session.set_face(Position::new(1), CardFace::Matched);
        session.matched_pair_count = 1;
        assert!(session.check_invariants().is_ok());

        session.face_up_selection.push(Position::new(0));
        assert!(session.check_invariants().is_err());
    }

    #[test]
    fn test_invariants_catch_matched_count_drift() {
        let mut session = dealt(&[1, 1, 2, 2]);
        session.set_face(Position::new(0), CardFace::Matched);
        session.set_face(Position::new(1), CardFace::Matched);
        assert!(session.check_invariants().is_err());
    }

    #[test]
    fn test_set_face_reports_change() {
        let mut session = dealt(&[1, 1]);
        assert!(session.set_face(Position::new(0), CardFace::FaceUp));
        assert!(!session.set_face(Position::new(0), CardFace::FaceUp));
        assert!(!session.set_face(Position::new(9), CardFace::FaceUp));
        assert_eq!(session.face(Position::new(0)), Some(CardFace::FaceUp));
        assert_eq!(session.positions_with(CardFace::FaceDown).collect::<Vec<_>>(), vec![Position::new(1)]);
    }

    #[test]
    fn test_stats() {
        let mut session = dealt(&[1, 1]);
        session.time_remaining_secs = 45;
        session.click_count = 4;
        let stats = session.stats();
        assert_eq!(stats.elapsed_secs, 15);
        assert_eq!(stats.clicks, 4);
        assert_eq!(stats.total_pairs, 1);
    }
}
