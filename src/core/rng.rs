//! Deterministic random number generation for dealing and sampling.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical deals
//! - **Forkable**: Each session deals from its own branch
//! - **Streams**: Independent sequences keyed by a counter (one per deck request)
//! - **Checkpointable**: [`GameRngState`] captures the exact position, so an
//!   engine can be rebuilt and keep dealing the same boards
//!
//! ```
//! use memory_match::core::GameRng;
//!
//! let mut rng = GameRng::new(42);
//! let mut deal = rng.fork();
//!
//! let mut board = vec![1, 1, 2, 2, 3, 3];
//! deal.shuffle(&mut board);
//! assert_eq!(board.len(), 6);
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Golden-ratio increment used to spread derived seeds.
const SEED_SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic RNG backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Create an RNG seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork this RNG to create an independent branch.
    ///
    /// Each fork produces a different but deterministic sequence.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        Self::new(derive_seed(self.seed, self.fork_counter))
    }

    /// Independent stream number `index` of `seed`.
    ///
    /// Unlike [`fork`](Self::fork) this needs no mutable access, so shared
    /// providers can derive a fresh stream per request from an atomic counter.
    #[must_use]
    pub fn stream(seed: u64, index: u64) -> Self {
        Self::new(derive_seed(seed, index.wrapping_add(1)))
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Shuffle a slice in place with Fisher-Yates.
    ///
    /// Walks from the last index down to 1 and swaps each slot with a
    /// uniformly chosen slot at or below it.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.gen_range_usize(0..i + 1);
            slice.swap(i, j);
        }
    }

    /// Pick `amount` distinct indices from `0..length`, in random order.
    ///
    /// Returns `None` when `amount > length`.
    pub fn sample_indices(&mut self, length: usize, amount: usize) -> Option<Vec<usize>> {
        if amount > length {
            return None;
        }
        Some(rand::seq::index::sample(&mut self.inner, length, amount).into_vec())
    }

    /// Capture the current position.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
            fork_counter: self.fork_counter,
        }
    }

    /// Rebuild an RNG at a captured position.
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
            fork_counter: state.fork_counter,
        }
    }
}

/// Serializable position of a [`GameRng`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    pub seed: u64,
    /// ChaCha8 word position.
    pub word_pos: u128,
    /// Forks taken so far.
    pub fork_counter: u64,
}

fn derive_seed(seed: u64, counter: u64) -> u64 {
    seed.wrapping_add(counter.wrapping_mul(SEED_SPREAD))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen_range_usize(0..1000), rng2.gen_range_usize(0..1000));
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut rng1 = GameRng::new(1);
        let mut rng2 = GameRng::new(2);

        let seq1: Vec<_> = (0..10).map(|_| rng1.gen_range_usize(0..1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| rng2.gen_range_usize(0..1000)).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_fork_is_deterministic() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);

        let forked1 = rng1.fork();
        let forked2 = rng2.fork();
        assert_eq!(forked1.seed(), forked2.seed());

        // Successive forks differ
        let forked3 = rng1.fork();
        assert_ne!(forked1.seed(), forked3.seed());
    }

    #[test]
    fn test_streams_differ_by_index() {
        let mut a = GameRng::stream(7, 0);
        let mut b = GameRng::stream(7, 1);

        let seq1: Vec<_> = (0..10).map(|_| a.gen_range_usize(0..1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| b.gen_range_usize(0..1000)).collect();
        assert_ne!(seq1, seq2);

        assert_eq!(GameRng::stream(7, 3).seed(), GameRng::stream(7, 3).seed());
    }

    #[test]
    fn test_shuffle() {
        let mut rng = GameRng::new(42);
        let mut data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let original = data.clone();

        rng.shuffle(&mut data);

        // Same elements, different order (very likely)
        assert_ne!(data, original);
        data.sort();
        assert_eq!(data, original);
    }

    #[test]
    fn test_shuffle_trivial_slices() {
        let mut rng = GameRng::new(1);

        let mut empty: Vec<u8> = vec![];
        rng.shuffle(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![9];
        rng.shuffle(&mut single);
        assert_eq!(single, vec![9]);
    }

    #[test]
    fn test_sample_indices() {
        let mut rng = GameRng::new(42);

        let picked = rng.sample_indices(151, 12).unwrap();
        assert_eq!(picked.len(), 12);
        assert!(picked.iter().all(|&i| i < 151));

        let mut unique = picked.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 12);

        assert!(rng.sample_indices(3, 4).is_none());
        assert_eq!(rng.sample_indices(3, 0), Some(vec![]));
    }

    #[test]
    fn test_state_restores_position_and_forks() {
        let mut rng = GameRng::new(5);
        rng.gen_range_usize(0..100);
        let _ = rng.fork();

        let json = serde_json::to_string(&rng.state()).unwrap();
        let state: GameRngState = serde_json::from_str(&json).unwrap();
        let mut restored = GameRng::from_state(&state);

        assert_eq!(restored.gen_range_usize(0..1000), rng.gen_range_usize(0..1000));
        assert_eq!(restored.fork().seed(), rng.fork().seed());
    }
}
