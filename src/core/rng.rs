//! Deterministic random number generation for session seeds.
//!
//! Randomness only exists at session creation: the initiator draws the
//! layout permutation, the content symbols and the session id from one
//! `GameRng`. Everything downstream is reconstructed from the serialized
//! seeds, so both peers build identical boards.
//!
//! ```
//! use pairsync::core::GameRng;
//!
//! let mut a = GameRng::new(7).for_context("layout");
//! let mut b = GameRng::new(7).for_context("layout");
//! assert_eq!(a.shuffled_indices(20), b.shuffled_indices(20));
//! ```

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hash::{Hash, Hasher};

/// Deterministic RNG backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Create an independent stream for a specific context.
    ///
    /// The same context always produces the same stream from the same seed.
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;

        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        context.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// A uniformly shuffled permutation of `0..n`.
    pub fn shuffled_indices(&mut self, n: usize) -> Vec<u32> {
        let mut indices: Vec<u32> = (0..n as u32).collect();
        self.shuffle(&mut indices);
        indices
    }

    /// `count` distinct values drawn from `0..upper`, in random order.
    ///
    /// Returns `None` if `count > upper`.
    pub fn sample_distinct(&mut self, count: usize, upper: usize) -> Option<Vec<u32>> {
        if count > upper {
            return None;
        }
        let drawn = rand::seq::index::sample(&mut self.inner, upper, count)
            .into_iter()
            .map(|i| i as u32)
            .collect();
        Some(drawn)
    }

    /// Sixteen random bytes, for identifiers.
    pub fn bytes16(&mut self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        self.inner.fill_bytes(&mut bytes);
        bytes
    }
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
    fn test_context_produces_different_sequence() {
        let rng = GameRng::new(42);
        let mut layout = rng.for_context("layout");
        let mut content = rng.for_context("content");

        assert_ne!(layout.shuffled_indices(40), content.shuffled_indices(40));
    }

    #[test]
    fn test_shuffled_indices_is_permutation() {
        let mut rng = GameRng::new(3);
        let mut indices = rng.shuffled_indices(40);
        assert_ne!(indices, (0..40).collect::<Vec<u32>>());

        indices.sort_unstable();
        assert_eq!(indices, (0..40).collect::<Vec<u32>>());
    }

    #[test]
    fn test_sample_distinct() {
        let mut rng = GameRng::new(9);
        let mut drawn = rng.sample_distinct(20, 43).unwrap();
        assert_eq!(drawn.len(), 20);
        assert!(drawn.iter().all(|&v| v < 43));

        drawn.sort_unstable();
        drawn.dedup();
        assert_eq!(drawn.len(), 20);
    }

    #[test]
    fn test_sample_distinct_too_many() {
        assert_eq!(GameRng::new(1).sample_distinct(5, 4), None);
        assert_eq!(GameRng::new(1).sample_distinct(4, 4).map(|v| v.len()), Some(4));
    }

    #[test]
    fn test_bytes16_deterministic() {
        assert_eq!(GameRng::new(5).bytes16(), GameRng::new(5).bytes16());
        assert_ne!(GameRng::new(5).bytes16(), GameRng::new(6).bytes16());
    }
}
