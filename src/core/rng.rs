//! Deterministic random number generation for search and setup.
//!
//! A `GameRng` is seeded explicitly and can be forked into independent,
//! reproducible streams: one per decision in the orchestrator, one per worker
//! thread in MCTS.
//!
//! ```
//! use rust_boardgame::core::GameRng;
//!
//! let mut a = GameRng::new(7);
//! let mut b = GameRng::new(7);
//! assert_eq!(a.gen_range_usize(0..100), b.gen_range_usize(0..100));
//!
//! // Worker streams depend only on the parent seed and the worker index.
//! assert_eq!(a.stream(3).seed(), b.stream(3).seed());
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic ChaCha8-backed RNG with forking.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// The seed this stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork an independent branch. Successive forks differ, and the same
    /// sequence of forks from the same seed is reproducible.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        Self::new(self.seed.wrapping_add(self.fork_counter.wrapping_mul(GOLDEN_GAMMA)))
    }

    /// Derive the stream for worker `index` without advancing this RNG.
    #[must_use]
    pub fn stream(&self, index: usize) -> Self {
        let mixed = (self.seed ^ 0xA076_1D64_78BD_642F)
            .wrapping_add((index as u64 + 1).wrapping_mul(GOLDEN_GAMMA));
        Self::new(mixed.rotate_left(17))
    }

    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Uniform float in `[0, 1)`.
    pub fn gen_f64(&mut self) -> f64 {
        self.inner.gen()
    }

    /// Choose an index with probability proportional to `weights`.
    ///
    /// Returns `None` if weights are empty or sum to zero. Negative weights
    /// count as zero.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
        if weights.is_empty() || total <= 0.0 {
            return None;
        }

        let mut threshold = self.gen_f64() * total;
        let mut last_positive = None;
        for (i, &weight) in weights.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            last_positive = Some(i);
            threshold -= weight;
            if threshold < 0.0 {
                return Some(i);
            }
        }

        // Rounding can leave a sliver of threshold behind.
        last_positive
    }
}
