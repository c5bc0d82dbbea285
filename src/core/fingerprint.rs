//! Reproducible 64-bit state fingerprints.
//!
//! A board hashes itself by walking its game-relevant state in a fixed order
//! and feeding each element to a `Fingerprinter`. The fingerprinter draws its
//! keys from a ChaCha8 stream re-seeded on every call, so the same walk over
//! the same state always yields the same value, including on a freshly
//! constructed board or in another process.
//!
//! The walk order is part of the format: reordering the calls changes every
//! fingerprint the game has ever produced.
//!
//! ```
//! use rust_boardgame::core::{Fingerprinter, PlayerId};
//!
//! fn hash(cells: &[u8], to_move: PlayerId) -> u64 {
//!     let mut fp = Fingerprinter::new(0x5eed);
//!     for &c in cells {
//!         fp.cell(3, c as usize);
//!     }
//!     fp.player(to_move, 2);
//!     fp.finish().raw()
//! }
//!
//! assert_eq!(hash(&[0, 1, 2], PlayerId::new(0)), hash(&[0, 1, 2], PlayerId::new(0)));
//! assert_ne!(hash(&[0, 1, 2], PlayerId::new(0)), hash(&[0, 2, 1], PlayerId::new(0)));
//! assert_ne!(hash(&[0, 1, 2], PlayerId::new(0)), hash(&[0, 1, 2], PlayerId::new(1)));
//! ```

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// A 64-bit summary of all game-relevant state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Accumulates a fingerprint from a fixed, seeded key sequence.
pub struct Fingerprinter {
    keys: ChaCha8Rng,
    value: u64,
}

impl Fingerprinter {
    /// Start a walk. Each game uses its own constant seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            keys: ChaCha8Rng::seed_from_u64(seed),
            value: 0,
        }
    }

    #[inline]
    fn key(&mut self) -> u64 {
        self.keys.next_u64()
    }

    /// A cell with `variants` possible contents currently holding `value`.
    ///
    /// Always draws `variants` keys so later elements see the same keys no
    /// matter what this cell holds.
    pub fn cell(&mut self, variants: usize, value: usize) -> &mut Self {
        debug_assert!(value < variants, "cell value {value} out of range {variants}");
        for i in 0..variants {
            let k = self.key();
            if i == value {
                self.value ^= k;
            }
        }
        self
    }

    /// An ordered stack of items (held pieces, a pile of tokens).
    ///
    /// Order-significant: `[1, 2]` and `[2, 1]` differ.
    pub fn stack(&mut self, items: &[u64]) -> &mut Self {
        let base = self.key() | 1;
        let mut acc = base;
        for (i, item) in items.iter().enumerate() {
            acc = acc.wrapping_add(
                item.wrapping_add(1)
                    .wrapping_mul(base)
                    .wrapping_mul(i as u64 + 1),
            );
            acc = acc.rotate_left(7);
        }
        self.value ^= acc;
        self
    }

    /// A counter such as claimed tokens or captures.
    pub fn count(&mut self, n: u64) -> &mut Self {
        let k = self.key() | 1;
        self.value ^= k.wrapping_mul(n.wrapping_add(1));
        self
    }

    /// The side to move.
    pub fn player(&mut self, player: PlayerId, player_count: usize) -> &mut Self {
        self.cell(player_count, player.index())
    }

    pub fn flag(&mut self, on: bool) -> &mut Self {
        self.cell(2, usize::from(on))
    }

    #[must_use]
    pub fn finish(&self) -> Fingerprint {
        Fingerprint(self.value)
    }
}
