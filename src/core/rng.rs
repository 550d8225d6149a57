//! Deterministic Random Number Generator
//!
//! Xorshift128+ PRNG for fast, high-quality, deterministic randomness.
//! Given the same seed, produces an identical sequence on all platforms,
//! which is what makes seeded CPU opponents and replays reproducible.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::fixed::Fixed;

/// Deterministic PRNG using the Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use duel_engine::core::rng::DeterministicRng;
///
/// let mut rng = DeterministicRng::new(12345);
/// let a = rng.next_u64();
/// let b = DeterministicRng::new(12345).next_u64();
/// assert_eq!(a, b);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // State must never be all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random u32.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % max as u64) as u32
    }

    /// Generate a random integer in range [min, max].
    #[inline]
    pub fn next_int_range(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let range = (max - min + 1) as u32;
        min + self.next_int(range) as i32
    }

    /// Generate a random Fixed in range [0, max).
    #[inline]
    pub fn next_fixed(&mut self, max: Fixed) -> Fixed {
        if max <= 0 {
            return 0;
        }
        // Upper 32 bits avoid overflow in the scaling multiply
        let raw = (self.next_u64() >> 32) as u32;
        ((raw as i64 * max as i64) >> 32) as Fixed
    }

    /// Flip a coin with probability num/denom.
    #[inline]
    pub fn chance(&mut self, num: u32, denom: u32) -> bool {
        if denom == 0 {
            return false;
        }
        self.next_int(denom) < num
    }
}

/// SplitMix64 step, used for seeding.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a match seed from the match id and both profile ids.
///
/// Gives hosts a canonical way to produce the descriptor `seed` so that
/// neither peer can pick it unilaterally. Profile ids are sorted before
/// hashing so both peers derive the same value.
pub fn derive_match_seed(match_id: &[u8; 16], profile_ids: &[[u8; 16]]) -> u64 {
    let mut sorted: Vec<[u8; 16]> = profile_ids.to_vec();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update(b"DUEL_MATCH_SEED_V1");
    hasher.update(match_id);
    for id in &sorted {
        hasher.update(id);
    }

    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

// =============================================================================
// TESTS
// =============================================================================
