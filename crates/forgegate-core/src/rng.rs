//! Deterministic PRNG for level generation and spawn jitter.
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, excellent
//! statistical properties, and trivially serializable.

use crate::fixed::Fixed64;

/// SplitMix64 pseudo-random number generator.
///
/// Deterministic across platforms, so a seed fully describes a level.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `[0, n)`. Returns 0 when `n == 0`.
    pub fn next_range(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        // Modulo bias is negligible for the small ranges used here
        // (block template counts, spawn slots).
        self.next_u64() % n
    }

    /// Returns `true` with the given probability (Fixed64 in [0, 1]).
    pub fn chance(&mut self, probability: Fixed64) -> bool {
        if probability <= Fixed64::ZERO {
            return false;
        }
        if probability >= Fixed64::ONE {
            return true;
        }
        // Q32.32: for p in (0,1) the raw bits hold the fraction scaled to
        // [0, 2^32). Compare against a uniform u32 draw.
        let upper = (self.next_u64() >> 32) as u64;
        upper < self.next_probability_raw(probability)
    }

    fn next_probability_raw(&self, probability: Fixed64) -> u64 {
        probability.to_bits() as u64
    }

    /// Get the internal state (for hashing/diagnostics).
    pub fn state(&self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn next_range_in_bounds() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            assert!(rng.next_range(13) < 13);
        }
        assert_eq!(rng.next_range(0), 0);
    }

    #[test]
    fn chance_extremes() {
        let mut rng = SimRng::new(999);
        for _ in 0..100 {
            assert!(!rng.chance(Fixed64::ZERO));
            assert!(rng.chance(Fixed64::ONE));
        }
        assert!(!rng.chance(Fixed64::from_num(-1)));
        assert!(rng.chance(Fixed64::from_num(2)));
    }

    #[test]
    fn chance_half_roughly_balanced() {
        let mut rng = SimRng::new(12345);
        let half = Fixed64::from_num(0.5);
        let hits = (0..10_000).filter(|_| rng.chance(half)).count();
        assert!((4000..=6000).contains(&hits), "expected ~5000, got {hits}");
    }
}
