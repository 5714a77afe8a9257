//! Seeded RNG — counter-based SplitMix64 for deterministic stage generation.
//!
//! All randomness in the generator goes through `StageRng` so that
//! `generate(family, seed)` is a pure function: same seed, same stage,
//! reproducible across runs and platforms. The state is a plain value
//! (seed + call counter), so cloning a generator mid-stream forks the
//! exact sequence.

use serde::{Deserialize, Serialize};

/// RNG state carried by the stage generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRng {
    pub seed: u64,
    pub counter: u64,
}

impl StageRng {
    /// Create an RNG with the given seed (counter starts at 0).
    pub fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    /// Next raw 64-bit value. Advances the counter by 1.
    pub fn next_u64(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(1);
        splitmix64(self.seed.wrapping_add(self.counter))
    }

    /// Next random f64 in [0, 1), from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Random u32 in [min, max] inclusive.
    pub fn next_int(&mut self, min: u32, max: u32) -> u32 {
        debug_assert!(min <= max);
        let span = (max - min) as u64 + 1;
        min + (self.next_u64() % span) as u32
    }

    /// Fisher-Yates shuffle, top-down.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = (self.next_u64() % (i as u64 + 1)) as usize;
            slice.swap(i, j);
        }
    }

    /// Pick a random index from `[0, len)`. Returns `None` if len is 0.
    pub fn random_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some((self.next_u64() % len as u64) as usize)
    }

    /// Flip a coin with probability `p` of true.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// SplitMix64 — one multiply-xorshift pass per output, seedable, no state
/// beyond the input word.
fn splitmix64(input: u64) -> u64 {
    let mut z = input.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Golden values pinned so the sequence can never drift silently.
    const SEED_42_EXPECTED: [u64; 8] = [
        13432527470776545160,
        18105923034897077331,
        17864077645780634326,
        13469799137962766343,
        8913683988413733765,
        291080821224767267,
        2038608524547893592,
        13477024926058894539,
    ];

    const SEED_0_EXPECTED: [u64; 4] = [
        10451216379200822465,
        10905525725756348110,
        2092789425003139053,
        7958955049054603978,
    ];

    #[test]
    fn golden_sequence_seed_42() {
        let mut rng = StageRng::new(42);
        for (i, &expected) in SEED_42_EXPECTED.iter().enumerate() {
            let actual = rng.next_u64();
            assert_eq!(actual, expected, "seed=42, index={i}");
        }
    }

    #[test]
    fn golden_sequence_seed_0() {
        let mut rng = StageRng::new(0);
        for (i, &expected) in SEED_0_EXPECTED.iter().enumerate() {
            let actual = rng.next_u64();
            assert_eq!(actual, expected, "seed=0, index={i}");
        }
    }

    #[test]
    fn deterministic_same_seed() {
        let mut rng1 = StageRng::new(42);
        let mut rng2 = StageRng::new(42);
        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut rng1 = StageRng::new(42);
        let mut rng2 = StageRng::new(43);
        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn f64_in_unit_interval() {
        let mut rng = StageRng::new(12345);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "value {v} out of [0, 1)");
        }
    }

    #[test]
    fn next_int_inclusive_bounds() {
        let mut rng = StageRng::new(42);
        assert_eq!(rng.next_int(0, 5), 4);

        let mut rng2 = StageRng::new(999);
        for _ in 0..1000 {
            let v = rng2.next_int(3, 7);
            assert!((3..=7).contains(&v), "next_int {v} out of [3, 7]");
        }
    }

    #[test]
    fn shuffle_golden() {
        let mut rng = StageRng::new(42);
        let mut arr: Vec<usize> = (0..10).collect();
        rng.shuffle(&mut arr);
        assert_eq!(arr, vec![1, 4, 5, 8, 2, 7, 3, 6, 9, 0]);
        assert_eq!(rng.counter, 9);
    }

    #[test]
    fn shuffle_empty_and_single() {
        let mut rng = StageRng::new(42);
        let mut empty: Vec<u32> = vec![];
        rng.shuffle(&mut empty);
        assert_eq!(rng.counter, 0);

        let mut single = vec![42u32];
        rng.shuffle(&mut single);
        assert_eq!(single, vec![42]);
        assert_eq!(rng.counter, 0);
    }

    #[test]
    fn random_index_empty() {
        let mut rng = StageRng::new(42);
        assert_eq!(rng.random_index(0), None);
        assert_eq!(rng.counter, 0);
    }

    #[test]
    fn random_index_in_range() {
        let mut rng = StageRng::new(42);
        assert_eq!(rng.random_index(5), Some(0));
        for _ in 0..100 {
            let idx = rng.random_index(5).unwrap();
            assert!(idx < 5);
        }
    }

    #[test]
    fn counter_advances_per_draw() {
        let mut rng = StageRng::new(42);
        assert_eq!(rng.counter, 0);
        rng.next_u64();
        assert_eq!(rng.counter, 1);
        rng.next_f64();
        assert_eq!(rng.counter, 2);
        rng.next_int(0, 10);
        assert_eq!(rng.counter, 3);
    }
}
