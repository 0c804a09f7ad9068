//! RNG module - biased cell value generation
//!
//! Produces digit sequences that embed many matchable pairs. Values are built
//! in chunks of up to two: half of the chunks are a "sum to ten" pair
//! `(a, 10 - a)`, the other half a repeated digit `(v, v)`. The whole sequence
//! is shuffled afterwards so that pairs do not sit next to each other.
//!
//! The generator leans towards solvable boards but does not guarantee one;
//! the "add row" intent is the player's way out of a dead end.
//!
//! Also provides a simple LCG for deterministic testing.

use crate::types::{MATCH_SUM, MAX_VALUE, MIN_VALUE};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Scales by multiplication so the result comes from the high bits; the low
    /// bits of a power-of-two LCG have very short periods.
    pub fn next_range(&mut self, max: u32) -> u32 {
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }

    /// Fair coin flip
    pub fn next_bool(&mut self) -> bool {
        self.next_range(2) == 0
    }

    /// Uniform digit in [MIN_VALUE, MAX_VALUE]
    pub fn next_digit(&mut self) -> u8 {
        MIN_VALUE + self.next_range((MAX_VALUE - MIN_VALUE + 1) as u32) as u8
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Current RNG state (for reseeding a follow-up session)
    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Biased digit generator
#[derive(Debug, Clone)]
pub struct ValueGenerator {
    rng: SimpleRng,
}

impl ValueGenerator {
    /// Create a new generator with the given seed
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
        }
    }

    /// Generate `count` digits in [1, 9], biased towards matchable pairs.
    pub fn generate(&mut self, count: usize) -> Vec<u8> {
        let mut values = Vec::with_capacity(count);
        self.generate_into(count, &mut values);
        values
    }

    /// Same as [`generate`](Self::generate) but appends into `out` after clearing it.
    pub fn generate_into(&mut self, count: usize, out: &mut Vec<u8>) {
        out.clear();

        while out.len() < count {
            let chunk = (count - out.len()).min(2);

            if self.rng.next_bool() {
                // a in [1, 9] always yields a complement in [1, 9].
                let a = self.rng.next_digit();
                out.push(a);
                if chunk == 2 {
                    out.push(MATCH_SUM - a);
                }
            } else {
                let v = self.rng.next_digit();
                out.push(v);
                if chunk == 2 {
                    out.push(v);
                }
            }
        }

        self.rng.shuffle(out);
    }

    /// Get the current RNG state (for restarting with a continued sequence)
    pub fn seed(&self) -> u32 {
        self.rng.state()
    }
}

impl Default for ValueGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}
