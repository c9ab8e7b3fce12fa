//! Random sources for the non-linearizable policy.
//!
//! The derivers are pure except for two points of randomness: which eligible
//! write a non-linearizable read observes, and how long a write takes to
//! propagate to the shared register. Both go through [`RandomSource`] so
//! playback uses OS entropy while tests substitute a seeded stream.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use rand::Rng;

/// Source of uniform random values.
///
/// Implementations use interior mutability so a source can be shared behind
/// an `Arc` by an engine and its background tasks.
pub trait RandomSource: Send + Sync {
    /// Next value in `[0.0, 1.0)`.
    fn next_f64(&self) -> f64;

    /// Uniform index in `[0, len)`. A `len` of zero returns zero.
    fn pick(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            (self.next_f64() * len as f64) as usize % len
        }
    }
}

/// OS-seeded source, the playback default.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn next_f64(&self) -> f64 {
        rand::rng().random_range(0.0..1.0)
    }
}

/// Seeded xorshift64 source. Same seed, same sequence.
#[derive(Debug)]
pub struct SeededRandom {
    state: AtomicU64,
}

impl SeededRandom {
    /// Seed of 0 is converted to 1 (xorshift requires non-zero state).
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 1 } else { seed };
        Self {
            state: AtomicU64::new(seed),
        }
    }

    pub fn next_u64(&self) -> u64 {
        let mut next = 0;
        let _ = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |mut state| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                next = state;
                Some(state)
            });
        next
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }
}

impl Clone for SeededRandom {
    fn clone(&self) -> Self {
        Self {
            state: AtomicU64::new(self.state.load(Ordering::SeqCst)),
        }
    }
}

/// Source that cycles through a fixed list of values.
///
/// Useful in tests that need to steer a specific branch, e.g. forcing the
/// non-linearizable read to pick the first or last eligible write.
#[derive(Debug)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: AtomicUsize,
}

impl SequenceRandom {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let at = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.values[at % self.values.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let a = SeededRandom::new(12345);
        let b = SeededRandom::new(12345);

        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn zero_seed_works() {
        let rng = SeededRandom::new(0);
        let _ = rng.next_u64();
    }

    #[test]
    fn next_f64_range() {
        let rng = SeededRandom::new(42);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn pick_stays_in_bounds() {
        let rng = SeededRandom::new(7);
        for _ in 0..1000 {
            assert!(rng.pick(3) < 3);
        }
        assert_eq!(rng.pick(0), 0);
    }

    #[test]
    fn sequence_cycles() {
        let rng = SequenceRandom::new(vec![0.0, 0.5]);
        assert_eq!(rng.next_f64(), 0.0);
        assert_eq!(rng.next_f64(), 0.5);
        assert_eq!(rng.next_f64(), 0.0);
    }
}
