//! Seeded randomness for simulated generator runs.
//!
//! Every random decision in a DST run (which fault fires, which words a
//! simulated lyric uses, which rule a corruption breaks) is drawn from a
//! `DeterministicRng`, so one `DST_SEED` replays one run exactly.

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// Seeded Xoshiro256** stream.
///
/// ```rust
/// use yl_dst::DeterministicRng;
///
/// let adlibs = ["(u)", "(yeah)", "(baby)"];
/// let mut a = DeterministicRng::new(7);
/// let mut b = DeterministicRng::new(7);
/// assert_eq!(a.pick(&adlibs), b.pick(&adlibs));
/// assert_eq!(a.draws_count(), 1);
/// ```
pub struct DeterministicRng {
    seed: u64,
    rng: Xoshiro256StarStar,
    /// Draws taken so far, reported in DST stats
    draws_count: u64,
}

impl DeterministicRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        debug_assert!(seed != 0, "Seed 0 is reserved for 'unset'");

        Self {
            seed,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            draws_count: 0,
        }
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn draws_count(&self) -> u64 {
        self.draws_count
    }

    /// True with the given probability.
    pub fn chance(&mut self, probability: f64) -> bool {
        debug_assert!(
            (0.0..=1.0).contains(&probability),
            "Probability must be in [0.0, 1.0]"
        );
        self.draws_count += 1;
        self.rng.gen_bool(probability)
    }

    /// Uniform value from `range` (line counts, latencies, offsets).
    pub fn in_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.draws_count += 1;
        self.rng.gen_range(range)
    }

    /// Uniform element of `items`, or `None` when it is empty.
    pub fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        let index = self.in_range(0..items.len());
        Some(items[index])
    }

    /// Independent stream for one simulation component.
    ///
    /// Forking in a fixed order gives each component the same stream for
    /// the same master seed.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.draws_count += 1;
        // Zero seeds are rejected by `new`; remap the one-in-2^64 case.
        let seed = self.rng.gen::<u64>().max(1);
        Self::new(seed)
    }
}
