//! # yl-dst
//!
//! Deterministic Simulation Testing for the lyric generation pipeline.
//!
//! Provides deterministic simulation of time, randomness and generator
//! faults. All behavior is reproducible via a seed.
//!
//! ## Usage
//!
//! ```rust
//! use yl_dst::{Corruption, DeterministicRng, DstEnv};
//!
//! let mut env = DstEnv::new(12345);
//!
//! // Deterministic time
//! env.clock().advance_ms(600);
//!
//! // Deterministic generator calls
//! match env.simulate_call() {
//!     Ok(text) => assert!(!text.is_empty()),
//!     Err(fault) => println!("transport fault: {:?}", fault),
//! }
//!
//! // Targeted corruption of well-formed lyrics
//! let mut rng = DeterministicRng::new(7);
//! let lyrics = yl_dst::well_formed_lyrics(&mut rng);
//! let broken = Corruption::DropPhrase.apply(&lyrics, &mut rng);
//! assert!(!yl_core::validate(&broken).is_valid());
//! ```
//!
//! ## Reproducibility
//!
//! To reproduce a failing test:
//! ```bash
//! DST_SEED=12345 cargo test
//! ```

pub mod clock;
pub mod env;
pub mod fault;
pub mod lyrics;
pub mod random;

pub use clock::SimClock;
pub use env::{DstEnv, DstStats};
pub use fault::{FaultConfig, FaultInjector, FaultStats, TransportFault};
pub use lyrics::{add_noise, well_formed_lyrics, Corruption};
pub use random::DeterministicRng;

/// Get DST seed from environment or generate random one.
///
/// Prints the seed for reproduction. Use `DST_SEED=<seed>` to reproduce.
/// An unparsable or zero `DST_SEED` is reported and replaced by a random seed.
#[must_use]
pub fn get_or_generate_seed() -> u64 {
    if let Ok(value) = std::env::var("DST_SEED") {
        match parse_seed(&value) {
            Some(seed) => {
                println!("DST_SEED={} (from environment)", seed);
                return seed;
            }
            None => println!("DST_SEED={:?} rejected: expected a non-zero u64", value),
        }
    }

    let seed = rand::random::<u64>().max(1);
    println!("DST_SEED={} (randomly generated)", seed);
    seed
}

/// A usable seed: a non-zero `u64`, surrounding whitespace ignored.
#[must_use]
pub fn parse_seed(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|seed| *seed != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("12345"), Some(12345));
        assert_eq!(parse_seed(" 42\n"), Some(42));
        assert_eq!(parse_seed("0"), None);
        assert_eq!(parse_seed("-1"), None);
        assert_eq!(parse_seed("seed"), None);
        assert_eq!(parse_seed(""), None);
    }
}
