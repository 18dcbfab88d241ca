//! DST environment combining clock, RNG and fault injector.
//!
//! The `DstEnv` is the central context for deterministic simulation tests
//! of the generation pipeline. It plays the remote generator: every call to
//! `simulate_call` consumes simulated latency and returns either a transport
//! fault or lyrics (well-formed, noisy, or corrupted).

use std::sync::Arc;

use crate::clock::SimClock;
use crate::fault::{FaultConfig, FaultInjector, TransportFault};
use crate::lyrics::{add_noise, well_formed_lyrics, Corruption};
use crate::random::DeterministicRng;

/// Probability that clean output is wrapped in sanitizer-tolerated noise.
const NOISE_PROBABILITY: f64 = 0.3;

/// Complete DST environment.
///
/// Combines all DST components with a single seed for full reproducibility.
/// Given the same seed, all behavior is deterministic.
///
/// # Usage
///
/// ```rust
/// use yl_dst::{DstEnv, FaultConfig};
///
/// let mut env = DstEnv::with_fault_config(12345, FaultConfig::none());
///
/// let output = env.simulate_call().unwrap();
/// assert!(output.contains("[Outro]"));
/// assert!(env.clock().now_ms() == 0);
/// ```
pub struct DstEnv {
    seed: u64,
    clock: Arc<SimClock>,
    rng: DeterministicRng,
    fault: FaultInjector,
    calls_count: u64,
    corrupted_count: u64,
    last_corruption: Option<Corruption>,
}

impl DstEnv {
    /// Create a new DST environment with the given seed.
    ///
    /// All components are initialized deterministically from this seed.
    pub fn new(seed: u64) -> Self {
        Self::with_fault_config(seed, FaultConfig::default())
    }

    /// Create with custom fault configuration.
    pub fn with_fault_config(seed: u64, fault_config: FaultConfig) -> Self {
        debug_assert!(seed != 0, "Seed should not be zero");

        let mut master_rng = DeterministicRng::new(seed);

        // Derive seeds for each component
        let rng = master_rng.fork();
        let fault_rng = master_rng.fork();

        Self {
            seed,
            clock: Arc::new(SimClock::new()),
            rng,
            fault: FaultInjector::new(fault_rng, fault_config),
            calls_count: 0,
            corrupted_count: 0,
            last_corruption: None,
        }
    }

    /// Get the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the clock.
    #[must_use]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Shared handle to the clock, for simulated sleepers.
    #[must_use]
    pub fn clock_handle(&self) -> Arc<SimClock> {
        Arc::clone(&self.clock)
    }

    /// Get mutable access to the RNG.
    pub fn rng(&mut self) -> &mut DeterministicRng {
        &mut self.rng
    }

    /// Get mutable access to the fault injector.
    pub fn fault(&mut self) -> &mut FaultInjector {
        &mut self.fault
    }

    /// Corruption applied by the most recent call, if any.
    #[must_use]
    pub fn last_corruption(&self) -> Option<Corruption> {
        self.last_corruption
    }

    /// One simulated generator call.
    ///
    /// Advances the clock by the injected latency, then returns a transport
    /// fault or the generated text.
    pub fn simulate_call(&mut self) -> Result<String, TransportFault> {
        self.calls_count += 1;
        self.last_corruption = None;

        if let Some(latency_ms) = self.fault.maybe_latency_ms() {
            self.clock.advance_ms(latency_ms);
        }

        if let Some(fault) = self.fault.next_transport_fault() {
            return Err(fault);
        }

        let lyrics = well_formed_lyrics(&mut self.rng);

        if self.fault.should_corrupt() {
            let corruption = Corruption::random(&mut self.rng);
            self.corrupted_count += 1;
            self.last_corruption = Some(corruption);
            return Ok(corruption.apply(&lyrics, &mut self.rng));
        }

        if self.rng.chance(NOISE_PROBABILITY) {
            return Ok(add_noise(&lyrics, &mut self.rng));
        }
        Ok(lyrics)
    }

    /// Format seed for reproduction.
    #[must_use]
    pub fn format_seed(&self) -> String {
        format!("DST_SEED={}", self.seed)
    }

    /// Get environment statistics.
    #[must_use]
    pub fn stats(&self) -> DstStats {
        let fault = self.fault.stats();
        DstStats {
            seed: self.seed,
            time_ms: self.clock.now_ms(),
            calls_count: self.calls_count,
            transport_faults_count: fault.transport_faults_count,
            corrupted_count: self.corrupted_count,
            rng_draws: self.rng.draws_count(),
        }
    }
}

/// Statistics from a DST run.
#[derive(Debug, Clone)]
pub struct DstStats {
    pub seed: u64,
    pub time_ms: u64,
    pub calls_count: u64,
    pub transport_faults_count: u64,
    pub corrupted_count: u64,
    pub rng_draws: u64,
}

impl std::fmt::Display for DstStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DstStats {{ seed: {}, time: {}ms, calls: {}, transport faults: {}, corrupted: {}, rng draws: {} }}",
            self.seed,
            self.time_ms,
            self.calls_count,
            self.transport_faults_count,
            self.corrupted_count,
            self.rng_draws
        )
    }
}
