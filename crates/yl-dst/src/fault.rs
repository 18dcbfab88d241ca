//! Deterministic fault injection for the generation pipeline.
//!
//! Simulates the ways a remote text generator misbehaves, reproducibly:
//! - Transport faults (timeouts, non-2xx statuses, empty candidates)
//! - Latency on successful calls
//! - Structurally corrupted output

use crate::random::DeterministicRng;

/// Statuses a simulated service error picks from.
const SERVICE_STATUSES: [u16; 4] = [429, 500, 503, 504];

/// Configuration for fault injection.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// Probability that a call times out
    pub timeout_probability: f64,
    /// Probability that a call returns a non-2xx status
    pub service_error_probability: f64,
    /// Probability that a call returns no candidate text
    pub empty_probability: f64,
    /// Probability that returned text is structurally corrupted
    pub corruption_probability: f64,
    /// Maximum simulated latency of a call in milliseconds
    pub latency_ms_max: u64,
    /// Whether fault injection is enabled
    pub enabled: bool,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            timeout_probability: 0.1,       // 10% chance
            service_error_probability: 0.1, // 10% chance
            empty_probability: 0.05,        // 5% chance
            corruption_probability: 0.3,    // 30% chance
            latency_ms_max: 3_000,
            enabled: true,
        }
    }
}

impl FaultConfig {
    /// No faults - every call returns well-formed lyrics.
    #[must_use]
    pub fn none() -> Self {
        Self {
            timeout_probability: 0.0,
            service_error_probability: 0.0,
            empty_probability: 0.0,
            corruption_probability: 0.0,
            latency_ms_max: 0,
            enabled: false,
        }
    }

    /// Aggressive faults for stress testing. Most runs end in a failure.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            timeout_probability: 0.3,
            service_error_probability: 0.25,
            empty_probability: 0.15,
            corruption_probability: 0.7,
            latency_ms_max: 45_000,
            enabled: true,
        }
    }

    /// Only transport faults, output is never corrupted.
    #[must_use]
    pub fn transport_only() -> Self {
        Self {
            corruption_probability: 0.0,
            ..Self::aggressive()
        }
    }

    /// Only corrupted output, transport never fails.
    #[must_use]
    pub fn corruption_only() -> Self {
        Self {
            timeout_probability: 0.0,
            service_error_probability: 0.0,
            empty_probability: 0.0,
            corruption_probability: 0.6,
            latency_ms_max: 1_000,
            enabled: true,
        }
    }
}

/// A simulated transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    /// The call exceeded its deadline
    Timeout,
    /// The service answered with a non-2xx status
    ServiceError { status: u16 },
    /// The service answered 2xx with no candidate text
    Empty,
}

/// Deterministic fault injector.
///
/// Uses a seeded RNG to inject faults in a reproducible way.
/// The same seed produces the same fault sequence.
pub struct FaultInjector {
    rng: DeterministicRng,
    config: FaultConfig,
    transport_faults_count: u64,
    corruptions_count: u64,
    latency_ms_total: u64,
}

impl FaultInjector {
    /// Create a new fault injector with the given RNG and config.
    pub fn new(rng: DeterministicRng, config: FaultConfig) -> Self {
        for probability in [
            config.timeout_probability,
            config.service_error_probability,
            config.empty_probability,
            config.corruption_probability,
        ] {
            debug_assert!(
                (0.0..=1.0).contains(&probability),
                "Fault probability must be in [0.0, 1.0]"
            );
        }

        Self {
            rng,
            config,
            transport_faults_count: 0,
            corruptions_count: 0,
            latency_ms_total: 0,
        }
    }

    /// Create with default config.
    pub fn with_default_config(rng: DeterministicRng) -> Self {
        Self::new(rng, FaultConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &FaultConfig {
        &self.config
    }

    /// Decide whether the next call fails at the transport level.
    ///
    /// Faults are checked in a fixed order so a seed maps to one sequence.
    pub fn next_transport_fault(&mut self) -> Option<TransportFault> {
        if !self.config.enabled {
            return None;
        }

        let fault = if self.rng.chance(self.config.timeout_probability) {
            Some(TransportFault::Timeout)
        } else if self.rng.chance(self.config.service_error_probability) {
            let status = self.rng.pick(&SERVICE_STATUSES).unwrap_or(500);
            Some(TransportFault::ServiceError { status })
        } else if self.rng.chance(self.config.empty_probability) {
            Some(TransportFault::Empty)
        } else {
            None
        };

        if fault.is_some() {
            self.transport_faults_count += 1;
        }
        fault
    }

    /// Latency of a call in milliseconds (if any).
    pub fn maybe_latency_ms(&mut self) -> Option<u64> {
        if !self.config.enabled || self.config.latency_ms_max == 0 {
            return None;
        }

        let latency_ms = self.rng.in_range(1..=self.config.latency_ms_max);
        self.latency_ms_total += latency_ms;
        Some(latency_ms)
    }

    /// Check if the returned text should be corrupted.
    pub fn should_corrupt(&mut self) -> bool {
        if !self.config.enabled {
            return false;
        }

        let result = self.rng.chance(self.config.corruption_probability);
        if result {
            self.corruptions_count += 1;
        }
        result
    }

    /// Get statistics about injected faults.
    #[must_use]
    pub fn stats(&self) -> FaultStats {
        FaultStats {
            transport_faults_count: self.transport_faults_count,
            corruptions_count: self.corruptions_count,
            latency_ms_total: self.latency_ms_total,
        }
    }
}

/// Statistics about injected faults.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultStats {
    pub transport_faults_count: u64,
    pub corruptions_count: u64,
    pub latency_ms_total: u64,
}
