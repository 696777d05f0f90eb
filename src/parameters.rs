//! Run-scoped and iteration-scoped parameters.
//!
//! `TestParameters` configures a whole run and is immutable once the run
//! starts. `GenParameters` is what a generator sees for one iteration: the
//! current size plus a seeded random stream owned by exactly one worker.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PropertyError, PropertyResult};

/// Minimum number of successful iterations before a property passes
pub const DEFAULT_MIN_SUCCESSFUL_TESTS: usize = 100;

/// Discards tolerated per success before the run is exhausted
pub const DEFAULT_MAX_DISCARD_RATIO: f64 = 5.0;

/// Largest size handed to generators
pub const DEFAULT_MAX_SIZE: usize = 100;

/// Maximum number of accepted shrinks per falsification
pub const DEFAULT_MAX_SHRINK_COUNT: usize = 1000;

/// Configuration for one property run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestParameters {
    /// Successful iterations required for the property to pass
    pub min_successful_tests: usize,

    /// Discards allowed per success before giving up
    pub max_discard_ratio: f64,

    /// Number of parallel workers; below 2 the run is single-threaded
    pub workers: usize,

    /// Size of the first iteration
    pub min_size: usize,

    /// Size the schedule grows towards
    pub max_size: usize,

    /// Total accepted shrinks allowed for one counterexample
    pub max_shrink_count: usize,

    /// Seed of the run; fixes every generated value for a given worker count
    pub seed: u64,
}

impl Default for TestParameters {
    fn default() -> Self {
        Self {
            min_successful_tests: DEFAULT_MIN_SUCCESSFUL_TESTS,
            max_discard_ratio: DEFAULT_MAX_DISCARD_RATIO,
            workers: num_cpus::get(),
            min_size: 0,
            max_size: DEFAULT_MAX_SIZE,
            max_shrink_count: DEFAULT_MAX_SHRINK_COUNT,
            seed: time_seed(),
        }
    }
}

impl TestParameters {
    /// Default parameters with a fixed seed, for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Load parameters from a flat JSON object; missing fields take defaults.
    pub fn from_json(json: &str) -> PropertyResult<Self> {
        let parameters: TestParameters = serde_json::from_str(json)
            .map_err(|e| PropertyError::Configuration(format!("Invalid parameters JSON: {}", e)))?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Reject parameter combinations no run could honour
    pub fn validate(&self) -> PropertyResult<()> {
        if self.min_size > self.max_size {
            return Err(PropertyError::InvalidParameters(format!(
                "min_size {} is greater than max_size {}",
                self.min_size, self.max_size
            )));
        }
        if !self.max_discard_ratio.is_finite() || self.max_discard_ratio < 0.0 {
            return Err(PropertyError::InvalidParameters(format!(
                "max_discard_ratio must be a finite non-negative number, got {}",
                self.max_discard_ratio
            )));
        }
        Ok(())
    }

    /// Worker count actually used by the runner
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }

    /// Generation parameters for one worker: the run seed on the worker's own stream
    pub fn gen_parameters_for_worker(&self, worker: usize) -> GenParameters {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(worker as u64);
        GenParameters {
            min_size: self.min_size,
            max_size: self.max_size,
            size: self.min_size,
            max_shrink_count: self.max_shrink_count,
            rng,
        }
    }
}

/// Parameters handed to a generator for a single draw
#[derive(Debug, Clone)]
pub struct GenParameters {
    /// Lower size bound of the run
    pub min_size: usize,
    /// Upper size bound of the run
    pub max_size: usize,
    /// Size for the current iteration, within `min_size..=max_size`
    pub size: usize,
    /// Accepted shrink budget for a falsification
    pub max_shrink_count: usize,
    /// Random stream; identical state and size yield identical values
    pub rng: ChaCha8Rng,
}

impl Default for GenParameters {
    fn default() -> Self {
        Self::with_seed(time_seed())
    }
}

impl GenParameters {
    /// Default generation parameters on a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            min_size: 0,
            max_size: DEFAULT_MAX_SIZE,
            size: DEFAULT_MAX_SIZE,
            max_shrink_count: DEFAULT_MAX_SHRINK_COUNT,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Copy with a different size; the random stream is cloned, not shared
    pub fn with_size(&self, size: usize) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    /// Copy with a fresh random stream
    pub fn clone_with_seed(&self, seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            ..self.clone()
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    pub fn next_i64(&mut self) -> i64 {
        self.rng.next_u64() as i64
    }

    pub fn next_bool(&mut self) -> bool {
        self.rng.gen()
    }

    /// Uniform index in `0..n`; `n` must be non-zero
    pub fn next_index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// Uniform value in `min..=max`
    pub fn next_in_range(&mut self, min: i64, max: i64) -> i64 {
        self.rng.gen_range(min..=max)
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let parameters = TestParameters::with_seed(7);
        assert_eq!(parameters.min_successful_tests, 100);
        assert_eq!(parameters.max_discard_ratio, 5.0);
        assert_eq!(parameters.min_size, 0);
        assert_eq!(parameters.max_size, 100);
        assert_eq!(parameters.max_shrink_count, 1000);
        assert_eq!(parameters.seed, 7);
        assert!(parameters.workers >= 1);
        assert!(parameters.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_sizes() {
        let parameters = TestParameters {
            min_size: 10,
            max_size: 5,
            ..TestParameters::with_seed(1)
        };
        assert!(matches!(
            parameters.validate(),
            Err(PropertyError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_ratio() {
        let parameters = TestParameters {
            max_discard_ratio: -1.0,
            ..TestParameters::with_seed(1)
        };
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_ratio() {
        for ratio in [f64::INFINITY, f64::NAN] {
            let parameters = TestParameters {
                max_discard_ratio: ratio,
                ..TestParameters::with_seed(1)
            };
            assert!(matches!(
                parameters.validate(),
                Err(PropertyError::InvalidParameters(_))
            ));
        }
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let parameters = TestParameters::from_json(r#"{"seed": 1234, "workers": 1}"#).unwrap();
        assert_eq!(parameters.seed, 1234);
        assert_eq!(parameters.workers, 1);
        assert_eq!(parameters.min_successful_tests, 100);

        assert!(TestParameters::from_json("not json").is_err());
        assert!(TestParameters::from_json(r#"{"min_size": 3, "max_size": 1}"#).is_err());
    }

    #[test]
    fn test_worker_streams_are_deterministic_and_distinct() {
        let parameters = TestParameters::with_seed(42);
        let mut a = parameters.gen_parameters_for_worker(0);
        let mut b = parameters.gen_parameters_for_worker(0);
        let mut c = parameters.gen_parameters_for_worker(1);

        let first = a.next_u64();
        assert_eq!(first, b.next_u64());
        assert_ne!(first, c.next_u64());
    }

    #[test]
    fn test_clone_with_seed_keeps_sizes_and_replaces_stream() {
        let original = GenParameters::with_seed(1).with_size(17);
        let mut reseeded = original.clone_with_seed(99);
        let mut fresh = GenParameters::with_seed(99);

        assert_eq!(reseeded.size, 17);
        assert_eq!(reseeded.max_shrink_count, original.max_shrink_count);
        assert_eq!(reseeded.next_u64(), fresh.next_u64());
    }

    #[test]
    fn test_with_size_clones_stream() {
        let mut params = GenParameters::with_seed(3);
        let mut sized = params.with_size(12);
        assert_eq!(sized.size, 12);
        assert_eq!(params.next_u64(), sized.next_u64());
    }
}
