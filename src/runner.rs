//! Runner - drives a property over many iterations
//!
//! Iterations are split across a fixed number of workers, each owning its own
//! random stream (the run seed on the worker's stream index). Workers share
//! nothing but a stop flag: the first falsification or proof sets it and every
//! other worker leaves its loop before the next iteration. Per-worker results
//! are merged in worker order, so the merged status does not depend on
//! scheduling.
//!
//! Accounting:
//! - each worker must reach `ceil(min_successful_tests / workers)` successes;
//! - discards never count as successes;
//! - the run is exhausted once [`is_exhausted`] holds, evaluated by each
//!   worker on its own counts scaled by the worker count, and again on the
//!   merged totals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::{info, warn};

use crate::error::{panic_message, PropertyError};
use crate::parameters::TestParameters;
use crate::prop::Prop;
use crate::prop_result::{PropResult, PropStatus};
use crate::report::{IterationRecord, LogReporter, Reporter};
use crate::test_result::{TestResult, TestStatus};

/// Whether `discarded` draws are too many to keep going.
///
/// Only judged once `succeeded + discarded` has passed the success quota, so
/// early discards never end a run prematurely.
pub fn is_exhausted(
    succeeded: usize,
    discarded: usize,
    min_successful_tests: usize,
    max_discard_ratio: f64,
) -> bool {
    succeeded + discarded > min_successful_tests
        && discarded as f64 > max_discard_ratio * succeeded as f64
}

/// Cooperative cancellation shared by all workers of one run
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Iteration quota and size schedule of one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    pub workers: usize,
    /// Successes each worker must reach
    pub iterations: usize,
    min_size: usize,
    max_size: usize,
    step: f64,
}

impl Schedule {
    pub fn new(parameters: &TestParameters) -> Self {
        let workers = parameters.effective_workers();
        let iterations = (parameters.min_successful_tests + workers - 1) / workers;
        let span = parameters.max_size.saturating_sub(parameters.min_size) as f64;
        let step = if iterations == 0 {
            0.0
        } else {
            span / (iterations * workers) as f64
        };
        Self {
            workers,
            iterations,
            min_size: parameters.min_size,
            max_size: parameters.max_size,
            step,
        }
    }

    /// Size of a worker's next iteration after `attempts` successes and discards.
    ///
    /// Workers interleave: worker `w` takes the `w`-th slot of every round.
    pub fn size(&self, worker: usize, attempts: usize) -> usize {
        let slot = worker + self.workers * attempts;
        let size = self.min_size as f64 + self.step * slot as f64;
        (size as usize).min(self.max_size)
    }
}

/// Partial result of one worker
#[derive(Debug, Clone)]
struct WorkerOutcome {
    status: TestStatus,
    succeeded: usize,
    discarded: usize,
    prop_result: Option<PropResult>,
}

impl WorkerOutcome {
    fn new() -> Self {
        Self {
            status: TestStatus::Passed,
            succeeded: 0,
            discarded: 0,
            prop_result: None,
        }
    }

    fn crashed(message: String) -> Self {
        Self {
            status: TestStatus::Failed,
            prop_result: Some(PropResult::error(message, None)),
            ..Self::new()
        }
    }
}

/// Runs properties under one set of test parameters
#[derive(Clone)]
pub struct Runner {
    parameters: TestParameters,
    reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Runner reporting through the `log` facade
    pub fn new(parameters: TestParameters) -> Self {
        Self {
            parameters,
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn parameters(&self) -> &TestParameters {
        &self.parameters
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    /// Run `prop` to completion.
    ///
    /// Invalid parameters and properties that failed to assemble are reported
    /// as [`TestStatus::Error`] without running a single iteration.
    pub fn run(&self, prop: &Prop) -> TestResult {
        let started = Instant::now();
        let seed = self.parameters.seed;

        let configuration_error = self
            .parameters
            .validate()
            .err()
            .or_else(|| prop.configuration_error().cloned());
        if let Some(error) = configuration_error {
            warn!("Property not run: {}", error);
            return configuration_failure(&error, seed);
        }

        let schedule = Schedule::new(&self.parameters);
        info!(
            "Checking property: seed {}, {} workers, {} iterations per worker",
            seed, schedule.workers, schedule.iterations
        );

        let stop = StopFlag::new();
        let outcomes: Vec<WorkerOutcome> = if schedule.workers < 2 {
            vec![self.run_worker(prop, 0, &schedule, &stop)]
        } else {
            thread::scope(|s| {
                let handles: Vec<_> = (0..schedule.workers)
                    .map(|worker| {
                        let stop = stop.clone();
                        let schedule = &schedule;
                        s.spawn(move || self.run_worker(prop, worker, schedule, &stop))
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|payload| {
                            WorkerOutcome::crashed(panic_message(payload.as_ref()))
                        })
                    })
                    .collect()
            })
        };

        let mut result = self.merge(outcomes);
        result.time = started.elapsed();
        info!(
            "Property {}: {} succeeded, {} discarded in {:?} (seed {})",
            result.status, result.succeeded, result.discarded, result.time, seed
        );
        result
    }

    fn run_worker(
        &self,
        prop: &Prop,
        worker: usize,
        schedule: &Schedule,
        stop: &StopFlag,
    ) -> WorkerOutcome {
        let mut params = self.parameters.gen_parameters_for_worker(worker);
        let mut outcome = WorkerOutcome::new();
        let mut iteration = 0;

        while !stop.is_stopped() && outcome.succeeded < schedule.iterations {
            params.size = schedule.size(worker, outcome.succeeded + outcome.discarded);
            let started = Instant::now();
            let result = prop.evaluate(&mut params);

            self.reporter.report(&IterationRecord::from_prop_result(
                worker,
                iteration,
                params.size,
                started.elapsed().as_micros() as u64,
                self.parameters.seed,
                &result,
            ));
            iteration += 1;

            match result.status {
                PropStatus::True => outcome.succeeded += 1,
                PropStatus::Proof => {
                    outcome.succeeded += 1;
                    outcome.status = TestStatus::Proved;
                    stop.stop();
                    break;
                }
                PropStatus::Undecided => {
                    outcome.discarded += 1;
                    if is_exhausted(
                        outcome.succeeded * schedule.workers,
                        outcome.discarded * schedule.workers,
                        self.parameters.min_successful_tests,
                        self.parameters.max_discard_ratio,
                    ) {
                        outcome.status = TestStatus::Exhausted;
                        break;
                    }
                }
                PropStatus::False | PropStatus::Error => {
                    warn!(
                        "Worker {} falsified property after {} passed tests (seed {})",
                        worker, outcome.succeeded, self.parameters.seed
                    );
                    outcome.status = TestStatus::Failed;
                    outcome.prop_result = Some(result);
                    stop.stop();
                    break;
                }
            }
        }

        outcome
    }

    /// Failed beats Proved beats Exhausted beats Passed; the lowest failing
    /// worker index wins and counts are summed.
    fn merge(&self, outcomes: Vec<WorkerOutcome>) -> TestResult {
        let succeeded = outcomes.iter().map(|o| o.succeeded).sum();
        let discarded = outcomes.iter().map(|o| o.discarded).sum();
        let has = |status: TestStatus| outcomes.iter().any(|o| o.status == status);

        let mut result = TestResult::new(TestStatus::Passed, self.parameters.seed);
        result.succeeded = succeeded;
        result.discarded = discarded;

        if let Some(failed) = outcomes.iter().find(|o| o.status == TestStatus::Failed) {
            result.status = TestStatus::Failed;
            result.passed_before_failure = failed.succeeded;
            if let Some(prop_result) = &failed.prop_result {
                result.error = prop_result.error.clone();
                result.error_stack = prop_result.error_stack.clone();
                result.prop_result = Some(prop_result.clone());
            }
        } else if has(TestStatus::Proved) {
            result.status = TestStatus::Proved;
        } else if has(TestStatus::Exhausted)
            || is_exhausted(
                succeeded,
                discarded,
                self.parameters.min_successful_tests,
                self.parameters.max_discard_ratio,
            )
        {
            result.status = TestStatus::Exhausted;
        }

        result
    }
}

fn configuration_failure(error: &PropertyError, seed: u64) -> TestResult {
    let mut result = TestResult::new(TestStatus::Error, seed);
    result.error = Some(error.to_string());
    result.error_stack = error.stack().map(str::to_string);
    result
}
