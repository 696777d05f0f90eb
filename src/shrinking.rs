//! Search & shrink engine.
//!
//! Once an evaluation falsifies a property, each argument is minimized in
//! turn by greedy descent over its shrink tree: candidates are pulled from the
//! current value's shrink sequence (filtered by the argument's sieve), and the
//! first one that still falsifies the check becomes the new current value.
//! Descent stops when a whole sequence is exhausted without a falsifying
//! candidate, or when the budget of accepted shrinks is spent.
//!
//! The result is locally minimal: no single immediate candidate of a reported
//! value falsifies the check when substituted alone. It is not a global
//! minimum across arguments.

use log::debug;

use crate::generator::{GenResult, Value};

/// Accepted-shrink allowance shared by every argument of one falsification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShrinkBudget {
    limit: usize,
    accepted: usize,
    calls: usize,
}

impl ShrinkBudget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            accepted: 0,
            calls: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.accepted >= self.limit
    }

    /// Accepted shrinks so far
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Candidates tried so far
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.accepted)
    }
}

/// Minimized value of one argument
#[derive(Debug, Clone)]
pub struct ShrinkOutcome<T> {
    pub value: T,
    /// Accepted steps for this argument
    pub steps: usize,
}

/// Minimize one drawn value while `fails` keeps reporting a falsification.
///
/// `fails` receives each candidate value; the caller substitutes it into the
/// full argument set and re-runs the check.
pub fn shrink_value<T, F>(
    result: &GenResult<T>,
    label: &str,
    budget: &mut ShrinkBudget,
    mut fails: F,
) -> Option<ShrinkOutcome<T>>
where
    T: Value,
    F: FnMut(&T) -> bool,
{
    let mut current = result.tree()?.clone();
    let mut steps = 0;

    while !budget.is_exhausted() {
        let mut improved = false;
        for candidate in result.shrink(&current) {
            budget.calls += 1;
            if fails(candidate.value()) {
                steps += 1;
                budget.accepted += 1;
                debug!("Shrink {} step {}: {:?}", label, steps, candidate.value());
                current = candidate;
                improved = true;
                break;
            }
        }
        if !improved {
            break;
        }
    }

    Some(ShrinkOutcome {
        value: current.into_value(),
        steps,
    })
}
