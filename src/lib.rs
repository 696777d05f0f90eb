//! # propcheck
//!
//! Property-based testing with integrated shrinking and model-based command
//! testing.
//!
//! A property binds a check function to generators. The [`Runner`] evaluates
//! it over many iterations, split across worker threads, with sizes growing
//! from `min_size` to `max_size`. When a check is falsified the failing
//! arguments are shrunk one position at a time to a locally minimal
//! counterexample, and both the minimized and the original values are
//! reported.
//!
//! ```no_run
//! use propcheck::{for_all, generators::int_range, TestParameters, TestStatus};
//!
//! let prop = for_all(|x: i64| x < 1000, (int_range(0, 1999),));
//! let result = prop.check(&TestParameters::with_seed(1234));
//! assert_eq!(result.status, TestStatus::Failed);
//! ```

pub mod arbitrary;
pub mod commands;
pub mod error;
pub mod forall;
pub mod generator;
pub mod generators;
pub mod parameters;
pub mod prop;
pub mod prop_result;
pub mod properties;
pub mod report;
pub mod runner;
pub mod shrink;
pub mod shrinking;
pub mod test_result;

// Re-export core types for easy access
pub use arbitrary::{Arbitraries, Arbitrary, ArbitraryArgs};
pub use error::{PropertyError, PropertyResult};
pub use forall::{for_all, for_all_no_shrink, CheckFn, Generators};
pub use generator::{Gen, GenResult, Value};
pub use parameters::{GenParameters, TestParameters};
pub use prop::Prop;
pub use prop_result::{IntoPropResult, PropArg, PropResult, PropStatus};
pub use properties::Properties;
pub use report::{CollectingReporter, IterationRecord, LogReporter, NullReporter, Reporter};
pub use runner::{is_exhausted, Runner, StopFlag};
pub use shrink::{Shrink, ShrinkTree, Shrinker, Sieve};
pub use shrinking::{shrink_value, ShrinkBudget};
pub use test_result::{TestResult, TestStatus};
