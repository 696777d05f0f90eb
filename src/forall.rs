//! Binding check functions to generators.
//!
//! A check is any `Fn(A, B, ..) -> R` where `R: IntoPropResult`, bound to a
//! tuple of generators `(Gen<A>, Gen<B>, ..)` of the same arity (1 to 6).
//! Arity mismatches are compile errors, so there is no runtime signature
//! check to fail.
//!
//! Closures usually need their argument types annotated, e.g.
//! `for_all(|x: i64| x < 1000, (int_range(0, 1999),))`.

use std::sync::Arc;

use crate::error::catch_panic;
use crate::generator::{Gen, GenResult, Value};
use crate::parameters::GenParameters;
use crate::prop::Prop;
use crate::prop_result::{IntoPropResult, PropArg, PropResult};
use crate::shrinking::{shrink_value, ShrinkBudget};

/// A fixed-arity set of generators, drawn and shrunk together
pub trait Generators: Send + Sync + 'static {
    /// Tuple of generated values
    type Values: Value;
    /// Tuple of generator results
    type Drawn;

    /// Draw every position; `None` if any position is undecided.
    ///
    /// All generators are invoked even when an early one discards, so the
    /// random stream advances identically.
    fn draw(&self, params: &mut GenParameters) -> Option<(Self::Drawn, Self::Values)>;

    /// Report label of each position
    fn labels(drawn: &Self::Drawn) -> Vec<String>;

    /// `Debug` rendering of each position
    fn render(values: &Self::Values) -> Vec<String>;

    /// Minimize positions left to right, holding the others at their current
    /// values. Returns the shrunk values and accepted steps per position.
    fn shrink(
        drawn: &Self::Drawn,
        values: Self::Values,
        labels: &[String],
        budget: &mut ShrinkBudget,
        fails: &mut dyn FnMut(&Self::Values) -> bool,
    ) -> (Self::Values, Vec<usize>);
}

/// Label of one argument position: its generator labels or its index
pub(crate) fn position_label(labels: &[String], index: usize) -> String {
    if labels.is_empty() {
        index.to_string()
    } else {
        labels.join("_")
    }
}

macro_rules! impl_generators {
    ($($T:ident $idx:tt),+) => {
        impl<$($T: Value),+> Generators for ($(Gen<$T>,)+) {
            type Values = ($($T,)+);
            type Drawn = ($(GenResult<$T>,)+);

            fn draw(&self, params: &mut GenParameters) -> Option<(Self::Drawn, Self::Values)> {
                let drawn = ($(self.$idx.generate(params),)+);
                let values = ($(drawn.$idx.retrieve()?.clone(),)+);
                Some((drawn, values))
            }

            fn labels(drawn: &Self::Drawn) -> Vec<String> {
                vec![$(position_label(&drawn.$idx.labels, $idx)),+]
            }

            fn render(values: &Self::Values) -> Vec<String> {
                vec![$(format!("{:?}", values.$idx)),+]
            }

            fn shrink(
                drawn: &Self::Drawn,
                mut values: Self::Values,
                labels: &[String],
                budget: &mut ShrinkBudget,
                fails: &mut dyn FnMut(&Self::Values) -> bool,
            ) -> (Self::Values, Vec<usize>) {
                let mut steps = Vec::new();
                $(
                    let label = labels.get($idx).map(String::as_str).unwrap_or("");
                    let outcome = {
                        let held = &values;
                        shrink_value(&drawn.$idx, label, budget, |candidate: &$T| {
                            let mut attempt = held.clone();
                            attempt.$idx = candidate.clone();
                            fails(&attempt)
                        })
                    };
                    match outcome {
                        Some(outcome) => {
                            values.$idx = outcome.value;
                            steps.push(outcome.steps);
                        }
                        None => steps.push(0),
                    }
                )+
                (values, steps)
            }
        }
    };
}

impl_generators!(A 0);
impl_generators!(A 0, B 1);
impl_generators!(A 0, B 1, C 2);
impl_generators!(A 0, B 1, C 2, D 3);
impl_generators!(A 0, B 1, C 2, D 3, E 4);
impl_generators!(A 0, B 1, C 2, D 3, E 4, F 5);

/// A check function over a tuple of arguments
pub trait CheckFn<Args>: Send + Sync + 'static {
    fn call(&self, args: Args) -> PropResult;
}

macro_rules! impl_check_fn {
    ($($T:ident $idx:tt),+) => {
        impl<Func, R, $($T),+> CheckFn<($($T,)+)> for Func
        where
            Func: Fn($($T),+) -> R + Send + Sync + 'static,
            R: IntoPropResult,
        {
            fn call(&self, args: ($($T,)+)) -> PropResult {
                (self)($(args.$idx),+).into_prop_result()
            }
        }
    };
}

impl_check_fn!(A 0);
impl_check_fn!(A 0, B 1);
impl_check_fn!(A 0, B 1, C 2);
impl_check_fn!(A 0, B 1, C 2, D 3);
impl_check_fn!(A 0, B 1, C 2, D 3, E 4);
impl_check_fn!(A 0, B 1, C 2, D 3, E 4, F 5);

/// Run the check once; a panic becomes an `Error` outcome with its stack
pub(crate) fn run_check<Args, C>(check: &C, args: Args) -> PropResult
where
    C: CheckFn<Args> + ?Sized,
{
    catch_panic(|| check.call(args)).unwrap_or_else(PropResult::from)
}

/// Property checking `check` against values from `gens`; falsifying inputs are shrunk
pub fn for_all<G, C>(check: C, gens: G) -> Prop
where
    G: Generators,
    C: CheckFn<G::Values>,
{
    bind(check, gens, true)
}

/// Like [`for_all`] but reports the original falsifying values
pub fn for_all_no_shrink<G, C>(check: C, gens: G) -> Prop
where
    G: Generators,
    C: CheckFn<G::Values>,
{
    bind(check, gens, false)
}

fn bind<G, C>(check: C, gens: G, shrink: bool) -> Prop
where
    G: Generators,
    C: CheckFn<G::Values>,
{
    let check = Arc::new(check);
    Prop::new(move |params| {
        let (drawn, values) = match gens.draw(params) {
            Some(draw) => draw,
            None => return PropResult::undecided(),
        };

        let first = run_check(check.as_ref(), values.clone());
        if !first.is_failure() {
            return first;
        }

        let labels = G::labels(&drawn);
        if !shrink {
            let args = report_args::<G>(&labels, &values, &values, &[]);
            return first.with_args(args);
        }

        let mut budget = ShrinkBudget::new(params.max_shrink_count);
        let mut fails = |candidate: &G::Values| run_check(check.as_ref(), candidate.clone()).is_failure();
        let (shrunk, steps) = G::shrink(&drawn, values.clone(), &labels, &mut budget, &mut fails);

        let last = run_check(check.as_ref(), shrunk.clone());
        if last.is_failure() {
            let args = report_args::<G>(&labels, &shrunk, &values, &steps);
            last.with_args(args)
        } else {
            let args = report_args::<G>(&labels, &values, &values, &[]);
            first.with_args(args)
        }
    })
}

fn report_args<G: Generators>(
    labels: &[String],
    shrunk: &G::Values,
    original: &G::Values,
    steps: &[usize],
) -> Vec<PropArg> {
    let shrunk = G::render(shrunk);
    let original = G::render(original);
    shrunk
        .into_iter()
        .zip(original)
        .enumerate()
        .map(|(index, (arg, orig_arg))| PropArg {
            label: labels.get(index).cloned().unwrap_or_else(|| index.to_string()),
            arg,
            orig_arg,
            shrinks: steps.get(index).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{constant, int_range};
    use crate::prop_result::PropStatus;

    #[test]
    fn test_position_label() {
        assert_eq!(position_label(&[], 2), "2");
        assert_eq!(position_label(&["a".into(), "b".into()], 0), "a_b");
    }

    #[test]
    fn test_undecided_generator_skips_check() {
        let prop = for_all(
            |_: i64| -> bool { panic!("must not run") },
            (int_range(0, 10).such_that(|_| false),),
        );
        let result = prop.evaluate(&mut GenParameters::with_seed(1));
        assert_eq!(result.status, PropStatus::Undecided);
    }

    #[test]
    fn test_shrinks_each_position() {
        let prop = for_all(
            |a: i64, b: i64| a < 10 || b < 10,
            (constant(500).with_shrinker(crate::shrink::int64_shrinker()), int_range(200, 300)),
        );
        let result = prop.evaluate(&mut GenParameters::with_seed(1));
        assert_eq!(result.status, PropStatus::False);
        assert_eq!(result.args.len(), 2);
        assert_eq!(result.args[0].arg, "10");
        assert_eq!(result.args[0].orig_arg, "500");
        assert_eq!(result.args[1].arg, "200");
        assert!(result.args[0].shrinks > 0);
    }

    #[test]
    fn test_no_shrink_reports_original() {
        let prop = for_all_no_shrink(|a: i64| a < 10, (constant(500),));
        let result = prop.evaluate(&mut GenParameters::with_seed(1));
        assert_eq!(result.status, PropStatus::False);
        assert_eq!(result.args[0].arg, "500");
        assert_eq!(result.args[0].shrinks, 0);
    }

    #[test]
    fn test_panicking_check_is_an_error() {
        let prop = for_all(
            |a: i64| -> bool {
                if a > 5 {
                    panic!("too large: {}", a);
                }
                true
            },
            (int_range(100, 200),),
        );
        let result = prop.evaluate(&mut GenParameters::with_seed(1));
        assert_eq!(result.status, PropStatus::Error);
        assert!(result.error.unwrap().contains("too large: 100"));
        assert_eq!(result.args[0].arg, "100");
    }
}
