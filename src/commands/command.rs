//! Commands and their closure-built prototype.

use std::fmt;
use std::sync::Arc;

use crate::prop_result::{IntoPropResult, PropResult};

/// One abstract operation on a system under test of type `U`, modelled by
/// state `S`, producing results of type `R`.
///
/// Implement this directly for commands carrying their own arguments (their
/// generator decides how those arguments shrink); use [`ProtoCommand`] for
/// fixed commands.
pub trait Command<S, U, R>: fmt::Debug + Send + Sync {
    /// Execute against the real system
    fn run(&self, sut: &mut U) -> R;

    /// Advance the model; never inferred from the real system
    fn next_state(&self, state: S) -> S;

    /// Whether the command may run in `state`
    fn pre_condition(&self, _state: &S) -> bool {
        true
    }

    /// Judge `result` against the already advanced model state
    fn post_condition(&self, _state: &S, _result: &R) -> PropResult {
        PropResult::passed()
    }
}

/// Shared handle to a command
pub type CommandRef<S, U, R> = Arc<dyn Command<S, U, R>>;

type RunFn<U, R> = Arc<dyn Fn(&mut U) -> R + Send + Sync>;
type NextStateFn<S> = Arc<dyn Fn(S) -> S + Send + Sync>;
type PreConditionFn<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;
type PostConditionFn<S, R> = Arc<dyn Fn(&S, &R) -> PropResult + Send + Sync>;

/// A named command assembled from closures.
///
/// Missing parts default to: state unchanged, always allowed, always valid.
pub struct ProtoCommand<S, U, R> {
    name: String,
    run: RunFn<U, R>,
    next_state: Option<NextStateFn<S>>,
    pre_condition: Option<PreConditionFn<S>>,
    post_condition: Option<PostConditionFn<S, R>>,
}

impl<S, U, R> ProtoCommand<S, U, R>
where
    S: 'static,
    U: 'static,
    R: 'static,
{
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut U) -> R + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(run),
            next_state: None,
            pre_condition: None,
            post_condition: None,
        }
    }

    pub fn with_next_state<F>(mut self, f: F) -> Self
    where
        F: Fn(S) -> S + Send + Sync + 'static,
    {
        self.next_state = Some(Arc::new(f));
        self
    }

    pub fn with_pre_condition<F>(mut self, f: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.pre_condition = Some(Arc::new(f));
        self
    }

    /// The check may return anything convertible to an outcome, e.g. `bool`
    pub fn with_post_condition<F, P>(mut self, f: F) -> Self
    where
        F: Fn(&S, &R) -> P + Send + Sync + 'static,
        P: IntoPropResult,
    {
        self.post_condition = Some(Arc::new(move |state: &S, result: &R| {
            f(state, result).into_prop_result()
        }));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_ref(self) -> CommandRef<S, U, R> {
        Arc::new(self)
    }
}

impl<S, U, R> fmt::Debug for ProtoCommand<S, U, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl<S, U, R> Command<S, U, R> for ProtoCommand<S, U, R> {
    fn run(&self, sut: &mut U) -> R {
        (self.run)(sut)
    }

    fn next_state(&self, state: S) -> S {
        match &self.next_state {
            Some(f) => f(state),
            None => state,
        }
    }

    fn pre_condition(&self, state: &S) -> bool {
        self.pre_condition.as_ref().map_or(true, |f| f(state))
    }

    fn post_condition(&self, state: &S, result: &R) -> PropResult {
        match &self.post_condition {
            Some(f) => f(state, result),
            None => PropResult::passed(),
        }
    }
}
