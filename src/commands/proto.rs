//! A state machine assembled from closures.

use std::fmt;
use std::sync::Arc;

use super::command::CommandRef;
use super::StateMachine;
use crate::generator::{Gen, Value};

type NewSutFn<S, U> = Arc<dyn Fn(&S) -> U + Send + Sync>;
type DestroySutFn<U> = Arc<dyn Fn(U) + Send + Sync>;
type InitialPreConditionFn<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;
type GenCommandFn<S, U, R> = Arc<dyn Fn(&S) -> Gen<CommandRef<S, U, R>> + Send + Sync>;

/// Closure-based [`StateMachine`] over model state `S`, system `U` and results `R`
pub struct ProtoCommands<S, U, R> {
    initial_state_gen: Gen<S>,
    initial_pre_condition: Option<InitialPreConditionFn<S>>,
    new_system_under_test: NewSutFn<S, U>,
    destroy_system_under_test: Option<DestroySutFn<U>>,
    gen_command: GenCommandFn<S, U, R>,
}

impl<S, U, R> fmt::Debug for ProtoCommands<S, U, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtoCommands").finish_non_exhaustive()
    }
}

impl<S, U, R> ProtoCommands<S, U, R>
where
    S: Value,
    U: 'static,
    R: fmt::Debug + 'static,
{
    pub fn new<N, G>(initial_state_gen: Gen<S>, new_system_under_test: N, gen_command: G) -> Self
    where
        N: Fn(&S) -> U + Send + Sync + 'static,
        G: Fn(&S) -> Gen<CommandRef<S, U, R>> + Send + Sync + 'static,
    {
        Self {
            initial_state_gen,
            initial_pre_condition: None,
            new_system_under_test: Arc::new(new_system_under_test),
            destroy_system_under_test: None,
            gen_command: Arc::new(gen_command),
        }
    }

    pub fn with_initial_pre_condition<F>(mut self, f: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.initial_pre_condition = Some(Arc::new(f));
        self
    }

    pub fn with_destroy_system_under_test<F>(mut self, f: F) -> Self
    where
        F: Fn(U) + Send + Sync + 'static,
    {
        self.destroy_system_under_test = Some(Arc::new(f));
        self
    }
}

impl<S, U, R> StateMachine for ProtoCommands<S, U, R>
where
    S: Value,
    U: 'static,
    R: fmt::Debug + 'static,
{
    type State = S;
    type Sut = U;
    type Result = R;

    fn initial_state_gen(&self) -> Gen<S> {
        self.initial_state_gen.clone()
    }

    fn initial_pre_condition(&self, state: &S) -> bool {
        self.initial_pre_condition.as_ref().map_or(true, |f| f(state))
    }

    fn new_system_under_test(&self, initial_state: &S) -> U {
        (self.new_system_under_test)(initial_state)
    }

    fn destroy_system_under_test(&self, sut: U) {
        if let Some(destroy) = &self.destroy_system_under_test {
            destroy(sut);
        }
    }

    fn gen_command(&self, state: &S) -> Gen<CommandRef<S, U, R>> {
        (self.gen_command)(state)
    }
}
