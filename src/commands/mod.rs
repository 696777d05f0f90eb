//! Model-based testing with command sequences
//!
//! A [`StateMachine`] describes an abstract model: how to generate its
//! initial state, how to build and tear down the real system from it, and
//! which commands may be generated in a given model state. [`prop`] turns a
//! machine into a single property whose argument is a whole command sequence;
//! falsified sequences shrink by dropping and simplifying commands.

pub mod actions;
pub mod command;
pub mod proto;

use std::fmt;
use std::sync::Arc;

use crate::forall::for_all;
use crate::generator::{Gen, Value};
use crate::prop::Prop;

pub use actions::{gen_actions, run_actions, Actions, MachineActions, MAX_COMMAND_RETRIES};
pub use command::{Command, CommandRef, ProtoCommand};
pub use proto::ProtoCommands;

/// Abstract state machine driving command generation
pub trait StateMachine: Send + Sync + 'static {
    /// Model state
    type State: Value;
    /// The real system
    type Sut: 'static;
    /// What commands return when run against the system
    type Result: fmt::Debug + 'static;

    fn initial_state_gen(&self) -> Gen<Self::State>;

    fn initial_pre_condition(&self, _state: &Self::State) -> bool {
        true
    }

    /// Build the real system from the initial model state
    fn new_system_under_test(&self, initial_state: &Self::State) -> Self::Sut;

    fn destroy_system_under_test(&self, _sut: Self::Sut) {}

    /// Generator of commands applicable in `state`
    fn gen_command(
        &self,
        state: &Self::State,
    ) -> Gen<CommandRef<Self::State, Self::Sut, Self::Result>>;
}

/// Property holding iff every generated command sequence replays without a
/// failing postcondition
pub fn prop<M: StateMachine>(machine: M) -> Prop {
    let machine = Arc::new(machine);
    let replay = machine.clone();
    for_all(
        move |actions: MachineActions<M>| run_actions(replay.as_ref(), &actions),
        (gen_actions(machine).with_label("actions"),),
    )
}
