//! Generated command sequences and their replay.

use std::fmt;
use std::sync::Arc;

use log::trace;

use super::command::CommandRef;
use super::StateMachine;
use crate::error::catch_panic;
use crate::generator::{Gen, GenResult};
use crate::parameters::GenParameters;
use crate::prop_result::PropResult;
use crate::shrink::ShrinkTree;

/// Attempts per step to draw a command whose precondition holds
pub const MAX_COMMAND_RETRIES: usize = 100;

/// An initial model state and the commands to replay from it
pub struct Actions<S, U, R> {
    pub initial_state: S,
    pub commands: Vec<CommandRef<S, U, R>>,
}

impl<S: Clone, U, R> Clone for Actions<S, U, R> {
    fn clone(&self) -> Self {
        Self {
            initial_state: self.initial_state.clone(),
            commands: self.commands.clone(),
        }
    }
}

impl<S: fmt::Debug, U, R> fmt::Debug for Actions<S, U, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "initial_state={:?} sequential=[", self.initial_state)?;
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:?}", command)?;
        }
        f.write_str("]")
    }
}

/// Actions type of a machine
pub type MachineActions<M> = Actions<
    <M as StateMachine>::State,
    <M as StateMachine>::Sut,
    <M as StateMachine>::Result,
>;

impl<S: Clone, U, R> Actions<S, U, R> {
    /// Whether the initial state and every command precondition hold along the model
    pub fn preconditions_hold<M>(&self, machine: &M) -> bool
    where
        M: StateMachine<State = S, Sut = U, Result = R>,
    {
        if !machine.initial_pre_condition(&self.initial_state) {
            return false;
        }
        let mut state = self.initial_state.clone();
        for command in &self.commands {
            if !command.pre_condition(&state) {
                return false;
            }
            state = command.next_state(state);
        }
        true
    }
}

/// Generator of command sequences for `machine`.
///
/// The sequence length is uniform in `0..=size`. Each command is drawn from
/// the machine's generator for the current model state and must satisfy its
/// precondition; after [`MAX_COMMAND_RETRIES`] rejected draws the whole
/// sequence is discarded. Shrinking removes and simplifies commands first,
/// then the initial state, keeping only candidates whose preconditions all
/// still hold.
pub fn gen_actions<M: StateMachine>(machine: Arc<M>) -> Gen<MachineActions<M>> {
    let initial_state_gen = machine.initial_state_gen();
    Gen::new(move |params| {
        let initial = match initial_state_gen.generate(params).into_tree() {
            Some(tree) => tree,
            None => return GenResult::undecided(),
        };
        if !machine.initial_pre_condition(initial.value()) {
            return GenResult::undecided();
        }

        let len = params.next_in_range(0, params.size as i64) as usize;
        let mut state = initial.value().clone();
        let mut trees = Vec::with_capacity(len);
        for _ in 0..len {
            let tree = match draw_command(machine.as_ref(), &state, params) {
                Some(tree) => tree,
                None => return GenResult::undecided(),
            };
            state = tree.value().next_state(state);
            trees.push(tree);
        }

        let tree = ShrinkTree::sequence(trees)
            .zip(initial)
            .map(|(commands, initial_state)| Actions {
                initial_state,
                commands,
            });
        let sieve_machine = machine.clone();
        GenResult::from_tree(tree).with_sieve(Arc::new(move |actions: &MachineActions<M>| {
            actions.preconditions_hold(sieve_machine.as_ref())
        }))
    })
}

fn draw_command<M: StateMachine>(
    machine: &M,
    state: &M::State,
    params: &mut GenParameters,
) -> Option<ShrinkTree<CommandRef<M::State, M::Sut, M::Result>>> {
    let gen = machine.gen_command(state);
    for _ in 0..MAX_COMMAND_RETRIES {
        if let Some(tree) = gen.generate(params).into_tree() {
            if tree.value().pre_condition(state) {
                return Some(tree);
            }
        }
    }
    None
}

/// Replay `actions` on a fresh system, checking every postcondition.
///
/// A command whose precondition does not hold makes the run undecided and
/// never executes. The system is torn down afterwards, also when a command
/// panicked; the panic becomes an error outcome.
pub fn run_actions<M: StateMachine>(machine: &M, actions: &MachineActions<M>) -> PropResult {
    let mut sut = machine.new_system_under_test(&actions.initial_state);
    let outcome = catch_panic(|| execute(actions, &mut sut));
    machine.destroy_system_under_test(sut);
    outcome.unwrap_or_else(PropResult::from)
}

fn execute<S, U, R>(actions: &Actions<S, U, R>, sut: &mut U) -> PropResult
where
    S: Clone + fmt::Debug,
    R: fmt::Debug,
{
    let mut state = actions.initial_state.clone();
    for (step, command) in actions.commands.iter().enumerate() {
        if !command.pre_condition(&state) {
            return PropResult::undecided();
        }
        let result = command.run(sut);
        state = command.next_state(state);
        trace!("step {}: {:?} -> {:?}, state {:?}", step, command, result, state);

        let outcome = command.post_condition(&state, &result);
        if !outcome.success() {
            return outcome.with_label(format!(
                "step {}: {:?} returned {:?} in state {:?}",
                step, command, result, state
            ));
        }
    }
    PropResult::passed()
}
