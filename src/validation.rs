//! Start-time validation of a machine's topology using Validation.
//!
//! Every check runs; all violations are accumulated and reported together
//! instead of stopping at the first one.

use crate::error::ConfigError;
use crate::machine::{State, Transition};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigError>>;

fn check(ok: bool, violation: impl FnOnce() -> ConfigError) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation())
    }
}

fn is_blank(name: &str) -> bool {
    name.trim().is_empty()
}

/// Destination `target` (as named by `target_name`) must be one of `states`.
fn check_target(
    states: &[State],
    owner: &State,
    transition: &Transition,
    target: Option<State>,
    target_name: Option<&str>,
) -> Check {
    let Some(target_name) = target_name else {
        return Validation::success(());
    };
    let registered = target.is_some_and(|target| states.contains(&target));
    check(registered, || ConfigError::UnregisteredGotoState {
        state: owner.name().to_string(),
        transition: transition.to_string(),
        target: target_name.to_string(),
    })
}

/// Check a machine called `machine` owning `states`.
///
/// Returns every violation found: blank machine or state names, duplicate
/// state names, no states at all, and destinations outside `states`.
pub fn validate_machine(machine: &str, states: &[State]) -> Result<(), Vec<ConfigError>> {
    let mut checks: Vec<Check> = Vec::new();

    checks.push(check(!is_blank(machine), || ConfigError::EmptyMachineName));
    checks.push(check(!states.is_empty(), || ConfigError::NoStates {
        machine: machine.to_string(),
    }));

    let mut names = HashSet::new();
    for (index, state) in states.iter().enumerate() {
        checks.push(check(!is_blank(state.name()), || ConfigError::EmptyStateName {
            machine: machine.to_string(),
            index,
        }));
        // Blank names are already reported above.
        if !is_blank(state.name()) {
            checks.push(check(names.insert(state.name()), || {
                ConfigError::DuplicateStateName {
                    machine: machine.to_string(),
                    name: state.name().to_string(),
                }
            }));
        }

        for transition in state.transitions() {
            checks.push(check_target(
                states,
                state,
                &transition,
                transition.goto_state(),
                transition.goto_name(),
            ));
            checks.push(check_target(
                states,
                state,
                &transition,
                transition.error_goto_state(),
                transition.error_goto_name(),
            ));
        }
    }

    match Validation::all_vec(checks).map(|_| ()) {
        Validation::Success(()) => Ok(()),
        Validation::Failure(errors) => Err(errors.iter().cloned().collect()),
    }
}
