//! The imperative shell: states, transitions and the machine driving them.

mod fsm;
mod state;
mod transition;

pub use fsm::{Fsm, MachineStatus, StateChange, UpdateOutcome};
pub use state::State;
pub use transition::Transition;
