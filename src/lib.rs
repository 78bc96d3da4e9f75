//! tickfsm: an embeddable, tick-driven finite state machine
//!
//! A host application builds a graph of named [`State`]s connected by
//! [`Transition`]s, starts the [`Fsm`], and calls [`Fsm::update`] once per
//! tick. On every tick the active state's transitions are evaluated in order
//! and the first whose conditions hold runs its actions and, optionally,
//! moves the machine to another state.
//!
//! # Core Concepts
//!
//! - **Variables**: typed cells shared by conditions (reading) and actions (writing)
//! - **Conditions**: predicates and their AND/OR/NOT/NAND/NOR combinators
//! - **Actions**: synchronous or suspending work, awaited strictly in order
//! - **Error paths**: per-transition recovery from action faults
//! - **History**: a record of every change of the active state
//!
//! # Example
//!
//! ```rust
//! use tickfsm::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let hits = Variable::named("hits", 0);
//! let [patrol, chase, flee]: [State; 3] = State::many(["Patrol", "Chase", "Flee"])
//!     .try_into()
//!     .unwrap();
//!
//! patrol
//!     .add_named_transition("spotted")?
//!     .with_actions([Action::add(&hits, 1)?])?
//!     .to_state(&chase)?;
//! chase
//!     .add_named_transition("hurt")?
//!     .with_conditions([Condition::is_greater_or_equal(&hits, 1)?])?
//!     .to_state(&flee)?;
//!
//! let mut fsm = Fsm::new("guard").with_states([patrol, chase, flee]);
//! fsm.on_state_change(|change| {
//!     println!("{} -> {}", change.previous, change.active);
//! });
//! fsm.start()?;
//!
//! futures::executor::block_on(async {
//!     fsm.update().await?;
//!     fsm.update().await
//! })?;
//!
//! assert_eq!(fsm.history().get_path(), vec!["Patrol", "Chase", "Flee"]);
//! assert!(fsm.is_stopped());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod machine;
pub mod validation;

// Re-export commonly used types
pub use crate::config::{FsmConfig, TraceMode};
pub use crate::core::{
    Action, ActionBehavior, CmpOp, Condition, ConditionBehavior, MachineContext, Operand,
    StateChangeRecord, StateHistory, Value, VarKind, Variable,
};
pub use crate::error::{ActionFault, ConfigError, FsmError, FsmResult, TransitionField};
pub use crate::machine::{Fsm, MachineStatus, State, StateChange, Transition, UpdateOutcome};

/// Everything needed to build and drive a machine.
pub mod prelude {
    pub use crate::config::{FsmConfig, TraceMode};
    pub use crate::core::{
        Action, ActionBehavior, CmpOp, Condition, ConditionBehavior, MachineContext, Value,
        Variable,
    };
    pub use crate::error::{ActionFault, ConfigError, FsmError, FsmResult};
    pub use crate::machine::{Fsm, MachineStatus, State, StateChange, Transition, UpdateOutcome};
}
