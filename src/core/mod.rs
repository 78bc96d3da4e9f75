//! Building blocks evaluated by a machine on every tick.
//!
//! - Typed variables shared between conditions and actions
//! - Conditions and their boolean combinators
//! - Actions, synchronous or suspending
//! - The read-only context both receive
//! - History of state changes

mod action;
mod condition;
mod context;
mod history;
mod variable;

pub use action::{
    Action, ActionBehavior, ActionFuture, EffectAction, EffectFactory, LambdaAction, Mutation,
    SuspendingAction, VariableMutation,
};
pub use condition::{Comparison, Compound, Condition, ConditionBehavior, ConditionSet, LambdaCondition};
pub use context::MachineContext;
pub use history::{StateChangeRecord, StateHistory};
pub use variable::{CmpOp, Operand, Value, VarKind, Variable};

pub(crate) use action::{execute_all, execute_best_effort};
pub(crate) use condition::{evaluate, Logic};
