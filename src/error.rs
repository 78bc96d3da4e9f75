//! Error types for machine configuration and action execution.
//!
//! Two families of failure exist. [`ConfigError`] covers programmer mistakes
//! in how a machine was put together; these are reported immediately and are
//! never retried. [`ActionFault`] is raised by an action while a transition
//! runs; it is either absorbed by the transition's error path or surfaced to
//! the caller of `update` wrapped in [`FsmError::Action`].

use crate::core::{CmpOp, VarKind};
use crate::machine::MachineStatus;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result alias for machine lifecycle operations.
pub type FsmResult<T> = Result<T, FsmError>;

/// The once-settable fields of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionField {
    Conditions,
    Actions,
    GotoState,
    ErrorActions,
    ErrorGotoState,
}

impl fmt::Display for TransitionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Conditions => "conditions",
            Self::Actions => "actions",
            Self::GotoState => "goto state",
            Self::ErrorActions => "error actions",
            Self::ErrorGotoState => "error goto state",
        };
        f.write_str(name)
    }
}

/// Configuration mistakes. All of them are programmer errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("machine name must not be empty")]
    EmptyMachineName,

    #[error("state #{index} of machine '{machine}' has an empty name")]
    EmptyStateName { machine: String, index: usize },

    #[error("machine '{machine}' registers more than one state named '{name}'")]
    DuplicateStateName { machine: String, name: String },

    #[error("machine '{machine}' has no states")]
    NoStates { machine: String },

    #[error("{field} already set on {transition}")]
    FieldAlreadySet {
        transition: String,
        field: TransitionField,
    },

    #[error("{transition} in state '{state}' targets '{target}', which is not a state of this machine")]
    UnregisteredGotoState {
        state: String,
        transition: String,
        target: String,
    },

    #[error("machine '{machine}' is {status}; start it before calling update")]
    NotRunning {
        machine: String,
        status: MachineStatus,
    },

    #[error("machine '{machine}' is already running")]
    AlreadyRunning { machine: String },

    #[error("'{owner}' belongs to a started machine and can no longer be changed")]
    TopologySealed { owner: String },

    #[error("cannot use a {right} value with a {left} variable")]
    TypeMismatch { left: VarKind, right: VarKind },

    #[error("operator '{op}' is not defined for {kind} variables")]
    UnsupportedOperator { op: CmpOp, kind: VarKind },

    #[error("{combinator} needs at least {min} condition(s), got {found}")]
    Arity {
        combinator: &'static str,
        min: usize,
        found: usize,
    },
}

/// A fault raised by an action while a transition executes.
#[derive(Debug, Clone)]
pub struct ActionFault {
    message: String,
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl ActionFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an arbitrary error, keeping it reachable through `source()`.
    pub fn from_error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ActionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ActionFault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

impl From<&str> for ActionFault {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ActionFault {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Errors returned by [`Fsm`](crate::Fsm) lifecycle operations.
#[derive(Debug, Error)]
pub enum FsmError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("machine '{machine}' failed validation: {}", summarize(.violations))]
    Validation {
        machine: String,
        violations: Vec<ConfigError>,
    },

    #[error("action fault in state '{state}' ({transition}): {fault}")]
    Action {
        state: String,
        transition: String,
        #[source]
        fault: ActionFault,
    },
}

impl FsmError {
    /// True for every error caused by how the machine was configured.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Validation { .. })
    }

    /// Every configuration violation carried by this error.
    pub fn violations(&self) -> Vec<&ConfigError> {
        match self {
            Self::Config(error) => vec![error],
            Self::Validation { violations, .. } => violations.iter().collect(),
            Self::Action { .. } => Vec::new(),
        }
    }

    pub fn action_fault(&self) -> Option<&ActionFault> {
        match self {
            Self::Action { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

fn summarize(violations: &[ConfigError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
