//! Machine-wide configuration.

use serde::{Deserialize, Serialize};

/// How much of a condition list is evaluated once its result is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    /// Stop at the first child that decides an AND/OR result.
    #[default]
    ShortCircuit,

    /// Keep evaluating (and logging) every child after the result is decided.
    /// The result is identical to `ShortCircuit`.
    EvaluateAll,
}

/// Settings for one [`Fsm`](crate::Fsm) instance.
///
/// # Example
///
/// ```rust
/// use tickfsm::{FsmConfig, TraceMode};
///
/// let config = FsmConfig::new()
///     .trace_mode(TraceMode::EvaluateAll)
///     .stop_on_terminal_state(false)
///     .history_limit(Some(16));
///
/// assert_eq!(config.trace_mode, TraceMode::EvaluateAll);
/// assert!(!config.stop_on_terminal_state);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsmConfig {
    pub trace_mode: TraceMode,

    /// Stop the machine when a state change enters a state without outgoing
    /// transitions. The first state entered by `start` is exempt.
    pub stop_on_terminal_state: bool,

    /// Maximum number of retained state-change records, `None` for unbounded.
    pub history_limit: Option<usize>,
}

impl Default for FsmConfig {
    fn default() -> Self {
        Self {
            trace_mode: TraceMode::ShortCircuit,
            stop_on_terminal_state: true,
            history_limit: Some(256),
        }
    }
}

impl FsmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trace_mode(mut self, mode: TraceMode) -> Self {
        self.trace_mode = mode;
        self
    }

    pub fn stop_on_terminal_state(mut self, enabled: bool) -> Self {
        self.stop_on_terminal_state = enabled;
        self
    }

    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }
}
