//! Read-only view of a machine handed to conditions and actions.

use crate::config::TraceMode;
use crate::machine::State;
use uuid::Uuid;

/// What a condition or action can see of the machine evaluating it.
#[derive(Debug, Clone, Copy)]
pub struct MachineContext<'a> {
    machine: &'a str,
    machine_id: Uuid,
    state: &'a State,
    transition: Option<&'a str>,
    logging: bool,
    trace_mode: TraceMode,
}

impl<'a> MachineContext<'a> {
    /// Context for `state` of the machine called `machine`. Logging follows
    /// the state's flag.
    pub fn new(machine: &'a str, state: &'a State) -> Self {
        Self {
            machine,
            machine_id: Uuid::nil(),
            state,
            transition: None,
            logging: state.logging(),
            trace_mode: TraceMode::default(),
        }
    }

    pub fn with_machine_id(mut self, id: Uuid) -> Self {
        self.machine_id = id;
        self
    }

    pub fn with_trace_mode(mut self, mode: TraceMode) -> Self {
        self.trace_mode = mode;
        self
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    pub(crate) fn for_transition<'b>(&self, transition: &'b str) -> MachineContext<'b>
    where
        'a: 'b,
    {
        MachineContext {
            machine: self.machine,
            machine_id: self.machine_id,
            state: self.state,
            transition: Some(transition),
            logging: self.logging,
            trace_mode: self.trace_mode,
        }
    }

    pub fn machine(&self) -> &'a str {
        self.machine
    }

    pub fn machine_id(&self) -> Uuid {
        self.machine_id
    }

    /// The state whose transitions are being evaluated.
    pub fn state(&self) -> &'a State {
        self.state
    }

    pub fn transition(&self) -> Option<&'a str> {
        self.transition
    }

    pub fn logging(&self) -> bool {
        self.logging
    }

    pub fn trace_mode(&self) -> TraceMode {
        self.trace_mode
    }
}
