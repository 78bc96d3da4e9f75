//! The machine: owns states, tracks the active one, drives ticks.

use super::state::State;
use super::transition::{Firing, Transition};
use crate::config::FsmConfig;
use crate::core::{MachineContext, StateChangeRecord, StateHistory};
use crate::error::{ConfigError, FsmError, FsmResult};
use crate::validation::validate_machine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a machine: `Unstarted -> Running -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    Unstarted,
    Running,
    Stopped,
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unstarted => "unstarted",
            Self::Running => "running",
            Self::Stopped => "stopped",
        })
    }
}

/// Notification raised whenever the active state changes.
#[derive(Debug, Clone)]
pub struct StateChange {
    pub previous: State,
    pub active: State,
    pub transition: Option<String>,
    pub via_error_path: bool,
    pub timestamp: DateTime<Utc>,
}

/// Result of one [`Fsm::update`] tick.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// No transition of the active state was satisfied.
    Idle,
    /// A transition fired without changing the active state.
    Stayed { transition: String, recovered: bool },
    /// The active state changed.
    Changed(StateChange),
}

impl UpdateOutcome {
    pub fn changed(&self) -> Option<&StateChange> {
        match self {
            Self::Changed(change) => Some(change),
            _ => None,
        }
    }

    pub fn fired(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

type Observer = Box<dyn FnMut(&StateChange) + Send>;

/// A tick-driven finite state machine.
///
/// Register states with [`with_states`](Fsm::with_states), call
/// [`start`](Fsm::start) once, then [`update`](Fsm::update) once per tick.
/// The first registered state is the initial state.
///
/// # Example
///
/// ```rust
/// use tickfsm::{Condition, Fsm, State, Variable};
///
/// # futures::executor::block_on(async {
/// let go = Variable::named("go", false);
/// let states = State::many(["Start", "End"]);
/// states[0]
///     .add_transition()?
///     .with_conditions([Condition::is_true(&go)?])?
///     .to_state(&states[1])?;
///
/// let mut fsm = Fsm::new("demo").with_states(states);
/// fsm.start()?;
///
/// assert!(!fsm.update().await?.fired());
/// go.set(true)?;
/// assert!(fsm.update().await?.changed().is_some());
/// assert_eq!(fsm.active_state().map(|s| s.name()), Some("End"));
/// assert!(fsm.is_stopped());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # }).unwrap();
/// ```
pub struct Fsm {
    id: Uuid,
    name: String,
    config: FsmConfig,
    states: Vec<State>,
    active: Option<State>,
    status: MachineStatus,
    observers: Vec<Observer>,
    history: StateHistory,
}

impl Fsm {
    /// A machine with no states. The name is validated on `start`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, FsmConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: FsmConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            history: StateHistory::with_limit(config.history_limit),
            config,
            states: Vec::new(),
            active: None,
            status: MachineStatus::Unstarted,
            observers: Vec::new(),
        }
    }

    /// Register states in order. Cross references are checked on `start`.
    pub fn with_states<I>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = State>,
    {
        self.states.extend(states);
        self
    }

    /// Create and register one state per name.
    pub fn with_state_names<I, N>(self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.with_states(State::many(names))
    }

    /// Register an observer, called synchronously and in registration
    /// order on every change of the active state.
    pub fn on_state_change<F>(&mut self, observer: F) -> &mut Self
    where
        F: FnMut(&StateChange) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &FsmConfig {
        &self.config
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// First registered state with `name`.
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|state| state.name() == name)
    }

    /// `None` until the machine has been started.
    pub fn active_state(&self) -> Option<&State> {
        self.active.as_ref()
    }

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == MachineStatus::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.status == MachineStatus::Stopped
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Validate the topology, seal it and enter the first state.
    ///
    /// Every violation is reported at once. On failure the machine keeps its
    /// previous status. A stopped machine may be started again; it restarts
    /// from the first state. The machine is always running afterwards, even
    /// when the first state has no transitions.
    pub fn start(&mut self) -> FsmResult<&mut Self> {
        if self.is_running() {
            return Err(ConfigError::AlreadyRunning {
                machine: self.name.clone(),
            }
            .into());
        }

        validate_machine(&self.name, &self.states).map_err(|violations| FsmError::Validation {
            machine: self.name.clone(),
            violations,
        })?;

        let Some(first) = self.states.first().cloned() else {
            return Err(ConfigError::NoStates {
                machine: self.name.clone(),
            }
            .into());
        };

        for state in &self.states {
            state.seal();
        }

        self.status = MachineStatus::Running;
        self.active = Some(first.clone());
        self.each_unique_transition(|transition, ctx| transition.on_start(ctx));

        tracing::info!(
            machine = %self.name,
            id = %self.id,
            "{}: started in state '{}'",
            self.name,
            first.name()
        );

        first.on_enter(&self.context(&first));
        Ok(self)
    }

    /// Run one tick.
    ///
    /// The active state's transitions are evaluated in registration order and
    /// only the first satisfied one fires. A fault raised by an action is
    /// returned unless that transition declares an error path; the active
    /// state is then left unchanged.
    pub async fn update(&mut self) -> FsmResult<UpdateOutcome> {
        let active = match (&self.active, self.status) {
            (Some(active), MachineStatus::Running) => active.clone(),
            _ => {
                return Err(ConfigError::NotRunning {
                    machine: self.name.clone(),
                    status: self.status,
                }
                .into())
            }
        };

        let fired = {
            let ctx = self.context(&active);
            let mut fired = None;
            for transition in active.transitions() {
                let firing = transition.update(&ctx).await?;
                if let Firing::Fired { goto, recovered } = firing {
                    fired = Some((transition, goto, recovered));
                    break;
                }
            }
            fired
        };

        let Some((transition, goto, recovered)) = fired else {
            return Ok(UpdateOutcome::Idle);
        };

        match goto {
            Some(next) => Ok(UpdateOutcome::Changed(self.change_state(
                active,
                next,
                &transition,
                recovered,
            ))),
            None => Ok(UpdateOutcome::Stayed {
                transition: transition.label(),
                recovered,
            }),
        }
    }

    /// Stop the machine, keeping the active state for inspection.
    pub fn stop(&mut self) -> FsmResult<&mut Self> {
        if !self.is_running() {
            return Err(ConfigError::NotRunning {
                machine: self.name.clone(),
                status: self.status,
            }
            .into());
        }
        self.halt("stopped");
        Ok(self)
    }

    fn halt(&mut self, reason: &str) {
        self.each_unique_transition(|transition, ctx| transition.on_stop(ctx));
        self.status = MachineStatus::Stopped;
        tracing::info!(
            machine = %self.name,
            id = %self.id,
            "{}: {} in state '{}'",
            self.name,
            reason,
            self.active.as_ref().map(State::name).unwrap_or("-")
        );
    }

    fn change_state(
        &mut self,
        previous: State,
        next: State,
        transition: &Transition,
        via_error_path: bool,
    ) -> StateChange {
        previous.on_exit(&self.context(&previous));
        self.active = Some(next.clone());
        next.on_enter(&self.context(&next));

        if previous.logging() {
            tracing::debug!(
                machine = %self.name,
                "{}: '{}' -> '{}' via {}",
                self.name,
                previous.name(),
                next.name(),
                transition
            );
        }

        let change = StateChange {
            previous,
            active: next,
            transition: transition.name().map(str::to_string),
            via_error_path,
            timestamp: Utc::now(),
        };

        self.history.record(StateChangeRecord {
            from: change.previous.name().to_string(),
            to: change.active.name().to_string(),
            transition: change.transition.clone(),
            via_error_path,
            timestamp: change.timestamp,
        });

        for observer in &mut self.observers {
            observer(&change);
        }

        self.stop_if_terminal(&change.active);
        change
    }

    fn stop_if_terminal(&mut self, state: &State) {
        if self.config.stop_on_terminal_state && self.is_running() && state.is_terminal() {
            self.halt("reached terminal state");
        }
    }

    fn context<'a>(&'a self, state: &'a State) -> MachineContext<'a> {
        MachineContext::new(&self.name, state)
            .with_machine_id(self.id)
            .with_trace_mode(self.config.trace_mode)
    }

    /// Visit every transition once, even when shared between states.
    fn each_unique_transition(&self, mut visit: impl FnMut(&Transition, &MachineContext<'_>)) {
        let mut seen = HashSet::new();
        for state in &self.states {
            let ctx = self.context(state);
            for transition in state.transitions() {
                if seen.insert(transition.key()) {
                    visit(&transition, &ctx);
                }
            }
        }
    }
}

impl fmt::Debug for Fsm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fsm")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status)
            .field("active", &self.active.as_ref().map(State::name))
            .field("states", &self.states.iter().map(State::name).collect::<Vec<_>>())
            .finish()
    }
}
