//! Transitions: guarded edges that run actions and may move the machine.

use super::state::{State, StateInner};
use crate::core::{evaluate, execute_all, execute_best_effort, Action, Condition, Logic, MachineContext};
use crate::error::{ConfigError, FsmError, TransitionField};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

/// Weak link to a destination state. The machine owns its states.
struct StateRef {
    name: String,
    state: Weak<StateInner>,
}

impl StateRef {
    fn new(state: &State) -> Self {
        Self {
            name: state.name().to_string(),
            state: state.downgrade(),
        }
    }

    fn upgrade(&self) -> Option<State> {
        self.state.upgrade().map(State::from_inner)
    }
}

struct TransitionInner {
    name: Option<String>,
    sealed: AtomicBool,
    conditions: OnceLock<Vec<Condition>>,
    actions: OnceLock<Vec<Action>>,
    goto: OnceLock<StateRef>,
    error_actions: OnceLock<Vec<Action>>,
    error_goto: OnceLock<StateRef>,
}

/// What happened when a transition was evaluated.
#[derive(Debug)]
pub(crate) enum Firing {
    /// Conditions not satisfied; nothing ran.
    Skipped,
    /// Actions ran. `recovered` is set when a fault was absorbed by the
    /// error path, in which case `goto` is the error destination.
    Fired { goto: Option<State>, recovered: bool },
}

/// An edge leaving a state.
///
/// Conditions, actions, destination, error actions and error destination are
/// each assigned at most once; a second assignment is a [`ConfigError`].
/// Unset conditions are always satisfied. Without a destination the
/// transition is a self-transition: its actions run but the active state
/// stays put.
///
/// `Transition` is a clonable handle. Attaching one transition to several
/// states shares it rather than copying it.
///
/// # Example
///
/// ```rust
/// use tickfsm::{Action, Condition, State, Transition, Variable};
///
/// let ready = Variable::named("ready", false);
/// let (waiting, running) = (State::new("Waiting"), State::new("Running"));
///
/// let go = Transition::named("go");
/// go.with_conditions([Condition::is_true(&ready).unwrap()])
///     .unwrap()
///     .with_actions([Action::lambda(|_| println!("going"))])
///     .unwrap()
///     .to_state(&running)
///     .unwrap();
/// go.add_to_states(&[waiting.clone()]).unwrap();
///
/// assert!(go.to_state(&waiting).is_err());
/// assert_eq!(go.goto_state(), Some(running));
/// ```
#[derive(Clone)]
pub struct Transition {
    inner: Arc<TransitionInner>,
}

impl Default for Transition {
    fn default() -> Self {
        Self::new()
    }
}

impl Transition {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::build(Some(name.into()))
    }

    fn build(name: Option<String>) -> Self {
        Self {
            inner: Arc::new(TransitionInner {
                name,
                sealed: AtomicBool::new(false),
                conditions: OnceLock::new(),
                actions: OnceLock::new(),
                goto: OnceLock::new(),
                error_actions: OnceLock::new(),
                error_goto: OnceLock::new(),
            }),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Set the destination state.
    pub fn to_state(&self, state: &State) -> Result<&Self, ConfigError> {
        self.assign(&self.inner.goto, StateRef::new(state), TransitionField::GotoState)
    }

    /// Set the state entered when an action faults.
    pub fn to_error_state(&self, state: &State) -> Result<&Self, ConfigError> {
        self.assign(
            &self.inner.error_goto,
            StateRef::new(state),
            TransitionField::ErrorGotoState,
        )
    }

    pub fn with_conditions<I>(&self, conditions: I) -> Result<&Self, ConfigError>
    where
        I: IntoIterator<Item = Condition>,
    {
        self.assign(
            &self.inner.conditions,
            conditions.into_iter().collect(),
            TransitionField::Conditions,
        )
    }

    pub fn with_actions<I>(&self, actions: I) -> Result<&Self, ConfigError>
    where
        I: IntoIterator<Item = Action>,
    {
        self.assign(
            &self.inner.actions,
            actions.into_iter().collect(),
            TransitionField::Actions,
        )
    }

    /// Actions run, best-effort, when one of the regular actions faults.
    pub fn with_error_actions<I>(&self, actions: I) -> Result<&Self, ConfigError>
    where
        I: IntoIterator<Item = Action>,
    {
        self.assign(
            &self.inner.error_actions,
            actions.into_iter().collect(),
            TransitionField::ErrorActions,
        )
    }

    /// Attach this transition to every state in `states`.
    pub fn add_to_states(&self, states: &[State]) -> Result<&Self, ConfigError> {
        for state in states {
            state.add_transitions([self.clone()])?;
        }
        Ok(self)
    }

    fn assign<T>(&self, slot: &OnceLock<T>, value: T, field: TransitionField) -> Result<&Self, ConfigError> {
        if self.is_sealed() {
            return Err(ConfigError::TopologySealed {
                owner: self.to_string(),
            });
        }
        slot.set(value).map_err(|_| ConfigError::FieldAlreadySet {
            transition: self.to_string(),
            field,
        })?;
        Ok(self)
    }

    pub fn conditions(&self) -> &[Condition] {
        self.inner.conditions.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn actions(&self) -> &[Action] {
        self.inner.actions.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn error_actions(&self) -> Option<&[Action]> {
        self.inner.error_actions.get().map(Vec::as_slice)
    }

    /// The destination, if set and still alive.
    pub fn goto_state(&self) -> Option<State> {
        self.inner.goto.get().and_then(StateRef::upgrade)
    }

    pub fn error_goto_state(&self) -> Option<State> {
        self.inner.error_goto.get().and_then(StateRef::upgrade)
    }

    /// Name of the destination as it was when assigned.
    pub(crate) fn goto_name(&self) -> Option<&str> {
        self.inner.goto.get().map(|target| target.name.as_str())
    }

    pub(crate) fn error_goto_name(&self) -> Option<&str> {
        self.inner.error_goto.get().map(|target| target.name.as_str())
    }

    /// True when a fault in this transition's actions is handled locally.
    pub fn has_error_path(&self) -> bool {
        self.inner.error_actions.get().is_some() || self.inner.error_goto.get().is_some()
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.sealed.load(Ordering::Acquire)
    }

    pub(crate) fn seal(&self) {
        self.inner.sealed.store(true, Ordering::Release);
    }

    pub(crate) fn ptr_eq(&self, other: &Transition) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stable identity for deduplicating shared transitions.
    pub(crate) fn key(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    pub(crate) fn label(&self) -> String {
        self.name().unwrap_or("unnamed").to_string()
    }

    /// Evaluate conditions and, if they hold, run the actions.
    pub(crate) async fn update(&self, ctx: &MachineContext<'_>) -> Result<Firing, FsmError> {
        let label = self.label();
        let ctx = ctx.for_transition(&label);

        if !evaluate(self.conditions(), Logic::All, &ctx) {
            return Ok(Firing::Skipped);
        }

        match execute_all(self.actions(), &ctx).await {
            Ok(()) => Ok(Firing::Fired {
                goto: self.resolve(ctx.state(), self.inner.goto.get())?,
                recovered: false,
            }),
            Err(fault) if self.has_error_path() => {
                tracing::warn!(
                    machine = ctx.machine(),
                    "{} [{}]: action fault handled by error path: {}",
                    ctx.state().name(),
                    label,
                    fault
                );
                if let Some(actions) = self.error_actions() {
                    execute_best_effort(actions, &ctx).await;
                }
                Ok(Firing::Fired {
                    goto: self.resolve(ctx.state(), self.inner.error_goto.get())?,
                    recovered: true,
                })
            }
            Err(fault) => {
                let state = ctx.state().name().to_string();
                Err(FsmError::Action {
                    state,
                    transition: label,
                    fault,
                })
            }
        }
    }

    fn resolve(&self, from: &State, target: Option<&StateRef>) -> Result<Option<State>, ConfigError> {
        match target {
            None => Ok(None),
            Some(target) => target.upgrade().map(Some).ok_or_else(|| {
                ConfigError::UnregisteredGotoState {
                    state: from.name().to_string(),
                    transition: self.to_string(),
                    target: target.name.clone(),
                }
            }),
        }
    }

    pub(crate) fn on_start(&self, ctx: &MachineContext<'_>) {
        self.each_condition(|condition| condition.on_start(ctx));
        self.each_action(|action| action.on_start(ctx));
    }

    pub(crate) fn on_stop(&self, ctx: &MachineContext<'_>) {
        self.each_condition(|condition| condition.on_stop(ctx));
        self.each_action(|action| action.on_stop(ctx));
    }

    pub(crate) fn on_enter_state(&self, ctx: &MachineContext<'_>) {
        self.each_condition(|condition| condition.on_enter_state(ctx));
        self.each_action(|action| action.on_enter_state(ctx));
    }

    pub(crate) fn on_exit_state(&self, ctx: &MachineContext<'_>) {
        self.each_condition(|condition| condition.on_exit_state(ctx));
        self.each_action(|action| action.on_exit_state(ctx));
    }

    fn each_condition(&self, f: impl Fn(&Condition)) {
        self.conditions().iter().for_each(f);
    }

    fn each_action(&self, f: impl Fn(&Action)) {
        self.actions()
            .iter()
            .chain(self.error_actions().unwrap_or(&[]))
            .for_each(f);
    }
}

impl PartialEq for Transition {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Transition {}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Transition({name})"),
            None => f.write_str("Transition"),
        }
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.inner.name)
            .field("conditions", &self.conditions())
            .field("actions", &self.actions())
            .field("goto", &self.goto_name())
            .field("error_actions", &self.error_actions())
            .field("error_goto", &self.error_goto_name())
            .finish()
    }
}
