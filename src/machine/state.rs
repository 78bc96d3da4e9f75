//! States: named nodes owning an ordered list of outgoing transitions.

use super::transition::Transition;
use crate::core::MachineContext;
use crate::error::ConfigError;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

pub(crate) struct StateInner {
    name: String,
    logging: AtomicBool,
    sealed: AtomicBool,
    transitions: RwLock<Vec<Transition>>,
}

/// A named node of a machine.
///
/// `State` is a cheap, clonable handle; clones refer to the same node.
/// Identity, not name, decides equality, so one state object may be
/// registered with several machines and used as the destination of any
/// number of transitions.
///
/// The name is not checked here. Empty names are reported when the owning
/// machine starts.
///
/// # Example
///
/// ```rust
/// use tickfsm::State;
///
/// let idle = State::new("Idle");
/// let walking = State::new("Walking");
///
/// let start_walking = idle.add_named_transition("start walking").unwrap();
/// start_walking.to_state(&walking).unwrap();
///
/// assert_eq!(idle.transition_count(), 1);
/// assert!(walking.is_terminal());
/// ```
#[derive(Clone)]
pub struct State {
    inner: Arc<StateInner>,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(StateInner {
                name: name.into(),
                logging: AtomicBool::new(false),
                sealed: AtomicBool::new(false),
                transitions: RwLock::new(Vec::new()),
            }),
        }
    }

    /// One state per name, in order.
    pub fn many<I, N>(names: I) -> Vec<State>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        names.into_iter().map(State::new).collect()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether conditions and actions of this state's transitions are traced.
    pub fn logging(&self) -> bool {
        self.inner.logging.load(Ordering::Relaxed)
    }

    /// Toggle tracing. Unlike the topology this may change at any time.
    pub fn set_logging(&self, enabled: bool) {
        self.inner.logging.store(enabled, Ordering::Relaxed);
    }

    pub fn with_logging(self, enabled: bool) -> Self {
        self.set_logging(enabled);
        self
    }

    /// Create an unnamed transition and attach it to this state.
    pub fn add_transition(&self) -> Result<Transition, ConfigError> {
        let transition = Transition::new();
        self.add_transitions([transition.clone()])?;
        Ok(transition)
    }

    pub fn add_named_transition(&self, name: impl Into<String>) -> Result<Transition, ConfigError> {
        let transition = Transition::named(name);
        self.add_transitions([transition.clone()])?;
        Ok(transition)
    }

    /// Append existing transitions, in order, after the ones already held.
    pub fn add_transitions<I>(&self, transitions: I) -> Result<&Self, ConfigError>
    where
        I: IntoIterator<Item = Transition>,
    {
        if self.is_sealed() {
            return Err(ConfigError::TopologySealed {
                owner: format!("state '{}'", self.name()),
            });
        }
        self.inner.transitions.write().extend(transitions);
        Ok(self)
    }

    /// Snapshot of the transitions in registration order.
    pub fn transitions(&self) -> Vec<Transition> {
        self.inner.transitions.read().clone()
    }

    pub fn transition_count(&self) -> usize {
        self.inner.transitions.read().len()
    }

    /// A state without outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        self.inner.transitions.read().is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.sealed.load(Ordering::Acquire)
    }

    /// Freeze this state and every transition it holds.
    pub(crate) fn seal(&self) {
        self.inner.sealed.store(true, Ordering::Release);
        for transition in self.inner.transitions.read().iter() {
            transition.seal();
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<StateInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn from_inner(inner: Arc<StateInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn on_enter(&self, ctx: &MachineContext<'_>) {
        for transition in self.transitions() {
            transition.on_enter_state(ctx);
        }
    }

    pub(crate) fn on_exit(&self, ctx: &MachineContext<'_>) {
        for transition in self.transitions() {
            transition.on_exit_state(ctx);
        }
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for State {}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.inner.name)
            .field("transitions", &self.transition_count())
            .field("logging", &self.logging())
            .finish()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn many_creates_states_in_order() {
        let states = State::many(["A", "B", "C"]);

        let names: Vec<&str> = states.iter().map(State::name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn equality_is_identity() {
        let a = State::new("Same");
        let b = State::new("Same");

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn transitions_keep_registration_order() {
        let state = State::new("S");
        let first = state.add_named_transition("first").unwrap();
        let second = state.add_named_transition("second").unwrap();

        let held = state.transitions();
        assert_eq!(held, vec![first, second]);
        assert!(!state.is_terminal());
    }

    #[test]
    fn sealed_state_rejects_new_transitions() {
        let state = State::new("S");
        let transition = state.add_transition().unwrap();

        state.seal();

        assert!(transition.is_sealed());
        assert_eq!(
            state.add_transition().unwrap_err(),
            ConfigError::TopologySealed {
                owner: "state 'S'".to_string()
            }
        );
    }

    #[test]
    fn logging_flag_can_change_after_sealing() {
        let state = State::new("S").with_logging(true);
        state.seal();

        state.set_logging(false);

        assert!(!state.logging());
    }
}
