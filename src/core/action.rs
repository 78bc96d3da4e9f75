//! Actions executed when a transition fires.
//!
//! Synchronous and suspending actions share one shape: every action yields a
//! future, and the executor awaits each one before starting the next. A
//! synchronous action's future is simply ready on first poll.

use super::context::MachineContext;
use super::variable::{Value, VarKind, Variable};
use crate::error::{ActionFault, ConfigError};
use async_trait::async_trait;
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use stillwater::effect::{BoxedEffect, Effect};

/// Future produced by one action execution.
pub type ActionFuture<'a> = LocalBoxFuture<'a, Result<(), ActionFault>>;

type Callback = Arc<dyn Fn(&MachineContext<'_>) -> Result<(), ActionFault> + Send + Sync>;

type Suspend =
    Arc<dyn Fn(&MachineContext<'_>) -> LocalBoxFuture<'static, Result<(), ActionFault>> + Send + Sync>;

/// Factory for a fresh stillwater effect on each execution.
pub type EffectFactory = Arc<dyn Fn() -> BoxedEffect<(), ActionFault, ()> + Send + Sync>;

/// Extension point for custom actions.
///
/// `execute` may await; the machine waits for it to finish before running
/// the next action of the same transition. There is no built-in timeout or
/// cancellation, an implementation that needs either must provide it.
#[async_trait(?Send)]
pub trait ActionBehavior: Send + Sync {
    async fn execute(&self, ctx: &MachineContext<'_>) -> Result<(), ActionFault>;

    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn on_start(&self, _ctx: &MachineContext<'_>) {}

    fn on_stop(&self, _ctx: &MachineContext<'_>) {}

    fn on_enter_state(&self, _ctx: &MachineContext<'_>) {}

    fn on_exit_state(&self, _ctx: &MachineContext<'_>) {}
}

#[derive(Clone)]
pub struct LambdaAction {
    label: Option<String>,
    callback: Callback,
}

#[derive(Clone)]
pub struct SuspendingAction {
    label: Option<String>,
    start: Suspend,
}

#[derive(Clone)]
pub struct EffectAction {
    label: Option<String>,
    factory: EffectFactory,
}

/// How a [`VariableMutation`] changes its variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutation {
    Assign(Value),
    Add(Value),
    Toggle,
}

/// A built-in action writing a variable.
#[derive(Debug, Clone)]
pub struct VariableMutation {
    variable: Variable,
    mutation: Mutation,
}

impl VariableMutation {
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn mutation(&self) -> Mutation {
        self.mutation
    }

    fn apply(&self) -> Result<(), ActionFault> {
        let next = match (self.mutation, self.variable.get()) {
            (Mutation::Assign(value), _) => value,
            (Mutation::Toggle, Value::Bool(current)) => Value::Bool(!current),
            (Mutation::Add(Value::Int(delta)), Value::Int(current)) => {
                current.checked_add(delta).map(Value::Int).ok_or_else(|| {
                    ActionFault::new(format!(
                        "{} overflowed adding {delta}",
                        self.variable.label()
                    ))
                })?
            }
            (Mutation::Add(Value::Float(delta)), Value::Float(current)) => {
                Value::Float(current + delta)
            }
            (mutation, current) => {
                return Err(ActionFault::new(format!(
                    "cannot apply {mutation:?} to {} value {current}",
                    current.kind()
                )))
            }
        };
        self.variable.set(next).map_err(ActionFault::from_error)
    }

    fn describe(&self) -> String {
        let name = self.variable.label();
        match self.mutation {
            Mutation::Assign(value) => format!("{name} = {value}"),
            Mutation::Add(delta) => format!("{name} += {delta}"),
            Mutation::Toggle => format!("{name} = !{name}"),
        }
    }
}

/// A unit of work run when a transition fires.
///
/// # Example
///
/// ```rust
/// use tickfsm::{Action, ActionFault, MachineContext, State, Variable};
///
/// let hits = Variable::named("hits", 0);
/// let state = State::new("Fighting");
/// let ctx = MachineContext::new("duel", &state);
///
/// let hit = Action::add(&hits, 1).unwrap();
/// let fail = Action::try_lambda(|_| Err(ActionFault::new("parried")));
///
/// futures::executor::block_on(async {
///     hit.execute(&ctx).await.unwrap();
///     assert!(fail.execute(&ctx).await.is_err());
/// });
/// assert_eq!(hits.as_int(), Some(1));
/// ```
#[derive(Clone)]
pub enum Action {
    Lambda(LambdaAction),
    Suspending(SuspendingAction),
    Effect(EffectAction),
    Mutate(VariableMutation),
    Custom(Arc<dyn ActionBehavior>),
}

impl Action {
    /// An infallible synchronous callback.
    pub fn lambda<F>(callback: F) -> Self
    where
        F: Fn(&MachineContext<'_>) + Send + Sync + 'static,
    {
        Self::Lambda(LambdaAction {
            label: None,
            callback: Arc::new(move |ctx: &MachineContext<'_>| {
                callback(ctx);
                Ok(())
            }),
        })
    }

    /// A synchronous callback that may raise a fault.
    pub fn try_lambda<F>(callback: F) -> Self
    where
        F: Fn(&MachineContext<'_>) -> Result<(), ActionFault> + Send + Sync + 'static,
    {
        Self::Lambda(LambdaAction {
            label: None,
            callback: Arc::new(callback),
        })
    }

    /// An action that suspends. The closure starts a fresh future on each
    /// execution; the future must not borrow the context.
    pub fn suspending<F, Fut>(start: F) -> Self
    where
        F: Fn(&MachineContext<'_>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionFault>> + 'static,
    {
        Self::Suspending(SuspendingAction {
            label: None,
            start: Arc::new(move |ctx: &MachineContext<'_>| start(ctx).boxed_local()),
        })
    }

    /// An action backed by a stillwater effect, built anew for every run.
    pub fn effect<F>(factory: F) -> Self
    where
        F: Fn() -> BoxedEffect<(), ActionFault, ()> + Send + Sync + 'static,
    {
        Self::Effect(EffectAction {
            label: None,
            factory: Arc::new(factory),
        })
    }

    /// Assign `value` to `variable`; kinds are checked now, not at run time.
    pub fn set(variable: &Variable, value: impl Into<Value>) -> Result<Self, ConfigError> {
        let value = value.into();
        let value = value.coerce(variable.kind()).ok_or(ConfigError::TypeMismatch {
            left: variable.kind(),
            right: value.kind(),
        })?;
        Ok(Self::mutate(variable, Mutation::Assign(value)))
    }

    pub fn set_true(variable: &Variable) -> Result<Self, ConfigError> {
        Self::set(variable, true)
    }

    pub fn set_false(variable: &Variable) -> Result<Self, ConfigError> {
        Self::set(variable, false)
    }

    /// Add `delta` to a numeric variable. Integer overflow is a fault.
    pub fn add(variable: &Variable, delta: impl Into<Value>) -> Result<Self, ConfigError> {
        let delta = delta.into();
        if variable.kind() == VarKind::Bool {
            return Err(ConfigError::TypeMismatch {
                left: VarKind::Bool,
                right: delta.kind(),
            });
        }
        let delta = delta.coerce(variable.kind()).ok_or(ConfigError::TypeMismatch {
            left: variable.kind(),
            right: delta.kind(),
        })?;
        Ok(Self::mutate(variable, Mutation::Add(delta)))
    }

    /// Flip a boolean variable.
    pub fn toggle(variable: &Variable) -> Result<Self, ConfigError> {
        if variable.kind() != VarKind::Bool {
            return Err(ConfigError::TypeMismatch {
                left: variable.kind(),
                right: VarKind::Bool,
            });
        }
        Ok(Self::mutate(variable, Mutation::Toggle))
    }

    fn mutate(variable: &Variable, mutation: Mutation) -> Self {
        Self::Mutate(VariableMutation {
            variable: variable.clone(),
            mutation,
        })
    }

    pub fn custom<A>(behavior: A) -> Self
    where
        A: ActionBehavior + 'static,
    {
        Self::Custom(Arc::new(behavior))
    }

    /// Name a closure-based action for traces. Mutations and custom
    /// actions describe themselves and are returned unchanged.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        match &mut self {
            Self::Lambda(LambdaAction { label: slot, .. })
            | Self::Suspending(SuspendingAction { label: slot, .. })
            | Self::Effect(EffectAction { label: slot, .. }) => *slot = Some(label.into()),
            Self::Mutate(_) | Self::Custom(_) => {}
        }
        self
    }

    /// Start this action. The returned future completes when the action has.
    pub fn execute<'a>(&'a self, ctx: &'a MachineContext<'a>) -> ActionFuture<'a> {
        match self {
            Self::Lambda(lambda) => future::ready((lambda.callback)(ctx)).boxed_local(),
            Self::Suspending(suspending) => {
                let running = (suspending.start)(ctx);
                async move { running.await }.boxed_local()
            }
            Self::Effect(effect) => {
                let effect = (effect.factory)();
                async move { effect.run(&()).await }.boxed_local()
            }
            Self::Mutate(mutation) => future::ready(mutation.apply()).boxed_local(),
            Self::Custom(behavior) => behavior.execute(ctx),
        }
    }

    pub fn describe(&self) -> String {
        let label = |label: &Option<String>, fallback: &str| {
            label.clone().unwrap_or_else(|| fallback.to_string())
        };
        match self {
            Self::Lambda(lambda) => label(&lambda.label, "action"),
            Self::Suspending(suspending) => label(&suspending.label, "suspending action"),
            Self::Effect(effect) => label(&effect.label, "effect"),
            Self::Mutate(mutation) => mutation.describe(),
            Self::Custom(behavior) => behavior.describe(),
        }
    }

    pub fn on_start(&self, ctx: &MachineContext<'_>) {
        if let Self::Custom(behavior) = self {
            behavior.on_start(ctx);
        }
    }

    pub fn on_stop(&self, ctx: &MachineContext<'_>) {
        if let Self::Custom(behavior) = self {
            behavior.on_stop(ctx);
        }
    }

    pub fn on_enter_state(&self, ctx: &MachineContext<'_>) {
        if let Self::Custom(behavior) = self {
            behavior.on_enter_state(ctx);
        }
    }

    pub fn on_exit_state(&self, ctx: &MachineContext<'_>) {
        if let Self::Custom(behavior) = self {
            behavior.on_exit_state(ctx);
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({})", self.describe())
    }
}

/// Run `actions` strictly in order, awaiting each. Stops at the first fault.
pub(crate) async fn execute_all(
    actions: &[Action],
    ctx: &MachineContext<'_>,
) -> Result<(), ActionFault> {
    for action in actions {
        if ctx.logging() {
            tracing::debug!(
                machine = ctx.machine(),
                state = ctx.state().name(),
                transition = ctx.transition().unwrap_or("-"),
                "execute {}",
                action.describe()
            );
        }
        action.execute(ctx).await?;
    }
    Ok(())
}

/// Run every action in order regardless of faults, logging each one.
pub(crate) async fn execute_best_effort(actions: &[Action], ctx: &MachineContext<'_>) {
    for action in actions {
        if let Err(fault) = action.execute(ctx).await {
            tracing::warn!(
                machine = ctx.machine(),
                "{} [{}]: error action '{}' failed: {}",
                ctx.state().name(),
                ctx.transition().unwrap_or("-"),
                action.describe(),
                fault
            );
        }
    }
}
