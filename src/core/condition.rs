//! Conditions that gate transitions.
//!
//! A [`Condition`] is a pure predicate over the machine. Leaves wrap a
//! callback, compare a [`Variable`], or delegate to a user-supplied
//! [`ConditionBehavior`]; combinators (`NOT`, `AND`, `OR`, `NAND`, `NOR` and
//! named compounds) compose other conditions and forward lifecycle hooks to
//! them.

use super::context::MachineContext;
use super::variable::{check_comparison, CmpOp, Operand, Variable};
use crate::config::TraceMode;
use crate::error::ConfigError;
use std::fmt;
use std::sync::Arc;

/// Extension point for custom conditions.
///
/// `is_satisfied` must not mutate machine state. The lifecycle hooks may
/// reset internal bookkeeping (timers, counters) and default to no-ops.
pub trait ConditionBehavior: Send + Sync {
    fn is_satisfied(&self, ctx: &MachineContext<'_>) -> bool;

    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn on_start(&self, _ctx: &MachineContext<'_>) {}

    fn on_stop(&self, _ctx: &MachineContext<'_>) {}

    fn on_enter_state(&self, _ctx: &MachineContext<'_>) {}

    fn on_exit_state(&self, _ctx: &MachineContext<'_>) {}
}

type Predicate = Arc<dyn Fn(&MachineContext<'_>) -> bool + Send + Sync>;

/// A callback-backed condition, mainly for prototyping.
#[derive(Clone)]
pub struct LambdaCondition {
    label: Option<String>,
    predicate: Predicate,
}

/// `variable <op> operand`, with kinds checked at construction.
#[derive(Debug, Clone)]
pub struct Comparison {
    variable: Variable,
    op: CmpOp,
    operand: Operand,
}

impl Comparison {
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn op(&self) -> CmpOp {
        self.op
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    fn holds(&self) -> bool {
        // kinds were checked when the comparison was built
        self.variable.compare(self.op, &self.operand).unwrap_or(false)
    }
}

/// The non-empty child list of a combinator.
#[derive(Clone)]
pub struct ConditionSet(Vec<Condition>);

impl ConditionSet {
    fn new(
        combinator: &'static str,
        conditions: impl IntoIterator<Item = Condition>,
    ) -> Result<Self, ConfigError> {
        let conditions: Vec<Condition> = conditions.into_iter().collect();
        if conditions.is_empty() {
            return Err(ConfigError::Arity {
                combinator,
                min: 1,
                found: 0,
            });
        }
        Ok(Self(conditions))
    }

    pub fn as_slice(&self) -> &[Condition] {
        &self.0
    }

    fn describe(&self, separator: &str) -> String {
        self.0
            .iter()
            .map(Condition::describe)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Several conditions under AND semantics with an optional display name.
#[derive(Clone)]
pub struct Compound {
    name: Option<String>,
    conditions: ConditionSet,
}

impl Compound {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn conditions(&self) -> &[Condition] {
        self.conditions.as_slice()
    }
}

/// A predicate gating a transition.
///
/// # Example
///
/// ```rust
/// use tickfsm::{Condition, MachineContext, State, Variable};
///
/// let armed = Variable::boolean(true);
/// let ammo = Variable::named("ammo", 3);
///
/// let can_fire = Condition::and([
///     Condition::is_true(&armed).unwrap(),
///     Condition::is_greater_or_equal(&ammo, 1).unwrap(),
/// ])
/// .unwrap();
///
/// let state = State::new("Aiming");
/// let ctx = MachineContext::new("turret", &state);
/// assert!(can_fire.is_satisfied(&ctx));
///
/// ammo.set(0).unwrap();
/// assert!(!can_fire.is_satisfied(&ctx));
/// ```
#[derive(Clone)]
pub enum Condition {
    Lambda(LambdaCondition),
    Compare(Comparison),
    Not(Box<Condition>),
    And(ConditionSet),
    Or(ConditionSet),
    Nand(ConditionSet),
    Nor(ConditionSet),
    Compound(Compound),
    Custom(Arc<dyn ConditionBehavior>),
}

impl Condition {
    pub fn lambda<F>(predicate: F) -> Self
    where
        F: Fn(&MachineContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self::Lambda(LambdaCondition {
            label: None,
            predicate: Arc::new(predicate),
        })
    }

    /// A lambda condition with a name for traces.
    pub fn named_lambda<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&MachineContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self::Lambda(LambdaCondition {
            label: Some(label.into()),
            predicate: Arc::new(predicate),
        })
    }

    /// Compare a variable with a constant or another variable.
    ///
    /// Fails if the kinds differ (an integer constant may be used with a
    /// float variable) or if an ordering operator is used on booleans.
    pub fn compare(
        variable: &Variable,
        op: CmpOp,
        operand: impl Into<Operand>,
    ) -> Result<Self, ConfigError> {
        let operand = check_comparison(variable.kind(), op, operand.into())?;
        Ok(Self::Compare(Comparison {
            variable: variable.clone(),
            op,
            operand,
        }))
    }

    pub fn is_true(variable: &Variable) -> Result<Self, ConfigError> {
        Self::compare(variable, CmpOp::Eq, true)
    }

    pub fn is_false(variable: &Variable) -> Result<Self, ConfigError> {
        Self::compare(variable, CmpOp::Eq, false)
    }

    pub fn is_greater_or_equal(
        variable: &Variable,
        operand: impl Into<Operand>,
    ) -> Result<Self, ConfigError> {
        Self::compare(variable, CmpOp::Ge, operand)
    }

    /// Logical NOT of exactly one condition.
    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Self::Not(Box::new(condition))
    }

    /// True if every child is satisfied. This is also how a transition
    /// combines its own condition list; use it inside `or` to build
    /// `OR(AND(a, b), AND(c, d))`.
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Result<Self, ConfigError> {
        ConditionSet::new("AND", conditions).map(Self::And)
    }

    /// True if at least one child is satisfied.
    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Result<Self, ConfigError> {
        ConditionSet::new("OR", conditions).map(Self::Or)
    }

    /// True unless every child is satisfied.
    pub fn nand(conditions: impl IntoIterator<Item = Condition>) -> Result<Self, ConfigError> {
        ConditionSet::new("NAND", conditions).map(Self::Nand)
    }

    /// True only if no child is satisfied.
    pub fn nor(conditions: impl IntoIterator<Item = Condition>) -> Result<Self, ConfigError> {
        ConditionSet::new("NOR", conditions).map(Self::Nor)
    }

    /// Group conditions under AND semantics without a name.
    pub fn compound(conditions: impl IntoIterator<Item = Condition>) -> Result<Self, ConfigError> {
        let conditions = ConditionSet::new("compound", conditions)?;
        Ok(Self::Compound(Compound {
            name: None,
            conditions,
        }))
    }

    /// Group conditions under AND semantics behind a readable name.
    pub fn named(
        name: impl Into<String>,
        conditions: impl IntoIterator<Item = Condition>,
    ) -> Result<Self, ConfigError> {
        let conditions = ConditionSet::new("compound", conditions)?;
        Ok(Self::Compound(Compound {
            name: Some(name.into()),
            conditions,
        }))
    }

    pub fn custom<C>(behavior: C) -> Self
    where
        C: ConditionBehavior + 'static,
    {
        Self::Custom(Arc::new(behavior))
    }

    pub fn is_satisfied(&self, ctx: &MachineContext<'_>) -> bool {
        match self {
            Self::Lambda(lambda) => (lambda.predicate)(ctx),
            Self::Compare(comparison) => comparison.holds(),
            Self::Not(inner) => !inner.is_satisfied(ctx),
            Self::And(children) => evaluate(children.as_slice(), Logic::All, ctx),
            Self::Or(children) => evaluate(children.as_slice(), Logic::Any, ctx),
            Self::Nand(children) => !evaluate(children.as_slice(), Logic::All, ctx),
            Self::Nor(children) => !evaluate(children.as_slice(), Logic::Any, ctx),
            Self::Compound(compound) => evaluate(compound.conditions(), Logic::All, ctx),
            Self::Custom(behavior) => behavior.is_satisfied(ctx),
        }
    }

    /// Human-readable description for traces.
    pub fn describe(&self) -> String {
        match self {
            Self::Lambda(lambda) => lambda
                .label
                .clone()
                .unwrap_or_else(|| "condition".to_string()),
            Self::Compare(c) => format!("{} {} {}", c.variable.label(), c.op, c.operand),
            Self::Not(inner) => format!("NOT({})", inner.describe()),
            Self::And(children) => format!("AND({})", children.describe(", ")),
            Self::Or(children) => format!("OR({})", children.describe(", ")),
            Self::Nand(children) => format!("NAND({})", children.describe(", ")),
            Self::Nor(children) => format!("NOR({})", children.describe(", ")),
            Self::Compound(compound) => match &compound.name {
                Some(name) if !name.trim().is_empty() => name.clone(),
                _ => format!("[{}]", compound.conditions.describe("; ")),
            },
            Self::Custom(behavior) => behavior.describe(),
        }
    }

    /// Child conditions of a combinator, empty for leaves.
    pub fn children(&self) -> &[Condition] {
        match self {
            Self::Not(inner) => std::slice::from_ref(&**inner),
            Self::And(children) | Self::Or(children) | Self::Nand(children) | Self::Nor(children) => {
                children.as_slice()
            }
            Self::Compound(compound) => compound.conditions(),
            Self::Lambda(_) | Self::Compare(_) | Self::Custom(_) => &[],
        }
    }

    pub fn on_start(&self, ctx: &MachineContext<'_>) {
        self.visit(ctx, |behavior, ctx| behavior.on_start(ctx));
    }

    pub fn on_stop(&self, ctx: &MachineContext<'_>) {
        self.visit(ctx, |behavior, ctx| behavior.on_stop(ctx));
    }

    pub fn on_enter_state(&self, ctx: &MachineContext<'_>) {
        self.visit(ctx, |behavior, ctx| behavior.on_enter_state(ctx));
    }

    pub fn on_exit_state(&self, ctx: &MachineContext<'_>) {
        self.visit(ctx, |behavior, ctx| behavior.on_exit_state(ctx));
    }

    /// Run `hook` on every custom condition in this tree, depth first.
    fn visit<F>(&self, ctx: &MachineContext<'_>, hook: F)
    where
        F: Fn(&dyn ConditionBehavior, &MachineContext<'_>) + Copy,
    {
        match self {
            Self::Custom(behavior) => hook(behavior.as_ref(), ctx),
            other => {
                for child in other.children() {
                    child.visit(ctx, hook);
                }
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Condition({})", self.describe())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Logic {
    All,
    Any,
}

/// Evaluate `conditions` in order under AND (`All`) or OR (`Any`) semantics.
///
/// Every evaluated child is traced when the context has logging enabled. In
/// `ShortCircuit` mode evaluation stops at the first deciding child; in
/// `EvaluateAll` mode the remaining children are still evaluated and traced.
/// An empty list is satisfied under `All` and unsatisfied under `Any`.
pub(crate) fn evaluate(conditions: &[Condition], logic: Logic, ctx: &MachineContext<'_>) -> bool {
    let mut decided = None;

    for condition in conditions {
        let satisfied = condition.is_satisfied(ctx);

        if ctx.logging() {
            tracing::debug!(
                machine = ctx.machine(),
                state = ctx.state().name(),
                transition = ctx.transition().unwrap_or("-"),
                satisfied,
                "condition {}",
                condition.describe()
            );
        }

        let deciding = match logic {
            Logic::All => !satisfied,
            Logic::Any => satisfied,
        };
        if deciding && decided.is_none() {
            decided = Some(satisfied);
            if ctx.trace_mode() == TraceMode::ShortCircuit {
                break;
            }
        }
    }

    decided.unwrap_or(logic == Logic::All)
}
