//! Typed variables read by conditions and written by actions.
//!
//! A [`Variable`] is a shared handle to a mutable cell holding a boolean,
//! integer or floating-point [`Value`]. Its kind is fixed when it is created;
//! every write and every comparison is checked against that kind.

use crate::error::ConfigError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// The kind of value a variable holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarKind {
    Bool,
    Int,
    Float,
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
        })
    }
}

/// A variable's value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn kind(&self) -> VarKind {
        match self {
            Self::Bool(_) => VarKind::Bool,
            Self::Int(_) => VarKind::Int,
            Self::Float(_) => VarKind::Float,
        }
    }

    /// Convert to `kind`. Integers widen to floats; nothing else converts.
    pub fn coerce(self, kind: VarKind) -> Option<Value> {
        match (self, kind) {
            (Self::Int(v), VarKind::Float) => Some(Self::Float(v as f64)),
            (value, kind) if value.kind() == kind => Some(value),
            _ => None,
        }
    }

    fn ordering(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Comparison operators available to variable conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Operators that need an order, which booleans do not have.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Self::Eq | Self::Ne)
    }

    /// `None` means the operands are unordered (NaN), which only `!=` accepts.
    fn holds(&self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (Self::Ne, ordering) => ordering != Some(Ordering::Equal),
            (_, None) => false,
            (Self::Eq, Some(o)) => o == Ordering::Equal,
            (Self::Lt, Some(o)) => o == Ordering::Less,
            (Self::Le, Some(o)) => o != Ordering::Greater,
            (Self::Gt, Some(o)) => o == Ordering::Greater,
            (Self::Ge, Some(o)) => o != Ordering::Less,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

struct VariableInner {
    name: Option<String>,
    kind: VarKind,
    value: RwLock<Value>,
}

/// Shared handle to a typed mutable cell.
///
/// Clones refer to the same cell. The engine performs no synchronization
/// beyond the cell's own lock; a variable shared between machines is the
/// caller's responsibility.
///
/// # Example
///
/// ```rust
/// use tickfsm::{Value, Variable};
///
/// let health = Variable::named("health", 10);
/// let alias = health.clone();
///
/// alias.set(7).unwrap();
/// assert_eq!(health.get(), Value::Int(7));
/// assert!(health.set(true).is_err());
/// ```
#[derive(Clone)]
pub struct Variable {
    inner: Arc<VariableInner>,
}

impl Variable {
    /// Create an unnamed variable; its kind is the kind of `initial`.
    pub fn new(initial: impl Into<Value>) -> Self {
        Self::build(None, initial.into())
    }

    /// Create a variable with a name used in debug descriptions.
    pub fn named(name: impl Into<String>, initial: impl Into<Value>) -> Self {
        Self::build(Some(name.into()), initial.into())
    }

    pub fn boolean(initial: bool) -> Self {
        Self::new(initial)
    }

    pub fn integer(initial: i64) -> Self {
        Self::new(initial)
    }

    pub fn float(initial: f64) -> Self {
        Self::new(initial)
    }

    fn build(name: Option<String>, value: Value) -> Self {
        Self {
            inner: Arc::new(VariableInner {
                name,
                kind: value.kind(),
                value: RwLock::new(value),
            }),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn kind(&self) -> VarKind {
        self.inner.kind
    }

    pub fn get(&self) -> Value {
        *self.inner.value.read()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.get() {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.get() {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.get() {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Store a new value. Integers are widened for float variables; any
    /// other kind change is rejected.
    pub fn set(&self, value: impl Into<Value>) -> Result<(), ConfigError> {
        let value = value.into();
        let coerced = value.coerce(self.kind()).ok_or(ConfigError::TypeMismatch {
            left: self.kind(),
            right: value.kind(),
        })?;
        *self.inner.value.write() = coerced;
        Ok(())
    }

    /// Compare the current value against `operand`.
    pub fn compare(&self, op: CmpOp, operand: &Operand) -> Result<bool, ConfigError> {
        let operand = check_comparison(self.kind(), op, operand.clone())?;
        Ok(op.holds(self.get().ordering(&operand.value())))
    }

    /// True if both handles refer to the same cell.
    pub fn same(&self, other: &Variable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn label(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => format!("<{}>", self.get()),
        }
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.inner.name)
            .field("value", &self.get())
            .finish()
    }
}

/// Right-hand side of a comparison: a constant or another variable.
#[derive(Debug, Clone)]
pub enum Operand {
    Const(Value),
    Var(Variable),
}

impl Operand {
    pub fn kind(&self) -> VarKind {
        match self {
            Self::Const(value) => value.kind(),
            Self::Var(variable) => variable.kind(),
        }
    }

    pub fn value(&self) -> Value {
        match self {
            Self::Const(value) => *value,
            Self::Var(variable) => variable.get(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "{value}"),
            Self::Var(variable) => f.write_str(&variable.label()),
        }
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Self::Const(value)
    }
}

impl From<Variable> for Operand {
    fn from(variable: Variable) -> Self {
        Self::Var(variable)
    }
}

impl From<&Variable> for Operand {
    fn from(variable: &Variable) -> Self {
        Self::Var(variable.clone())
    }
}

impl From<bool> for Operand {
    fn from(v: bool) -> Self {
        Self::Const(v.into())
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Self::Const(v.into())
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Self::Const(v.into())
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Self::Const(v.into())
    }
}

/// Check that a `kind` variable can be compared with `operand` using `op`.
///
/// Constants are converted to the variable's kind (integer constants widen
/// for float variables). Variable operands must have exactly the same kind.
pub(crate) fn check_comparison(
    kind: VarKind,
    op: CmpOp,
    operand: Operand,
) -> Result<Operand, ConfigError> {
    if kind == VarKind::Bool && op.is_ordering() {
        return Err(ConfigError::UnsupportedOperator { op, kind });
    }

    match operand {
        Operand::Const(value) => value
            .coerce(kind)
            .map(Operand::Const)
            .ok_or(ConfigError::TypeMismatch {
                left: kind,
                right: value.kind(),
            }),
        Operand::Var(variable) if variable.kind() == kind => Ok(Operand::Var(variable)),
        Operand::Var(variable) => Err(ConfigError::TypeMismatch {
            left: kind,
            right: variable.kind(),
        }),
    }
}
