//! State change history tracking.
//!
//! Every change of the active state is appended as a [`StateChangeRecord`].
//! Records hold state names rather than handles so a history can be
//! serialized and inspected after the machine is gone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single change of the active state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateChangeRecord {
    /// The state that was active before the change
    pub from: String,
    /// The state that became active
    pub to: String,
    /// Name of the transition that caused the change, if it had one
    pub transition: Option<String>,
    /// Whether the change went through the transition's error path
    pub via_error_path: bool,
    /// When the change happened
    pub timestamp: DateTime<Utc>,
}

/// Ordered, optionally bounded history of state changes.
///
/// When a limit is set the oldest records are dropped first.
///
/// # Example
///
/// ```rust
/// use tickfsm::{StateChangeRecord, StateHistory};
/// use chrono::Utc;
///
/// let mut history = StateHistory::new();
///
/// history.record(StateChangeRecord {
///     from: "Start".into(),
///     to: "Middle".into(),
///     transition: None,
///     via_error_path: false,
///     timestamp: Utc::now(),
/// });
/// history.record(StateChangeRecord {
///     from: "Middle".into(),
///     to: "End".into(),
///     transition: Some("finish".into()),
///     via_error_path: false,
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.get_path(), vec!["Start", "Middle", "End"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateHistory {
    records: Vec<StateChangeRecord>,
    limit: Option<usize>,
}

impl StateHistory {
    /// Create an unbounded, empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty history keeping at most `limit` records.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            records: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Append a record, evicting the oldest ones past the limit.
    pub fn record(&mut self, record: StateChangeRecord) {
        self.records.push(record);
        if let Some(limit) = self.limit {
            if self.records.len() > limit {
                let excess = self.records.len() - limit;
                self.records.drain(..excess);
            }
        }
    }

    /// Names of the states traversed: the first record's origin followed by
    /// each record's destination.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.first() {
            path.push(first.from.as_str());
        }
        path.extend(self.records.iter().map(|record| record.to.as_str()));
        path
    }

    /// Time between the first and last retained record.
    ///
    /// Returns `None` if there are no records.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.first()?, self.records.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn records(&self) -> &[StateChangeRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&StateChangeRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
