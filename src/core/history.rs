//! State change history.
//!
//! Every settled transition (one that leaves the machine on a different
//! leaf) is recorded with the event that drove it. The history is bounded:
//! once `limit` records are held the oldest one is discarded.

use super::ids::{EventId, StateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single settled state change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Leaf before the transition
    pub from: StateId,
    /// Leaf after pseudo-state resolution and default-child descent
    pub to: StateId,
    /// Event that triggered the change (`_entry` for forced assignments)
    pub event: EventId,
    /// When the change settled
    pub timestamp: DateTime<Utc>,
}

/// Bounded, ordered history of state changes.
///
/// # Example
///
/// ```rust
/// use hfsm::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_limit(8);
/// history.record(StateTransition {
///     from: "off".into(),
///     to: "on".into(),
///     event: "toggle".into(),
///     timestamp: Utc::now(),
/// });
/// history.record(StateTransition {
///     from: "on".into(),
///     to: "off".into(),
///     event: "toggle".into(),
///     timestamp: Utc::now(),
/// });
///
/// let path: Vec<&str> = history.path().iter().map(|s| s.as_str()).collect();
/// assert_eq!(path, ["off", "on", "off"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: VecDeque<StateTransition>,
    limit: usize,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::with_limit(64)
    }
}

impl StateHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(limit.min(64)),
            limit,
        }
    }

    /// Append a record, evicting the oldest one when full.
    /// A limit of zero disables recording.
    pub fn record(&mut self, transition: StateTransition) {
        if self.limit == 0 {
            return;
        }
        if self.transitions.len() == self.limit {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Sequence of leaves visited: the first record's origin followed by
    /// every destination.
    pub fn path(&self) -> Vec<&StateId> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        path.extend(self.transitions.iter().map(|t| &t.to));
        path
    }

    /// Time between the oldest and newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.transitions.front()?;
        let last = self.transitions.back()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn transitions(&self) -> impl ExactSizeIterator<Item = &StateTransition> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&StateTransition> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
