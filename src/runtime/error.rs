//! Runtime errors.

use crate::core::{EventId, StateId};
use thiserror::Error;

/// Error type user callbacks fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Return type of entry, exit, transition and timer-action callbacks.
pub type CallbackResult = Result<(), BoxError>;

/// Errors surfaced by a running [`Machine`](crate::runtime::Machine).
///
/// A transition failure (`ExitFailed`, `ActionFailed`, `EntryFailed`,
/// `PseudoStateLoop`, and `UnknownState` from a resolver) aborts only the
/// transition in progress. The machine keeps processing later events, but
/// its leaf stays wherever the cascade stopped.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("Machine has already been started")]
    AlreadyStarted,

    #[error("Machine has been stopped")]
    Stopped,

    #[error("No Tokio runtime available. Start the machine from within a runtime")]
    NoRuntime,

    #[error("Event queue full, event '{event}' was dropped")]
    QueueFull { event: EventId },

    #[error("Unknown state '{0}'")]
    UnknownState(StateId),

    #[error("Exit action failed for state '{state}'")]
    ExitFailed {
        state: StateId,
        #[source]
        source: BoxError,
    },

    #[error("Transition action failed ('{from}' -> '{to}')")]
    ActionFailed {
        from: StateId,
        to: StateId,
        #[source]
        source: BoxError,
    },

    #[error("Entry action failed for state '{state}'")]
    EntryFailed {
        state: StateId,
        #[source]
        source: BoxError,
    },

    #[error("State resolution did not settle after {hops} steps (last state '{state}')")]
    PseudoStateLoop { state: StateId, hops: usize },
}

impl MachineError {
    /// Whether this error aborted a transition (as opposed to a lifecycle
    /// or queueing problem).
    pub fn is_transition_failure(&self) -> bool {
        matches!(
            self,
            Self::UnknownState(_)
                | Self::ExitFailed { .. }
                | Self::ActionFailed { .. }
                | Self::EntryFailed { .. }
                | Self::PseudoStateLoop { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn callback_failure_is_exposed_as_source() {
        let error = MachineError::EntryFailed {
            state: "driving".into(),
            source: "dashboard offline".into(),
        };
        assert_eq!(error.to_string(), "Entry action failed for state 'driving'");
        assert_eq!(
            error.source().map(|s| s.to_string()),
            Some("dashboard offline".to_string())
        );
        assert!(error.is_transition_failure());
    }

    #[test]
    fn lifecycle_errors_are_not_transition_failures() {
        assert!(!MachineError::Stopped.is_transition_failure());
        assert!(!MachineError::QueueFull {
            event: "tick".into()
        }
        .is_transition_failure());
    }
}
