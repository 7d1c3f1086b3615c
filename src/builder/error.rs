//! Build errors for definitions and machines.

use crate::core::{EventId, StateId};
use thiserror::Error;

/// A single structural problem found while validating a definition.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Initial state '{0}' is not declared")]
    UndefinedInitialState(StateId),

    #[error("State '{0}' is declared more than once")]
    DuplicateState(StateId),

    #[error("State '{state}' names undeclared parent '{parent}'")]
    UndefinedParent { state: StateId, parent: StateId },

    #[error("State '{state}' names undeclared default child '{child}'")]
    UndefinedDefaultChild { state: StateId, child: StateId },

    #[error("Default child '{child}' of '{state}' is not one of its children")]
    DefaultChildNotChild { state: StateId, child: StateId },

    #[error("Transition on '{event}' starts from undeclared state '{state}'")]
    UndefinedTransitionSource { state: StateId, event: EventId },

    #[error("Transition on '{event}' targets undeclared state '{target}'")]
    UndefinedTransitionTarget { target: StateId, event: EventId },

    #[error("State '{0}' is part of a parent cycle")]
    ParentCycle(StateId),

    #[error("Timeout of state '{state}' targets undeclared state '{target}'")]
    UndefinedTimeoutTarget { state: StateId, target: StateId },

    #[error("State '{0}' has a timeout action but no timeout")]
    TimeoutActionWithoutTimeout(StateId),

    #[error("Transition uses reserved event id '{0}'")]
    ReservedEvent(EventId),

    #[error("Final state '{state}' has an outgoing transition on '{event}'")]
    TransitionFromFinal { state: StateId, event: EventId },
}

/// Errors returned by [`DefinitionBuilder::build`](super::DefinitionBuilder::build)
/// and [`MachineBuilder::build`](super::MachineBuilder::build).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid state machine definition ({} error(s)): {}", errors.len(), summary(errors))]
    Invalid { errors: Vec<DefinitionError> },

    #[error("Event queue capacity must be at least 1")]
    ZeroQueueCapacity,
}

impl BuildError {
    /// Every validation error, empty for non-validation failures.
    pub fn errors(&self) -> &[DefinitionError] {
        match self {
            Self::Invalid { errors } => errors,
            Self::ZeroQueueCapacity => &[],
        }
    }
}

fn summary(errors: &[DefinitionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_lists_every_error() {
        let error = BuildError::Invalid {
            errors: vec![
                DefinitionError::MissingInitialState,
                DefinitionError::DuplicateState("idle".into()),
            ],
        };
        let message = error.to_string();
        assert!(message.contains("2 error(s)"));
        assert!(message.contains("'idle' is declared more than once"));
        assert_eq!(error.errors().len(), 2);
    }

    #[test]
    fn queue_capacity_error_has_no_definition_errors() {
        assert!(BuildError::ZeroQueueCapacity.errors().is_empty());
    }
}
