//! Transition rules.

use super::guard::Guard;
use super::ids::{EventId, StateId};
use super::state::Callback;
use crate::runtime::Context;

/// Where a transition may be taken from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    /// The named state, or any of its descendants.
    State(StateId),
    /// Any state. Wildcard candidates are evaluated after every
    /// hierarchy-specific candidate.
    Any,
}

impl Source {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn state(&self) -> Option<&StateId> {
        match self {
            Self::State(id) => Some(id),
            Self::Any => None,
        }
    }
}

/// A guarded rule moving the machine from `source` to `target` on `event`.
pub struct Transition<D> {
    pub(crate) source: Source,
    pub(crate) event: EventId,
    pub(crate) target: StateId,
    pub(crate) guard: Option<Guard<D>>,
    pub(crate) action: Option<Callback<D>>,
}

impl<D> Transition<D> {
    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn event(&self) -> &EventId {
        &self.event
    }

    pub fn target(&self) -> &StateId {
        &self.target
    }

    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    /// Evaluate the guard; unguarded transitions always pass.
    pub fn allows(&self, ctx: &Context<'_, D>) -> bool {
        self.guard.as_ref().is_none_or(|guard| guard.check(ctx))
    }
}

impl<D> Clone for Transition<D> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            event: self.event.clone(),
            target: self.target.clone(),
            guard: self.guard.clone(),
            action: self.action.clone(),
        }
    }
}
