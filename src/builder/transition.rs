//! Builder for transition declarations.

use crate::core::{Callback, EventId, Guard, Source, StateId, Transition};
use crate::runtime::{CallbackResult, Context};
use std::sync::Arc;

/// Fluent declaration of one transition.
///
/// Several guards on the same transition combine with AND.
pub struct TransitionBuilder<D> {
    source: Source,
    event: EventId,
    target: StateId,
    guards: Vec<Guard<D>>,
    action: Option<Callback<D>>,
}

impl<D: 'static> TransitionBuilder<D> {
    /// Transition from `from` (or any of its descendants) on `event`.
    pub fn new(from: impl Into<StateId>, event: impl Into<EventId>, to: impl Into<StateId>) -> Self {
        Self::with_source(Source::State(from.into()), event.into(), to.into())
    }

    /// Wildcard transition, taken from any state when nothing more specific
    /// matches.
    pub fn any(event: impl Into<EventId>, to: impl Into<StateId>) -> Self {
        Self::with_source(Source::Any, event.into(), to.into())
    }

    fn with_source(source: Source, event: EventId, target: StateId) -> Self {
        Self {
            source,
            event,
            target,
            guards: Vec::new(),
            action: None,
        }
    }

    pub fn guard(mut self, guard: Guard<D>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn guards(mut self, guards: impl IntoIterator<Item = Guard<D>>) -> Self {
        self.guards.extend(guards);
        self
    }

    /// Add a guard using a closure.
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(predicate))
    }

    /// Run `action` after the exits and before the entries.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> CallbackResult + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    pub(crate) fn source(&self) -> &Source {
        &self.source
    }

    pub(crate) fn event(&self) -> &EventId {
        &self.event
    }

    pub(crate) fn target(&self) -> &StateId {
        &self.target
    }

    pub(crate) fn into_transition(mut self) -> Transition<D> {
        let guard = match self.guards.len() {
            0 => None,
            1 => self.guards.pop(),
            _ => Some(Guard::all(self.guards)),
        };
        Transition {
            source: self.source,
            event: self.event,
            target: self.target,
            guard,
            action: self.action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_source() {
        let transition = TransitionBuilder::<()>::any("emergency", "stopped").into_transition();
        assert!(transition.source().is_wildcard());
        assert_eq!(transition.event(), "emergency");
        assert!(!transition.is_guarded());
    }

    #[test]
    fn guards_collapse_into_one() {
        let transition = TransitionBuilder::<()>::new("parked", "ride", "driving")
            .when(|_| true)
            .guards([Guard::new(|_| true), Guard::new(|_| false)])
            .into_transition();
        assert!(transition.is_guarded());
        assert_eq!(transition.source().state().map(StateId::as_str), Some("parked"));
    }
}
