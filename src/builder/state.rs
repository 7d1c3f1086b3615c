//! Builder for state declarations.

use crate::core::{
    timeout_transition_event, Callback, EventId, Resolver, State, StateId, StateKind,
    StateTimeout,
};
use crate::runtime::{CallbackResult, Context};
use std::sync::Arc;
use std::time::Duration;

enum TimeoutTarget {
    Event(EventId),
    State(StateId),
}

/// Fluent declaration of one state.
///
/// # Example
///
/// ```
/// use hfsm::builder::StateBuilder;
/// use std::time::Duration;
///
/// let polling = StateBuilder::<()>::normal("polling")
///     .parent("online")
///     .timeout_transition(Duration::from_millis(50), "ready")
///     .timeout_action(|_ctx| Err("device busy".into()));
/// # let _ = polling;
/// ```
pub struct StateBuilder<D> {
    id: StateId,
    kind: StateKind,
    parent: Option<StateId>,
    default_child: Option<StateId>,
    on_enter: Option<Callback<D>>,
    on_exit: Option<Callback<D>>,
    resolver: Option<Resolver<D>>,
    timeout: Option<(Duration, TimeoutTarget)>,
    timeout_action: Option<Callback<D>>,
    timers: Vec<String>,
}

impl<D> StateBuilder<D> {
    fn with_kind(id: StateId, kind: StateKind, resolver: Option<Resolver<D>>) -> Self {
        Self {
            id,
            kind,
            parent: None,
            default_child: None,
            on_enter: None,
            on_exit: None,
            resolver,
            timeout: None,
            timeout_action: None,
            timers: Vec::new(),
        }
    }

    /// A state that waits for events.
    pub fn normal(id: impl Into<StateId>) -> Self {
        Self::with_kind(id.into(), StateKind::Normal, None)
    }

    /// A terminal state. Only wildcard transitions leave it.
    pub fn final_state(id: impl Into<StateId>) -> Self {
        Self::with_kind(id.into(), StateKind::Final, None)
    }

    /// A pseudo-state that moves on to whatever `resolve` returns right
    /// after entry. Returning `None` leaves the machine resting on it.
    pub fn condition<F>(id: impl Into<StateId>, resolve: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> Option<StateId> + Send + Sync + 'static,
    {
        Self::with_kind(id.into(), StateKind::Condition, Some(Arc::new(resolve)))
    }

    /// Same behaviour as [`condition`](Self::condition), for merge points
    /// of the graph.
    pub fn junction<F>(id: impl Into<StateId>, resolve: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> Option<StateId> + Send + Sync + 'static,
    {
        Self::with_kind(id.into(), StateKind::Junction, Some(Arc::new(resolve)))
    }

    pub fn id(&self) -> &StateId {
        &self.id
    }

    pub fn parent(mut self, parent: impl Into<StateId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Child entered automatically when this state is entered.
    pub fn default_child(mut self, child: impl Into<StateId>) -> Self {
        self.default_child = Some(child.into());
        self
    }

    pub fn on_enter<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> CallbackResult + Send + Sync + 'static,
    {
        self.on_enter = Some(Arc::new(callback));
        self
    }

    pub fn on_exit<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> CallbackResult + Send + Sync + 'static,
    {
        self.on_exit = Some(Arc::new(callback));
        self
    }

    /// Deliver `event` if the state is still active after `duration`.
    pub fn timeout(mut self, duration: Duration, event: impl Into<EventId>) -> Self {
        self.timeout = Some((duration, TimeoutTarget::Event(event.into())));
        self
    }

    /// Move to `target` if the state is still active after `duration`.
    pub fn timeout_transition(mut self, duration: Duration, target: impl Into<StateId>) -> Self {
        self.timeout = Some((duration, TimeoutTarget::State(target.into())));
        self
    }

    /// Run `action` when the timeout elapses, before its event is queued.
    /// If the action fails the timeout restarts instead of firing.
    pub fn timeout_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> CallbackResult + Send + Sync + 'static,
    {
        self.timeout_action = Some(Arc::new(action));
        self
    }

    /// Declare a timer name that is stopped whenever this state exits.
    pub fn timer(mut self, name: impl Into<String>) -> Self {
        self.timers.push(name.into());
        self
    }

    pub(crate) fn has_orphan_timeout_action(&self) -> bool {
        self.timeout_action.is_some() && self.timeout.is_none()
    }

    pub(crate) fn parent_id(&self) -> Option<&StateId> {
        self.parent.as_ref()
    }

    pub(crate) fn default_child_id(&self) -> Option<&StateId> {
        self.default_child.as_ref()
    }

    pub(crate) fn kind(&self) -> StateKind {
        self.kind
    }

    /// Target of a `timeout_transition`, if declared.
    pub(crate) fn timeout_target(&self) -> Option<&StateId> {
        match &self.timeout {
            Some((_, TimeoutTarget::State(target))) => Some(target),
            _ => None,
        }
    }

    pub(crate) fn into_state(self) -> State<D> {
        let id = self.id;
        let action = self.timeout_action;
        let timeout = self.timeout.map(|(duration, target)| match target {
            TimeoutTarget::Event(event) => StateTimeout {
                duration,
                event,
                target: None,
                action,
            },
            TimeoutTarget::State(target) => StateTimeout {
                duration,
                event: timeout_transition_event(&id, &target),
                target: Some(target),
                action,
            },
        });
        State {
            id,
            parent: self.parent,
            kind: self.kind,
            default_child: self.default_child,
            on_enter: self.on_enter,
            on_exit: self.on_exit,
            resolver: self.resolver,
            timeout,
            declared_timers: self.timers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_transition_generates_event_id() {
        let state = StateBuilder::<()>::normal("polling")
            .timeout_transition(Duration::from_millis(10), "ready")
            .into_state();
        let timeout = state.timeout().unwrap();
        assert_eq!(timeout.event(), "__timeout_polling_to_ready");
        assert_eq!(timeout.target().map(StateId::as_str), Some("ready"));
        assert!(!timeout.has_action());
    }

    #[test]
    fn timeout_action_attaches_to_timeout() {
        let state = StateBuilder::<()>::normal("polling")
            .timeout_action(|_| Ok(()))
            .timeout(Duration::from_secs(1), "expired")
            .into_state();
        let timeout = state.timeout().unwrap();
        assert_eq!(timeout.event(), "expired");
        assert!(timeout.has_action());
    }

    #[test]
    fn action_without_timeout_is_flagged() {
        let builder = StateBuilder::<()>::normal("idle").timeout_action(|_| Ok(()));
        assert!(builder.has_orphan_timeout_action());
    }

    #[test]
    fn pseudo_states_carry_their_resolver() {
        let state = StateBuilder::<()>::junction("merge", |_| Some("done".into())).into_state();
        assert_eq!(state.kind(), StateKind::Junction);
        assert!(state.resolver.is_some());
    }

    #[test]
    fn declared_timers_keep_order() {
        let state = StateBuilder::<()>::normal("drive")
            .timer("blink")
            .timer("beep")
            .into_state();
        assert_eq!(state.declared_timers(), ["blink", "beep"]);
    }
}
