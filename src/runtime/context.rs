//! Capability handle passed to every user callback.

use super::machine::Shared;
use super::timer::{TimerScope, TimerSpec};
use crate::core::{hierarchy, Definition, Event, StateId};
use std::time::Duration;
use tracing::Span;
use uuid::Uuid;

/// What a callback may observe and do while it runs.
///
/// A context is scoped to a single callback invocation. Entry, exit, guard,
/// action and resolver callbacks run on the dispatch task while the
/// machine's transition lock is held, so they must reach the machine
/// through this context rather than through a captured
/// [`Machine`](super::Machine) handle: every operation here is safe to call
/// from inside a transition.
pub struct Context<'a, D> {
    pub(crate) shared: &'a Shared<D>,
    pub(crate) current: Option<&'a StateId>,
    pub(crate) from: Option<&'a StateId>,
    pub(crate) to: Option<&'a StateId>,
    pub(crate) event: &'a Event,
}

impl<'a, D> Context<'a, D>
where
    D: Send + Sync + 'static,
{
    pub(crate) fn new(shared: &'a Shared<D>, current: Option<&'a StateId>, event: &'a Event) -> Self {
        Self {
            shared,
            current,
            from: None,
            to: None,
            event,
        }
    }

    pub(crate) fn between(mut self, from: Option<&'a StateId>, to: Option<&'a StateId>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Leaf state at the time the callback was invoked.
    ///
    /// During an entry cascade this is the state being entered, which may
    /// be an intermediate level of the hierarchy.
    pub fn current_state(&self) -> Option<&StateId> {
        self.current
    }

    /// Whether `id` is the current state or one of its ancestors.
    pub fn is_in_state(&self, id: &str) -> bool {
        self.current.is_some_and(|leaf| {
            hierarchy::ancestors(self.definition(), leaf).any(|state| state.as_str() == id)
        })
    }

    /// State the transition started from, if any.
    pub fn from_state(&self) -> Option<&StateId> {
        self.from
    }

    /// State being transitioned to, if any.
    pub fn to_state(&self) -> Option<&StateId> {
        self.to
    }

    /// Event being processed. Entries without a triggering event, exits and
    /// timer actions see the reserved `_entry`, `_exit` and `_timeout` ids.
    pub fn event(&self) -> &Event {
        self.event
    }

    /// Application data supplied when the machine was built.
    pub fn data(&self) -> &D {
        &self.shared.data
    }

    pub fn definition(&self) -> &Definition<D> {
        &self.shared.definition
    }

    pub fn machine_id(&self) -> Uuid {
        self.shared.id
    }

    /// The machine's logging span.
    pub fn span(&self) -> &Span {
        &self.shared.span
    }

    /// Start a timer owned by the current state. It is cancelled when that
    /// state exits. A timer with the same name is replaced.
    pub fn start_timer(&self, name: impl Into<String>, duration: Duration, event: impl Into<Event>) {
        let scope = match self.current {
            Some(owner) => TimerScope::State(owner.clone()),
            None => TimerScope::Global,
        };
        self.shared
            .schedule_timer(name.into(), TimerSpec::new(duration, event.into(), scope));
    }

    /// Start a timer that lives until stopped or until the machine stops.
    pub fn start_global_timer(
        &self,
        name: impl Into<String>,
        duration: Duration,
        event: impl Into<Event>,
    ) {
        self.shared.schedule_timer(
            name.into(),
            TimerSpec::new(duration, event.into(), TimerScope::Global),
        );
    }

    /// Stop a timer by name. No-op if it is not running.
    pub fn stop_timer(&self, name: &str) {
        self.shared.timers.stop(name);
    }

    /// Restart a running timer with a new duration, keeping everything else.
    pub fn reset_timer(&self, name: &str, duration: Duration) -> bool {
        self.shared.reset_timer(name, duration)
    }

    pub fn timer_active(&self, name: &str) -> bool {
        self.shared.timers.is_active(name)
    }

    /// Queue an event for asynchronous processing.
    pub fn send(&self, event: impl Into<Event>) {
        self.shared.enqueue_event(event.into());
    }
}
