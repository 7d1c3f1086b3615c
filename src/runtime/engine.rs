//! Transition selection and the exit / action / entry cascade.
//!
//! Everything here runs with the transition lock held: the caller passes
//! the locked [`Runtime`] in and every callback sees a [`Context`] built
//! from it.

use super::context::Context;
use super::error::MachineError;
use super::machine::{Runtime, Shared};
use super::timer::{TimerScope, TimerSpec};
use crate::core::{
    hierarchy, Event, State, StateId, StateTransition, Transition, ENTRY_EVENT, EXIT_EVENT,
};
use chrono::Utc;
use tracing::debug;

/// Upper bound on consecutive states entered by one cascade (pseudo-state
/// hops plus default-child descent).
pub(crate) const MAX_RESOLUTION_DEPTH: usize = 64;

/// A settled change of leaf, reported to the state-change observer once
/// the transition lock is released.
pub(crate) type Change = (StateId, StateId);

impl<D> Shared<D>
where
    D: Send + Sync + 'static,
{
    /// Select and execute the transition `event` triggers, if any.
    ///
    /// No matching candidate, or every guard rejecting, is not an error:
    /// the event is discarded.
    pub(crate) fn process_event(
        &self,
        runtime: &mut Runtime,
        event: &Event,
    ) -> Result<Option<Change>, MachineError> {
        let Some(leaf) = runtime.current.clone() else {
            debug!(event = %event.id(), "machine has no active state, event discarded");
            return Ok(None);
        };
        debug!(event = %event.id(), state = %leaf, "processing event");

        let Some(transition) = self.select(&leaf, event) else {
            debug!(event = %event.id(), state = %leaf, "no transition taken");
            return Ok(None);
        };
        self.execute(runtime, &leaf, transition, event)
    }

    /// First candidate whose guard passes, in tier then declaration order.
    fn select<'d>(&'d self, leaf: &'d StateId, event: &'d Event) -> Option<&'d Transition<D>> {
        for transition in self.definition.candidates(leaf, event.id()) {
            let ctx = Context::new(self, Some(leaf), event)
                .between(Some(leaf), Some(transition.target()));
            if transition.allows(&ctx) {
                return Some(transition);
            }
            debug!(
                event = %event.id(),
                from = %leaf,
                to = %transition.target(),
                "guard rejected transition"
            );
        }
        None
    }

    fn execute(
        &self,
        runtime: &mut Runtime,
        from: &StateId,
        transition: &Transition<D>,
        event: &Event,
    ) -> Result<Option<Change>, MachineError> {
        let to = transition.target();
        let definition = &*self.definition;
        let lca = hierarchy::lca(definition, from, to).cloned();
        debug!(
            event = %event.id(),
            from = %from,
            to = %to,
            lca = lca.as_ref().map_or("<root>", StateId::as_str),
            "executing transition"
        );

        for state in hierarchy::exit_path(definition, from, lca.as_ref()) {
            self.exit_state(runtime, &state)?;
        }

        if let Some(action) = &transition.action {
            let ctx = Context::new(self, runtime.current.as_ref(), event).between(Some(from), Some(to));
            action(&ctx).map_err(|source| MachineError::ActionFailed {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
        }

        // Ancestors of the target are entered without descending into their
        // default children; only the target itself cascades.
        let mut path = hierarchy::enter_path(definition, to, lca.as_ref());
        let target = path.pop().unwrap_or_else(|| to.clone());
        let mut previous = from.clone();
        for state in path {
            self.enter_single(runtime, &state, event, Some(&previous))?;
            previous = state;
        }
        self.enter_state(runtime, &target, event, Some(&previous), 0)?;

        Ok(self.settle(runtime, from, event))
    }

    /// Enter `id`, then follow pseudo-state resolution or default-child
    /// descent until a resting state is reached.
    pub(crate) fn enter_state(
        &self,
        runtime: &mut Runtime,
        id: &StateId,
        event: &Event,
        from: Option<&StateId>,
        depth: usize,
    ) -> Result<(), MachineError> {
        if depth >= MAX_RESOLUTION_DEPTH {
            return Err(MachineError::PseudoStateLoop {
                state: id.clone(),
                hops: depth,
            });
        }
        let state = self.enter_single(runtime, id, event, from)?;

        if state.kind().is_pseudo() {
            let ctx = Context::new(self, Some(id), event).between(from, Some(id));
            let next = state
                .resolver
                .as_ref()
                .and_then(|resolve| resolve(&ctx))
                .filter(|next| !next.is_empty());
            if let Some(next) = next {
                debug!(state = %id, next = %next, "pseudo-state resolved");
                self.exit_state(runtime, id)?;
                return self.enter_state(runtime, &next, event, Some(id), depth + 1);
            }
        }

        if let Some(child) = state.default_child() {
            return self.enter_state(runtime, child, event, Some(id), depth + 1);
        }
        Ok(())
    }

    /// Enter `id` alone: make it current, start its declarative timeout and
    /// run its entry callback.
    fn enter_single(
        &self,
        runtime: &mut Runtime,
        id: &StateId,
        event: &Event,
        from: Option<&StateId>,
    ) -> Result<&State<D>, MachineError> {
        let state = self
            .definition
            .state(id.as_str())
            .ok_or_else(|| MachineError::UnknownState(id.clone()))?;

        debug!(state = %id, kind = ?state.kind(), "entering state");
        runtime.current = Some(id.clone());

        if let Some(timeout) = state.timeout() {
            let spec = TimerSpec::new(
                timeout.duration,
                Event::new(timeout.event.clone()),
                TimerScope::State(id.clone()),
            )
            .with_action(timeout.action.clone());
            self.schedule_timer(state.timeout_timer_name(), spec);
        }

        if let Some(on_enter) = &state.on_enter {
            let ctx = Context::new(self, Some(id), event).between(from, Some(id));
            on_enter(&ctx).map_err(|source| MachineError::EntryFailed {
                state: id.clone(),
                source,
            })?;
        }
        Ok(state)
    }

    /// Exit one state: cancel its owned timers, its declared timers and its
    /// declarative timeout, then run its exit callback.
    pub(crate) fn exit_state(&self, runtime: &mut Runtime, id: &StateId) -> Result<(), MachineError> {
        let Some(state) = self.definition.state(id.as_str()) else {
            return Ok(());
        };
        debug!(state = %id, "exiting state");

        self.timers.cancel_owned_by(id);
        for name in state.declared_timers() {
            self.timers.stop(name);
        }
        self.timers.stop(&state.timeout_timer_name());

        if let Some(on_exit) = &state.on_exit {
            let event = Event::new(EXIT_EVENT);
            let ctx = Context::new(self, runtime.current.as_ref(), &event).between(Some(id), None);
            on_exit(&ctx).map_err(|source| MachineError::ExitFailed {
                state: id.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Enter the initial state on start.
    pub(crate) fn enter_initial(&self, runtime: &mut Runtime) -> Result<(), MachineError> {
        let initial = self.definition.initial().clone();
        self.enter_state(runtime, &initial, &Event::new(ENTRY_EVENT), None, 0)
    }

    /// Forced assignment: exit only the current leaf and enter `target`
    /// directly, without computing a common ancestor.
    pub(crate) fn force_state(
        &self,
        runtime: &mut Runtime,
        target: &StateId,
    ) -> Result<Option<Change>, MachineError> {
        if !self.definition.contains(target.as_str()) {
            return Err(MachineError::UnknownState(target.clone()));
        }
        let previous = runtime.current.clone();
        if previous.as_ref() == Some(target) {
            return Ok(None);
        }

        let event = Event::new(ENTRY_EVENT);
        if let Some(leaf) = &previous {
            self.exit_state(runtime, leaf)?;
        }
        self.enter_state(runtime, target, &event, previous.as_ref(), 0)?;

        Ok(match previous {
            Some(from) => self.settle(runtime, &from, &event),
            None => None,
        })
    }

    /// Record the settled leaf if it moved.
    fn settle(&self, runtime: &mut Runtime, from: &StateId, event: &Event) -> Option<Change> {
        let leaf = runtime.current.clone()?;
        if leaf == *from {
            return None;
        }
        debug!(from = %from, to = %leaf, "state changed");
        runtime.history.record(StateTransition {
            from: from.clone(),
            to: leaf.clone(),
            event: event.id().clone(),
            timestamp: Utc::now(),
        });
        Some((from.clone(), leaf))
    }
}
