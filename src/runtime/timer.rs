//! Named timers that deliver events into the dispatch queue.
//!
//! The table is the only owner of timer entries; everything else refers to a
//! timer by name. Each entry records a generation number so a timer that was
//! replaced or cancelled after its sleep elapsed can never fire.
//!
//! Lock order: the transition lock (if held) is always taken before the
//! table lock, never the other way round.

use super::context::Context;
use super::machine::{lock, Runtime, Shared};
use crate::core::{hierarchy, Callback, Event, StateId, TIMEOUT_EVENT};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::instrument::WithSubscriber;
use tracing::{debug, warn, Instrument};

/// When a timer is cancelled automatically.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TimerScope {
    /// Lives until stopped explicitly or the machine stops.
    Global,
    /// Cancelled when the owning state exits.
    State(StateId),
}

impl TimerScope {
    pub fn owner(&self) -> Option<&StateId> {
        match self {
            Self::Global => None,
            Self::State(owner) => Some(owner),
        }
    }
}

/// Everything needed to (re)start a timer.
pub(crate) struct TimerSpec<D> {
    pub(crate) duration: Duration,
    pub(crate) event: Event,
    pub(crate) scope: TimerScope,
    pub(crate) action: Option<Callback<D>>,
}

impl<D> TimerSpec<D> {
    pub(crate) fn new(duration: Duration, event: Event, scope: TimerScope) -> Self {
        Self {
            duration,
            event,
            scope,
            action: None,
        }
    }

    pub(crate) fn with_action(mut self, action: Option<Callback<D>>) -> Self {
        self.action = action;
        self
    }
}

impl<D> Clone for TimerSpec<D> {
    fn clone(&self) -> Self {
        Self {
            duration: self.duration,
            event: self.event.clone(),
            scope: self.scope.clone(),
            action: self.action.clone(),
        }
    }
}

struct TimerEntry<D> {
    generation: u64,
    spec: TimerSpec<D>,
    handle: AbortHandle,
}

struct TableInner<D> {
    entries: HashMap<String, TimerEntry<D>>,
    next_generation: u64,
    closed: bool,
}

/// Table of active timers.
pub(crate) struct TimerTable<D> {
    inner: Mutex<TableInner<D>>,
}

impl<D> TimerTable<D> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(TableInner {
                entries: HashMap::new(),
                next_generation: 0,
                closed: false,
            }),
        }
    }

    /// Insert `spec` under `name`, cancelling any previous entry of that
    /// name. `spawn` receives the new generation and returns the handle of
    /// the sleeping task, or `None` if it could not be scheduled.
    fn replace<F>(&self, name: String, spec: TimerSpec<D>, spawn: F) -> bool
    where
        F: FnOnce(u64) -> Option<AbortHandle>,
    {
        let mut inner = lock(&self.inner);
        if inner.closed {
            return false;
        }
        if let Some(previous) = inner.entries.remove(&name) {
            previous.handle.abort();
        }
        inner.next_generation += 1;
        let generation = inner.next_generation;
        let Some(handle) = spawn(generation) else {
            return false;
        };
        inner.entries.insert(
            name,
            TimerEntry {
                generation,
                spec,
                handle,
            },
        );
        true
    }

    /// Remove the entry if it is still the one scheduled as `generation`.
    fn take_if_current(&self, name: &str, generation: u64) -> Option<TimerSpec<D>> {
        let mut inner = lock(&self.inner);
        match inner.entries.get(name) {
            Some(entry) if entry.generation == generation => {
                inner.entries.remove(name).map(|entry| entry.spec)
            }
            _ => None,
        }
    }

    fn spec(&self, name: &str) -> Option<TimerSpec<D>> {
        lock(&self.inner).entries.get(name).map(|entry| entry.spec.clone())
    }

    /// Cancel a timer; returns whether one was running.
    pub(crate) fn stop(&self, name: &str) -> bool {
        let removed = lock(&self.inner).entries.remove(name);
        match removed {
            Some(entry) => {
                entry.handle.abort();
                debug!(timer = name, "timer stopped");
                true
            }
            None => false,
        }
    }

    /// Cancel every state-scoped timer owned by `state`.
    pub(crate) fn cancel_owned_by(&self, state: &StateId) -> usize {
        let mut inner = lock(&self.inner);
        let owned: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.spec.scope.owner() == Some(state))
            .map(|(name, _)| name.clone())
            .collect();
        for name in &owned {
            if let Some(entry) = inner.entries.remove(name) {
                entry.handle.abort();
                debug!(timer = %name, state = %state, "timer cancelled on state exit");
            }
        }
        owned.len()
    }

    /// Cancel everything but keep accepting new timers.
    pub(crate) fn cancel_all(&self) {
        let mut inner = lock(&self.inner);
        for (_, entry) in inner.entries.drain() {
            entry.handle.abort();
        }
    }

    /// Cancel everything and refuse new timers from now on.
    pub(crate) fn close(&self) {
        let mut inner = lock(&self.inner);
        inner.closed = true;
        for (name, entry) in inner.entries.drain() {
            entry.handle.abort();
            debug!(timer = %name, "timer stopped (shutdown)");
        }
    }

    pub(crate) fn is_active(&self, name: &str) -> bool {
        lock(&self.inner).entries.contains_key(name)
    }

    pub(crate) fn active_names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.inner).entries.keys().cloned().collect();
        names.sort();
        names
    }
}

impl<D> Shared<D>
where
    D: Send + Sync + 'static,
{
    /// Start (or replace) the timer `name`.
    pub(crate) fn schedule_timer(&self, name: String, spec: TimerSpec<D>) -> bool {
        let Some(executor) = self.executor() else {
            warn!(timer = %name, "no Tokio runtime available, timer not started");
            return false;
        };
        let duration = spec.duration;
        let event_id = spec.event.id().clone();
        let this = self.this.clone();
        let task_name = name.clone();
        let span = self.span.clone();
        let logger = self.logger.clone();

        let started = self.timers.replace(name.clone(), spec, |generation| {
            let task = async move {
                tokio::time::sleep(duration).await;
                if let Some(shared) = this.upgrade() {
                    shared.fire_timer(&task_name, generation);
                }
            };
            let handle = executor.spawn(task.instrument(span).with_subscriber(logger));
            Some(handle.abort_handle())
        });
        if started {
            debug!(timer = %name, ?duration, event = %event_id, "timer started");
        }
        started
    }

    /// Runs on the timer task once the sleep elapsed.
    fn fire_timer(&self, name: &str, generation: u64) {
        // Removed before anything runs, so queries see it as inactive.
        let Some(spec) = self.timers.take_if_current(name, generation) else {
            return;
        };
        debug!(timer = name, event = %spec.event.id(), "timer fired");

        if let Some(action) = &spec.action {
            let current = lock(&self.runtime).current.clone();
            let event = Event::new(TIMEOUT_EVENT);
            let ctx = Context::new(self, current.as_ref(), &event);
            if let Err(error) = action(&ctx) {
                debug!(timer = name, %error, "timer action failed, restarting timer");
                self.retry_timer(name, spec);
                return;
            }
        }

        // Owner check and queueing both happen under the transition lock.
        let runtime = lock(&self.runtime);
        if self.owner_active(&runtime, &spec.scope) {
            self.enqueue_event(spec.event);
        } else {
            debug!(timer = name, "owner state exited, timer event dropped");
        }
    }

    fn owner_active(&self, runtime: &Runtime, scope: &TimerScope) -> bool {
        match scope.owner() {
            None => true,
            Some(owner) => runtime.current.as_ref().is_some_and(|leaf| {
                hierarchy::is_ancestor_or_self(&*self.definition, leaf, owner)
            }),
        }
    }

    /// Restart a timer whose action failed, unless its owner has exited in
    /// the meantime.
    fn retry_timer(&self, name: &str, spec: TimerSpec<D>) {
        let runtime = lock(&self.runtime);
        if self.owner_active(&runtime, &spec.scope) {
            self.schedule_timer(name.to_owned(), spec);
        } else {
            debug!(timer = name, "owner state exited, timer retry dropped");
        }
    }

    /// Restart `name` with a new duration; event, scope and action are kept.
    pub(crate) fn reset_timer(&self, name: &str, duration: Duration) -> bool {
        let Some(mut spec) = self.timers.spec(name) else {
            return false;
        };
        spec.duration = duration;
        self.schedule_timer(name.to_owned(), spec)
    }
}
