//! The runtime instance driving a [`Definition`].

use super::dispatch::{self, Envelope};
use super::engine::Change;
use super::error::MachineError;
use super::timer::{TimerScope, TimerSpec, TimerTable};
use crate::config::MachineConfig;
use crate::core::{hierarchy, Definition, Event, StateHistory, StateId};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::instrument::WithSubscriber;
use tracing::{debug, info, warn, Dispatch, Instrument, Span};
use uuid::Uuid;

/// Callback notified with `(from, to)` after every settled state change.
pub type StateChangeObserver = Arc<dyn Fn(&StateId, &StateId) + Send + Sync>;

/// Lifecycle of a machine. A stopped machine cannot be restarted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Created,
    Running,
    Stopped,
}

/// Lock a mutex, recovering the data if a panicking callback poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State guarded by the transition lock.
pub(crate) struct Runtime {
    pub(crate) current: Option<StateId>,
    pub(crate) history: StateHistory,
}

/// Everything a machine's handles, its dispatch task and its timer tasks
/// share.
pub(crate) struct Shared<D> {
    pub(crate) id: Uuid,
    pub(crate) definition: Arc<Definition<D>>,
    pub(crate) data: D,
    pub(crate) runtime: Mutex<Runtime>,
    pub(crate) status: Mutex<Status>,
    pub(crate) timers: TimerTable<D>,
    pub(crate) observer: Mutex<Option<StateChangeObserver>>,
    pub(crate) queue: mpsc::Sender<Envelope>,
    pub(crate) pending: Mutex<Option<mpsc::Receiver<Envelope>>>,
    pub(crate) shutdown: watch::Sender<bool>,
    pub(crate) handle: OnceLock<Handle>,
    pub(crate) logger: Dispatch,
    pub(crate) span: Span,
    pub(crate) this: Weak<Shared<D>>,
}

impl<D> Shared<D>
where
    D: Send + Sync + 'static,
{
    /// Run `f` under the machine's logger and span.
    pub(crate) fn in_logger<R>(&self, f: impl FnOnce() -> R) -> R {
        tracing::dispatcher::with_default(&self.logger, || self.span.in_scope(f))
    }

    /// Runtime used to spawn timer tasks: the one the machine was started
    /// on, or the caller's.
    pub(crate) fn executor(&self) -> Option<Handle> {
        self.handle
            .get()
            .cloned()
            .or_else(|| Handle::try_current().ok())
    }

    /// Enqueue without blocking; a full queue drops the event.
    pub(crate) fn enqueue_event(&self, event: Event) {
        match self.queue.try_send(Envelope::new(event)) {
            Ok(()) => {}
            Err(TrySendError::Full(envelope)) => {
                warn!(event = %envelope.event.id(), "event queue full, dropping event");
            }
            Err(TrySendError::Closed(envelope)) => {
                debug!(event = %envelope.event.id(), "machine stopped, dropping event");
            }
        }
    }

    pub(crate) fn notify(&self, change: Option<Change>) {
        let Some((from, to)) = change else {
            return;
        };
        let observer = lock(&self.observer).clone();
        if let Some(observer) = observer {
            observer(&from, &to);
        }
    }
}

/// A live state machine instance.
///
/// `Machine` is a cheap handle: clones drive the same instance. All
/// transition logic runs on a single dispatch task that drains a bounded
/// FIFO queue; timers fire on their own tasks and feed that same queue.
///
/// # Example
///
/// ```rust
/// use hfsm::builder::{DefinitionBuilder, StateBuilder, TransitionBuilder};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let definition = DefinitionBuilder::<()>::new()
///     .state(StateBuilder::normal("off"))
///     .state(StateBuilder::normal("on"))
///     .transition(TransitionBuilder::new("off", "toggle", "on"))
///     .transition(TransitionBuilder::new("on", "toggle", "off"))
///     .initial("off")
///     .build()?;
///
/// let machine = definition.machine(()).build()?;
/// machine.start()?;
/// machine.send_and_wait("toggle").await?;
/// assert!(machine.is_in_state("on"));
/// machine.stop();
/// # Ok(())
/// # }
/// ```
pub struct Machine<D = ()> {
    shared: Arc<Shared<D>>,
}

impl<D> Clone for Machine<D> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<D> fmt::Debug for Machine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.shared.id)
            .finish_non_exhaustive()
    }
}

impl<D> Machine<D>
where
    D: Send + Sync + 'static,
{
    pub(crate) fn from_parts(
        definition: Arc<Definition<D>>,
        data: D,
        config: MachineConfig,
        observer: Option<StateChangeObserver>,
        logger: Dispatch,
    ) -> Self {
        let id = Uuid::new_v4();
        let span = tracing::dispatcher::with_default(&logger, || {
            tracing::info_span!("state_machine", machine_id = %id)
        });
        let (queue, pending) = mpsc::channel(config.queue_capacity);
        let (shutdown, _) = watch::channel(false);

        let shared = Arc::new_cyclic(|this| Shared {
            id,
            definition,
            data,
            runtime: Mutex::new(Runtime {
                current: None,
                history: StateHistory::with_limit(config.history_limit),
            }),
            status: Mutex::new(Status::Created),
            timers: TimerTable::new(),
            observer: Mutex::new(observer),
            queue,
            pending: Mutex::new(Some(pending)),
            shutdown,
            handle: OnceLock::new(),
            logger,
            span,
            this: this.clone(),
        });
        Self { shared }
    }

    /// Enter the initial state and launch the dispatch loop.
    ///
    /// Must be called from within a Tokio runtime; timers and the dispatch
    /// loop are spawned on it. On failure the machine stays unstarted with no
    /// current state, and any timers started by the partial entry are
    /// cancelled. Exit callbacks of the partially entered states do not run,
    /// so a later `start` enters them again from the top.
    pub fn start(&self) -> Result<(), MachineError> {
        let shared = &self.shared;
        shared.in_logger(|| {
            let handle = Handle::try_current().map_err(|_| MachineError::NoRuntime)?;
            let mut status = lock(&shared.status);
            match *status {
                Status::Running => return Err(MachineError::AlreadyStarted),
                Status::Stopped => return Err(MachineError::Stopped),
                Status::Created => {}
            }
            let _ = shared.handle.set(handle.clone());

            info!(initial = %shared.definition.initial(), "starting state machine");
            let mut runtime = lock(&shared.runtime);
            if let Err(error) = shared.enter_initial(&mut runtime) {
                warn!(%error, "failed to enter initial state");
                runtime.current = None;
                shared.timers.cancel_all();
                return Err(error);
            }
            drop(runtime);

            let queue = lock(&shared.pending)
                .take()
                .ok_or(MachineError::AlreadyStarted)?;
            let dispatcher = dispatch::run(Arc::downgrade(shared), queue, shared.shutdown.subscribe());
            handle.spawn(
                dispatcher
                    .instrument(shared.span.clone())
                    .with_subscriber(shared.logger.clone()),
            );
            *status = Status::Running;
            Ok(())
        })
    }

    /// Stop the dispatch loop and cancel every timer. Idempotent.
    ///
    /// Events still queued are discarded; callers waiting on them in
    /// [`send_and_wait`](Self::send_and_wait) receive
    /// [`MachineError::Stopped`].
    pub fn stop(&self) {
        let shared = &self.shared;
        shared.in_logger(|| {
            let mut status = lock(&shared.status);
            if *status == Status::Stopped {
                return;
            }
            *status = Status::Stopped;
            shared.shutdown.send_replace(true);
            shared.timers.close();
            // Never started: drop the queue so pending waiters resolve.
            lock(&shared.pending).take();
            info!("state machine stopped");
        })
    }

    pub fn status(&self) -> Status {
        *lock(&self.shared.status)
    }

    pub fn is_running(&self) -> bool {
        self.status() == Status::Running
    }

    /// Queue an event without waiting. If the queue is full the event is
    /// dropped and a warning is logged.
    pub fn send(&self, event: impl Into<Event>) {
        let event = event.into();
        self.shared.in_logger(|| self.shared.enqueue_event(event));
    }

    /// Queue an event and wait until the dispatcher has processed it.
    ///
    /// Resolves with the first callback failure of the transition the event
    /// triggered, or `Ok(())` if it succeeded or no transition applied.
    /// Fails fast with [`MachineError::QueueFull`] instead of waiting on an
    /// event that was never queued.
    pub async fn send_and_wait(&self, event: impl Into<Event>) -> Result<(), MachineError> {
        let done = self.enqueue_waiting(event.into())?;
        done.await.unwrap_or(Err(MachineError::Stopped))
    }

    /// Blocking flavour of [`send_and_wait`](Self::send_and_wait) for
    /// threads outside the async runtime. Panics if called from within an
    /// async execution context.
    pub fn send_and_wait_blocking(&self, event: impl Into<Event>) -> Result<(), MachineError> {
        let done = self.enqueue_waiting(event.into())?;
        done.blocking_recv().unwrap_or(Err(MachineError::Stopped))
    }

    fn enqueue_waiting(
        &self,
        event: Event,
    ) -> Result<oneshot::Receiver<Result<(), MachineError>>, MachineError> {
        let (envelope, done) = Envelope::waiting(event);
        match self.shared.queue.try_send(envelope) {
            Ok(()) => Ok(done),
            Err(TrySendError::Full(envelope)) => {
                let event = envelope.event.id().clone();
                self.shared
                    .in_logger(|| warn!(event = %event, "event queue full, rejecting synchronous send"));
                Err(MachineError::QueueFull { event })
            }
            Err(TrySendError::Closed(_)) => Err(MachineError::Stopped),
        }
    }

    /// Current leaf state, `None` before the machine was started.
    pub fn current_state(&self) -> Option<StateId> {
        lock(&self.shared.runtime).current.clone()
    }

    /// Whether `id` is the current leaf or one of its ancestors.
    pub fn is_in_state(&self, id: &str) -> bool {
        let runtime = lock(&self.shared.runtime);
        runtime.current.as_ref().is_some_and(|leaf| {
            hierarchy::ancestors(&*self.shared.definition, leaf).any(|state| state.as_str() == id)
        })
    }

    /// Whether the current leaf is a Final state.
    pub fn is_final(&self) -> bool {
        let runtime = lock(&self.shared.runtime);
        runtime
            .current
            .as_ref()
            .and_then(|leaf| self.shared.definition.state(leaf.as_str()))
            .is_some_and(|state| state.is_final())
    }

    /// Force the machine into `target`.
    ///
    /// Only the current leaf is exited (its ancestors stay untouched) and
    /// `target` is entered directly, resolving pseudo-states and default
    /// children as usual. Intended for migrating code that assigns state
    /// imperatively; event-driven transitions should be preferred.
    pub fn set_state(&self, target: impl Into<StateId>) -> Result<(), MachineError> {
        let target = target.into();
        let shared = &self.shared;
        shared.in_logger(|| {
            let change = {
                let mut runtime = lock(&shared.runtime);
                info!(target = %target, "forcing state");
                shared.force_state(&mut runtime, &target)?
            };
            shared.notify(change);
            Ok(())
        })
    }

    /// Start a global timer delivering `event` after `duration`. A timer
    /// with the same name is replaced.
    pub fn start_timer(
        &self,
        name: impl Into<String>,
        duration: Duration,
        event: impl Into<Event>,
    ) -> Result<(), MachineError> {
        self.schedule(name.into(), duration, event.into(), TimerScope::Global)
    }

    /// Start a timer owned by the current leaf; it is cancelled when that
    /// state exits.
    pub fn start_state_timer(
        &self,
        name: impl Into<String>,
        duration: Duration,
        event: impl Into<Event>,
    ) -> Result<(), MachineError> {
        let owner = self.current_state().ok_or(MachineError::Stopped)?;
        self.schedule(name.into(), duration, event.into(), TimerScope::State(owner))
    }

    fn schedule(
        &self,
        name: String,
        duration: Duration,
        event: Event,
        scope: TimerScope,
    ) -> Result<(), MachineError> {
        if self.status() == Status::Stopped {
            return Err(MachineError::Stopped);
        }
        let shared = &self.shared;
        shared.in_logger(|| {
            if shared.executor().is_none() {
                return Err(MachineError::NoRuntime);
            }
            shared.schedule_timer(name, TimerSpec::new(duration, event, scope));
            Ok(())
        })
    }

    /// Stop a timer by name. No-op if it is not running.
    pub fn stop_timer(&self, name: &str) {
        self.shared.in_logger(|| self.shared.timers.stop(name));
    }

    /// Restart a running timer with a new duration. Returns `false` if no
    /// timer of that name is running.
    pub fn reset_timer(&self, name: &str, duration: Duration) -> bool {
        self.shared.in_logger(|| self.shared.reset_timer(name, duration))
    }

    pub fn timer_active(&self, name: &str) -> bool {
        self.shared.timers.is_active(name)
    }

    /// Names of the running timers, sorted.
    pub fn active_timers(&self) -> Vec<String> {
        self.shared.timers.active_names()
    }

    /// Replace the state-change observer. Takes effect from the next
    /// settled transition.
    pub fn on_state_change<F>(&self, observer: F)
    where
        F: Fn(&StateId, &StateId) + Send + Sync + 'static,
    {
        *lock(&self.shared.observer) = Some(Arc::new(observer));
    }

    /// Snapshot of the recorded state changes.
    pub fn state_history(&self) -> StateHistory {
        lock(&self.shared.runtime).history.clone()
    }

    pub fn definition(&self) -> &Arc<Definition<D>> {
        &self.shared.definition
    }

    pub fn data(&self) -> &D {
        &self.shared.data
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }
}
