//! State declarations.
//!
//! A [`State`] is an immutable record produced by
//! [`StateBuilder`](crate::builder::StateBuilder) and owned by a
//! [`Definition`](crate::core::Definition).

use super::ids::{EventId, StateId};
use crate::runtime::{CallbackResult, Context};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Entry, exit, transition and timer-action callback.
pub type Callback<D> = Arc<dyn Fn(&Context<'_, D>) -> CallbackResult + Send + Sync>;

/// Resolution function of a condition or junction state.
///
/// Returning `None` leaves the machine resting on the pseudo-state.
pub type Resolver<D> = Arc<dyn Fn(&Context<'_, D>) -> Option<StateId> + Send + Sync>;

/// Behavioural classification of a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    /// Waits for events.
    Normal,
    /// Resolves to another state immediately after entry.
    Condition,
    /// Resolves like [`StateKind::Condition`]; kept distinct for readability
    /// of the declared graph.
    Junction,
    /// Terminal state. Only wildcard transitions leave it.
    Final,
}

impl StateKind {
    pub fn is_pseudo(self) -> bool {
        matches!(self, Self::Condition | Self::Junction)
    }
}

/// Declarative timeout started on entry and cancelled on exit.
pub struct StateTimeout<D> {
    pub(crate) duration: Duration,
    pub(crate) event: EventId,
    pub(crate) target: Option<StateId>,
    pub(crate) action: Option<Callback<D>>,
}

impl<D> StateTimeout<D> {
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Event delivered when the timeout fires.
    pub fn event(&self) -> &EventId {
        &self.event
    }

    /// Target state when declared with `timeout_transition`.
    pub fn target(&self) -> Option<&StateId> {
        self.target.as_ref()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }
}

/// A node of the state graph.
pub struct State<D> {
    pub(crate) id: StateId,
    pub(crate) parent: Option<StateId>,
    pub(crate) kind: StateKind,
    pub(crate) default_child: Option<StateId>,
    pub(crate) on_enter: Option<Callback<D>>,
    pub(crate) on_exit: Option<Callback<D>>,
    pub(crate) resolver: Option<Resolver<D>>,
    pub(crate) timeout: Option<StateTimeout<D>>,
    pub(crate) declared_timers: Vec<String>,
}

impl<D> State<D> {
    pub fn id(&self) -> &StateId {
        &self.id
    }

    /// Parent state, `None` for top-level states.
    pub fn parent(&self) -> Option<&StateId> {
        self.parent.as_ref()
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    pub fn default_child(&self) -> Option<&StateId> {
        self.default_child.as_ref()
    }

    pub fn timeout(&self) -> Option<&StateTimeout<D>> {
        self.timeout.as_ref()
    }

    /// Timer names cancelled whenever this state exits.
    pub fn declared_timers(&self) -> &[String] {
        &self.declared_timers
    }

    pub fn is_final(&self) -> bool {
        self.kind == StateKind::Final
    }

    /// Name of the timer backing this state's declarative timeout.
    ///
    /// Derived from the id alone, so re-entering the state replaces any
    /// leftover timer of a previous visit.
    pub fn timeout_timer_name(&self) -> String {
        timeout_timer_name(&self.id)
    }
}

pub(crate) fn timeout_timer_name(id: &StateId) -> String {
    format!("__timeout_{id}")
}

/// Event id generated for `timeout_transition` declarations.
pub(crate) fn timeout_transition_event(state: &StateId, target: &StateId) -> EventId {
    EventId::from(format!("__timeout_{state}_to_{target}"))
}
