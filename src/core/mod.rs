//! Core state graph types.
//!
//! This module contains the immutable side of the state machine:
//! - Identifiers and events
//! - State and transition declarations with their guards
//! - The validated [`Definition`] and hierarchy navigation over it
//! - Transition history records
//!
//! Nothing in here locks, spawns or performs I/O; the mutable side lives in
//! [`runtime`](crate::runtime).

mod definition;
mod event;
mod guard;
pub mod hierarchy;
mod history;
mod ids;
mod state;
mod transition;

pub use definition::Definition;
pub use event::{Event, Payload};
pub use guard::Guard;
pub use hierarchy::Hierarchy;
pub use history::{StateHistory, StateTransition};
pub use ids::{EventId, StateId, ENTRY_EVENT, EXIT_EVENT, TIMEOUT_EVENT};
pub use state::{Callback, Resolver, State, StateKind, StateTimeout};
pub use transition::{Source, Transition};

pub(crate) use state::timeout_transition_event;
