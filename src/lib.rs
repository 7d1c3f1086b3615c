//! hfsm: hierarchical state machines with scoped timers.
//!
//! The crate follows a "pure core, imperative shell" split. The core is an
//! immutable, validated state graph: states nested under parents,
//! condition and junction pseudo-states, final states, guarded transitions
//! and declarative timeouts. The shell is a [`Machine`] that executes one
//! graph over user data, one event at a time, from a bounded FIFO queue.
//!
//! # Core Concepts
//!
//! - **Definition**: immutable graph built and validated by
//!   [`DefinitionBuilder`](builder::DefinitionBuilder), shared by any
//!   number of machines
//! - **Transitions**: an event moves the machine from the current leaf to a
//!   target; the states below their lowest common ancestor are exited
//!   innermost first and the target branch is entered outermost first
//! - **Guards**: predicates over the callback [`Context`]
//! - **Timers**: named, optionally scoped to a state, delivering events
//!   into the same queue as [`Machine::send`]
//! - **History**: bounded record of settled state changes
//!
//! # Example
//!
//! ```rust
//! use hfsm::builder::{DefinitionBuilder, StateBuilder, TransitionBuilder};
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! #[derive(Default)]
//! struct Bike {
//!     kickstand_up: AtomicBool,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let definition = DefinitionBuilder::<Bike>::new()
//!     .state(StateBuilder::normal("vehicle").default_child("parked"))
//!     .state(StateBuilder::normal("parked").parent("vehicle"))
//!     .state(StateBuilder::normal("driving").parent("vehicle"))
//!     .transition(
//!         TransitionBuilder::<Bike>::new("parked", "ride", "driving")
//!             .when(|ctx| ctx.data().kickstand_up.load(Ordering::SeqCst)),
//!     )
//!     .transition(TransitionBuilder::new("vehicle", "park", "parked"))
//!     .initial("vehicle")
//!     .build()?;
//!
//! let machine = definition.machine(Bike::default()).build()?;
//! machine.start()?;
//! assert!(machine.is_in_state("parked"));
//!
//! machine.send_and_wait("ride").await?;
//! assert!(machine.is_in_state("parked"));
//!
//! machine.data().kickstand_up.store(true, Ordering::SeqCst);
//! machine.send_and_wait("ride").await?;
//! assert!(machine.is_in_state("driving"));
//! assert!(machine.is_in_state("vehicle"));
//! machine.stop();
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod runtime;

// Re-export commonly used types
pub use builder::{BuildError, DefinitionBuilder, StateBuilder, TransitionBuilder};
pub use config::MachineConfig;
pub use core::{Definition, Event, EventId, Guard, StateHistory, StateId, StateKind};
pub use runtime::{Context, Machine, MachineError, Status};
