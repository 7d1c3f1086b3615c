//! The mutable side: machine instances, their event loop and timers.
//!
//! A [`Machine`] owns the current leaf state, a bounded FIFO event queue
//! drained by one dispatch task, and a table of named timers. Transitions
//! run one at a time under the machine's transition lock.

mod context;
mod dispatch;
mod engine;
mod error;
mod machine;
mod timer;

pub use context::Context;
pub use error::{BoxError, CallbackResult, MachineError};
pub use machine::{Machine, StateChangeObserver, Status};
pub use timer::TimerScope;
