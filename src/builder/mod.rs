//! Builder API for declaring and validating state graphs.
//!
//! States and transitions are declared with fluent builders, collected by a
//! [`DefinitionBuilder`] and validated in one pass. The resulting
//! [`Definition`](crate::core::Definition) is immutable and shared; each
//! runtime instance is configured through a [`MachineBuilder`].

mod definition;
pub mod error;
mod machine;
pub mod macros;
mod state;
mod transition;

pub use definition::DefinitionBuilder;
pub use error::{BuildError, DefinitionError};
pub use machine::MachineBuilder;
pub use state::StateBuilder;
pub use transition::TransitionBuilder;
