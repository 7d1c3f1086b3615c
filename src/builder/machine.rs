//! Builder for machine instances.

use crate::builder::error::BuildError;
use crate::config::MachineConfig;
use crate::core::{Definition, StateId};
use crate::runtime::{Machine, StateChangeObserver};
use std::sync::Arc;
use tracing::Dispatch;

/// Configures one runtime instance of a [`Definition`].
///
/// Obtained from [`Definition::machine`]. Several machines may share one
/// definition; each gets its own data, queue, timers and logger.
pub struct MachineBuilder<D> {
    definition: Arc<Definition<D>>,
    data: D,
    config: MachineConfig,
    observer: Option<StateChangeObserver>,
    logger: Dispatch,
}

impl<D> Definition<D>
where
    D: Send + Sync + 'static,
{
    /// Start configuring a machine that runs this definition over `data`.
    pub fn machine(self: &Arc<Self>, data: D) -> MachineBuilder<D> {
        MachineBuilder {
            definition: Arc::clone(self),
            data,
            config: MachineConfig::default(),
            observer: None,
            logger: Dispatch::none(),
        }
    }
}

impl<D> MachineBuilder<D>
where
    D: Send + Sync + 'static,
{
    /// Replace every runtime option at once.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Maximum number of queued, unprocessed events.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Number of state changes kept in the history; 0 disables it.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Observe every settled change of the current leaf state.
    pub fn on_state_change<F>(mut self, observer: F) -> Self
    where
        F: Fn(&StateId, &StateId) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Route this machine's logs to `logger` instead of discarding them.
    pub fn logger(mut self, logger: impl Into<Dispatch>) -> Self {
        self.logger = logger.into();
        self
    }

    pub fn build(self) -> Result<Machine<D>, BuildError> {
        if self.config.queue_capacity == 0 {
            return Err(BuildError::ZeroQueueCapacity);
        }
        Ok(Machine::from_parts(
            self.definition,
            self.data,
            self.config,
            self.observer,
            self.logger,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{DefinitionBuilder, StateBuilder};
    use crate::runtime::Status;

    fn definition() -> Arc<Definition<()>> {
        DefinitionBuilder::new()
            .state(StateBuilder::normal("idle"))
            .initial("idle")
            .build()
            .unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result = definition().machine(()).queue_capacity(0).build();
        assert!(matches!(result, Err(BuildError::ZeroQueueCapacity)));
    }

    #[test]
    fn machines_share_the_definition() {
        let definition = definition();
        let first = definition.machine(()).build().unwrap();
        let second = definition.machine(()).build().unwrap();

        assert!(Arc::ptr_eq(first.definition(), second.definition()));
        assert_ne!(first.id(), second.id());
        assert_eq!(first.status(), Status::Created);
        assert_eq!(first.current_state(), None);
    }

    #[test]
    fn start_outside_a_runtime_fails() {
        let machine = definition().machine(()).build().unwrap();
        assert!(matches!(
            machine.start(),
            Err(crate::runtime::MachineError::NoRuntime)
        ));
        assert_eq!(machine.status(), Status::Created);
    }
}
