//! Runtime options for machine instances.

use serde::{Deserialize, Serialize};

/// Options applied by [`MachineBuilder`](crate::builder::MachineBuilder).
///
/// Every field has a default, so a partial document deserialises:
///
/// ```
/// use hfsm::MachineConfig;
///
/// let config: MachineConfig = serde_json::from_str(r#"{ "queue_capacity": 8 }"#).unwrap();
/// assert_eq!(config.queue_capacity, 8);
/// assert_eq!(config.history_limit, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Maximum number of queued, unprocessed events. Must be at least 1.
    pub queue_capacity: usize,
    /// Number of state changes kept by the history; 0 disables recording.
    pub history_limit: usize,
}

impl MachineConfig {
    pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
    pub const DEFAULT_HISTORY_LIMIT: usize = 64;
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            history_limit: Self::DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: MachineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
    }

    #[test]
    fn round_trips_through_json() {
        let config = MachineConfig {
            queue_capacity: 4,
            history_limit: 0,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<MachineConfig>(&json).unwrap(), config);
    }
}
