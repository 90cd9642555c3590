//! Store configuration.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};

/// How many events the log keeps for replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// Keep every event ever appended.
    #[default]
    Unbounded,
    /// Keep only the newest N events.
    Bounded(usize),
}

/// Store configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Replay retention for the event log.
    pub retention: Retention,

    /// Max buffered events per channel sink before it is dropped.
    /// Default: 1000
    pub sink_buffer_size: usize,

    /// Reconnect delay in seconds applied at startup.
    pub initial_reconnect_delay: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention: Retention::Unbounded,
            sink_buffer_size: 1000,
            initial_reconnect_delay: 0,
        }
    }
}

impl StoreConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make every sink unusable.
    pub fn validate(&self) -> Result<()> {
        if self.sink_buffer_size == 0 {
            return Err(StoreError::InvalidConfig(
                "sink_buffer_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
