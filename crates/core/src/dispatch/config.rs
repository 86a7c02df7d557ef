//! Dispatch scheduler configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the dispatch scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Countdown steps shown before the run starts.
    /// Zero starts the run immediately.
    #[serde(default = "default_countdown_steps")]
    pub countdown_steps: u32,

    /// Length of one countdown step (milliseconds).
    #[serde(default = "default_countdown_interval")]
    pub countdown_interval_ms: u64,
}

fn default_countdown_steps() -> u32 {
    3
}

fn default_countdown_interval() -> u64 {
    1000 // 1 second
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            countdown_steps: default_countdown_steps(),
            countdown_interval_ms: default_countdown_interval(),
        }
    }
}

impl DispatchConfig {
    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }

    /// Total time between start and the first running state.
    pub fn countdown_duration(&self) -> Duration {
        self.countdown_interval() * self.countdown_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatchConfig::default();
        assert_eq!(config.countdown_steps, 3);
        assert_eq!(config.countdown_interval_ms, 1000);
        assert_eq!(config.countdown_duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: DispatchConfig = toml::from_str("countdown_steps = 0").unwrap();
        assert_eq!(config.countdown_steps, 0);
        assert_eq!(config.countdown_interval_ms, 1000);
        assert_eq!(config.countdown_duration(), Duration::ZERO);
    }
}
