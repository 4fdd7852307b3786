//! Hub settings, read from `ORDER_HUB_*` environment variables.
//!
//! | Variable                             | Default |
//! |--------------------------------------|---------|
//! | `ORDER_HUB_POLL_INTERVAL_MS`         | 1000    |
//! | `ORDER_HUB_MAX_CONSECUTIVE_FAILURES` | 3       |
//! | `ORDER_HUB_ACTOR_BUFFER_SIZE`        | 32      |
//! | `ORDER_HUB_CONNECTION_BUFFER_SIZE`   | 64      |
//! | `ORDER_HUB_TICKS_PER_STAGE`          | 2       |

use crate::watcher::WatchSettings;
use serde::Deserialize;
use std::time::Duration;

pub const ENV_PREFIX: &str = "ORDER_HUB_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    #[serde(default = "default_actor_buffer_size")]
    pub actor_buffer_size: usize,
    #[serde(default = "default_connection_buffer_size")]
    pub connection_buffer_size: usize,
    #[serde(default = "default_ticks_per_stage")]
    pub ticks_per_stage: u32,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_consecutive_failures() -> u32 {
    3
}

fn default_actor_buffer_size() -> usize {
    32
}

fn default_connection_buffer_size() -> usize {
    64
}

fn default_ticks_per_stage() -> u32 {
    2
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            actor_buffer_size: default_actor_buffer_size(),
            connection_buffer_size: default_connection_buffer_size(),
            ticks_per_stage: default_ticks_per_stage(),
        }
    }
}

impl HubConfig {
    /// Loads and validates the config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: HubConfig = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate()
    }

    /// Same as [`from_env`](Self::from_env) but over explicit `(key, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: HubConfig = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.validate()
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        let zero = |name: &'static str| ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        };
        if self.poll_interval_ms == 0 {
            return Err(zero("poll_interval_ms"));
        }
        if self.max_consecutive_failures == 0 {
            return Err(zero("max_consecutive_failures"));
        }
        if self.actor_buffer_size == 0 {
            return Err(zero("actor_buffer_size"));
        }
        if self.connection_buffer_size == 0 {
            return Err(zero("connection_buffer_size"));
        }
        if self.ticks_per_stage == 0 {
            return Err(zero("ticks_per_stage"));
        }
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Time the simulated order book spends on each preparation stage.
    pub fn stage_duration(&self) -> Duration {
        self.poll_interval() * self.ticks_per_stage
    }

    pub fn watch_settings(&self) -> WatchSettings {
        WatchSettings {
            poll_interval: self.poll_interval(),
            max_consecutive_failures: self.max_consecutive_failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = HubConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config, HubConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.stage_duration(), Duration::from_secs(2));
        assert_eq!(config.watch_settings(), WatchSettings::default());
    }

    #[test]
    fn prefixed_variables_override_defaults() {
        let config = HubConfig::from_vars(vars(&[
            ("ORDER_HUB_POLL_INTERVAL_MS", "250"),
            ("ORDER_HUB_MAX_CONSECUTIVE_FAILURES", "5"),
            ("ORDER_HUB_TICKS_PER_STAGE", "1"),
            ("POLL_INTERVAL_MS", "9999"),
        ]))
        .unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.max_consecutive_failures, 5);
        assert_eq!(config.ticks_per_stage, 1);
        assert_eq!(config.stage_duration(), Duration::from_millis(250));
        assert_eq!(config.actor_buffer_size, 32);
    }

    #[test]
    fn zero_values_are_rejected() {
        let result = HubConfig::from_vars(vars(&[("ORDER_HUB_POLL_INTERVAL_MS", "0")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "poll_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn malformed_values_are_env_errors() {
        let result = HubConfig::from_vars(vars(&[("ORDER_HUB_ACTOR_BUFFER_SIZE", "lots")]));
        assert!(matches!(result, Err(ConfigError::Env(_))));
    }
}
