use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::ConfigError;

/// Drafting behaviour: sampling, retry policy, prompt limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrafterConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay; doubles after every failed attempt
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Review text is cut to this many characters before prompting
    #[serde(default = "default_truncate_chars")]
    pub truncate_chars: usize,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion requests in flight during the startup batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Keep only the last N answered reviews as style examples
    #[serde(default)]
    pub max_examples: Option<usize>,
}

fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    1_000
}
fn default_truncate_chars() -> usize {
    700
}
fn default_max_tokens() -> u32 {
    200
}
fn default_temperature() -> f32 {
    0.4
}
fn default_concurrency() -> usize {
    1
}

impl Default for DrafterConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            truncate_chars: default_truncate_chars(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            concurrency: default_concurrency(),
            max_examples: None,
        }
    }
}

impl DrafterConfig {
    /// Delay after failed attempt `attempt` (0-based): base * 2^attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                name: "drafter.max_retries",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.truncate_chars == 0 {
            return Err(ConfigError::InvalidValue {
                name: "drafter.truncate_chars",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                name: "drafter.concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                name: "drafter.temperature",
                reason: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_base() {
        let config = DrafterConfig::default();
        assert_eq!(config.backoff(0), Duration::from_secs(1));
        assert_eq!(config.backoff(1), Duration::from_secs(2));
        assert_eq!(config.backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn zero_retries_is_invalid() {
        let config = DrafterConfig {
            max_retries: 0,
            ..DrafterConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(DrafterConfig::default().validate().is_ok());
    }
}
