//! Timeout validation utilities for browser operations

use std::time::Duration;

use crate::utils::errors::ConfigError;

/// Maximum timeout for browser navigation operations (5 minutes)
/// Covers slow-loading review pages and the reply iframe
pub const MAX_NAVIGATION_TIMEOUT_MS: u64 = 300_000; // 5 minutes

/// Maximum timeout for element interaction operations (30 seconds)
/// Covers dynamic element loading and animations
pub const MAX_INTERACTION_TIMEOUT_MS: u64 = 30_000; // 30 seconds

/// Validate timeout for navigation-class waits (page load, panel render, iframe)
///
/// # Arguments
/// * `name` - Config key reported back on failure
/// * `ms` - Timeout in milliseconds
///
/// # Returns
/// * `Ok(Duration)` - Validated Duration object
/// * `Err(ConfigError)` - If timeout is zero or exceeds MAX_NAVIGATION_TIMEOUT_MS
pub fn validate_navigation_timeout(name: &'static str, ms: u64) -> Result<Duration, ConfigError> {
    validate(name, ms, MAX_NAVIGATION_TIMEOUT_MS)
}

/// Validate timeout for element interaction operations (click, type_text)
pub fn validate_interaction_timeout(name: &'static str, ms: u64) -> Result<Duration, ConfigError> {
    validate(name, ms, MAX_INTERACTION_TIMEOUT_MS)
}

fn validate(name: &'static str, ms: u64, max_ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::InvalidTimeout {
            name,
            reason: "must be greater than 0ms".to_string(),
        });
    }

    if ms > max_ms {
        return Err(ConfigError::InvalidTimeout {
            name,
            reason: format!(
                "cannot exceed {}ms ({:.1} minutes). Received: {}ms ({:.1} minutes)",
                max_ms,
                max_ms as f64 / 60_000.0,
                ms,
                ms as f64 / 60_000.0
            ),
        });
    }

    Ok(Duration::from_millis(ms))
}
