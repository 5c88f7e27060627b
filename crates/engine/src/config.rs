// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Engine configuration.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the engine.
///
/// Every field has a default, so a configuration file only needs to name
/// the values it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Upper bound, in milliseconds, on one mutating call including the
    /// audit sink. Exceeding it rolls the call back.
    pub fire_timeout_ms: u64,
    /// How long a writer waits for the database lock.
    pub busy_timeout_ms: u32,
    /// Retry a retryable persistence failure once, from a fresh load.
    pub retry_persistence_once: bool,
    /// How many days ahead of the expected vacate date a unit becomes due
    /// for a reminder.
    pub reminder_window_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fire_timeout_ms: 5000,
            busy_timeout_ms: 5000,
            retry_persistence_once: true,
            reminder_window_days: 90,
        }
    }
}

impl EngineConfig {
    /// Returns the per-call deadline.
    #[must_use]
    pub const fn fire_timeout(&self) -> Duration {
        Duration::from_millis(self.fire_timeout_ms)
    }

    /// Parses a configuration from JSON and validates it.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` for malformed JSON, unknown keys or
    /// a zero timeout.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json).map_err(|e| EngineError::Validation {
            field: String::from("config"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` naming the first unusable field.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.fire_timeout_ms == 0 {
            return Err(EngineError::Validation {
                field: String::from("fire_timeout_ms"),
                message: String::from("must be greater than zero"),
            });
        }
        if self.busy_timeout_ms == 0 {
            return Err(EngineError::Validation {
                field: String::from("busy_timeout_ms"),
                message: String::from("must be greater than zero"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "reminder_window_days": 30 }"#).unwrap();
        assert_eq!(config.reminder_window_days, 30);
        assert_eq!(config.fire_timeout(), Duration::from_secs(5));
        assert!(config.retry_persistence_once);
    }

    #[test]
    fn test_rejects_unknown_keys_and_zero_timeouts() {
        assert!(EngineConfig::from_json(r#"{ "fire_timeout": 5 }"#).is_err());
        assert!(matches!(
            EngineConfig::from_json(r#"{ "fire_timeout_ms": 0 }"#),
            Err(EngineError::Validation { field, .. }) if field == "fire_timeout_ms"
        ));
    }
}
