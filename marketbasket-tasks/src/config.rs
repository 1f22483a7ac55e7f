// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::error::{Result, TaskError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Executor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Mining runs allowed on the blocking pool at once
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,

    /// Used when a caller waits without its own timeout
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached results
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: default_max_concurrent_runs(),
            default_timeout_secs: default_timeout_secs(),
            cache_enabled: default_cache_enabled(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl TaskConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_runs == 0 {
            return Err(TaskError::InvalidConfig(
                "max_concurrent_runs must be at least 1".to_string(),
            ));
        }
        if self.cache_enabled && self.cache_capacity == 0 {
            return Err(TaskError::InvalidConfig(
                "cache_capacity must be at least 1 when the cache is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_max_concurrent_runs() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_cache_capacity() -> u64 {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TaskConfig::default();
        assert_eq!(config.max_concurrent_runs, 4);
        assert_eq!(config.default_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: TaskConfig = serde_json::from_str(r#"{"cache_enabled": false}"#).unwrap();
        assert!(!config.cache_enabled);
        assert_eq!(config.cache_ttl_secs, 3600);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = TaskConfig {
            max_concurrent_runs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TaskError::InvalidConfig(_))));
    }
}
