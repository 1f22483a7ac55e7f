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

//! Configuration for mining runs
//!
//! Defaults match the thresholds the rule tables have always been produced
//! with: support 0.03, confidence 0.5, lift 1.0, leverage 0.03.

use crate::error::{MiningError, Result};
use crate::rules::Metric;
use serde::{Deserialize, Serialize};

/// Default minimum support for frequent itemsets
pub const DEFAULT_MIN_SUPPORT: f64 = 0.03;

/// Default credit/cancellation marker in invoice identifiers
pub const DEFAULT_CREDIT_MARKER: &str = "C";

/// Per-metric thresholds used to build the three rule tables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricThresholds {
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default = "default_lift")]
    pub lift: f64,
    #[serde(default = "default_leverage")]
    pub leverage: f64,
}

impl MetricThresholds {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Confidence => self.confidence,
            Metric::Lift => self.lift,
            Metric::Leverage => self.leverage,
        }
    }
}

impl Default for MetricThresholds {
    fn default() -> Self {
        Self {
            confidence: default_confidence(),
            lift: default_lift(),
            leverage: default_leverage(),
        }
    }
}

/// Configuration for a single mining run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Minimum support an itemset needs to be kept, in (0, 1]
    #[serde(default = "default_min_support")]
    pub min_support: f64,

    #[serde(default)]
    pub thresholds: MetricThresholds,

    /// Any invoice id containing this substring is a credit note and the
    /// whole invoice is dropped. Matching is case-sensitive.
    #[serde(default = "default_credit_marker")]
    pub credit_marker: String,

    /// Largest itemset size to mine. None = unbounded
    #[serde(default)]
    pub max_len: Option<usize>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: default_min_support(),
            thresholds: MetricThresholds::default(),
            credit_marker: default_credit_marker(),
            max_len: None,
        }
    }
}

impl MiningConfig {
    pub fn with_min_support(mut self, min_support: f64) -> Self {
        self.min_support = min_support;
        self
    }

    pub fn with_threshold(mut self, metric: Metric, value: f64) -> Self {
        match metric {
            Metric::Confidence => self.thresholds.confidence = value,
            Metric::Lift => self.thresholds.lift = value,
            Metric::Leverage => self.thresholds.leverage = value,
        }
        self
    }

    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }

    /// Check that the configuration can drive a mining run
    pub fn validate(&self) -> Result<()> {
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return Err(MiningError::InvalidThreshold {
                name: "min_support".to_string(),
                value: self.min_support,
            });
        }
        for metric in Metric::ALL {
            let value = self.thresholds.get(metric);
            if !value.is_finite() {
                return Err(MiningError::InvalidThreshold {
                    name: metric.as_str().to_string(),
                    value,
                });
            }
        }
        if self.credit_marker.is_empty() {
            return Err(MiningError::InvalidInput(
                "credit_marker must not be empty".to_string(),
            ));
        }
        if self.max_len == Some(0) {
            return Err(MiningError::InvalidInput(
                "max_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_min_support() -> f64 {
    DEFAULT_MIN_SUPPORT
}

fn default_confidence() -> f64 {
    0.5
}

fn default_lift() -> f64 {
    1.0
}

fn default_leverage() -> f64 {
    0.03
}

fn default_credit_marker() -> String {
    DEFAULT_CREDIT_MARKER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MiningConfig::default();
        assert_eq!(config.min_support, 0.03);
        assert_eq!(config.thresholds.confidence, 0.5);
        assert_eq!(config.thresholds.lift, 1.0);
        assert_eq!(config.thresholds.leverage, 0.03);
        assert_eq!(config.credit_marker, "C");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_support() {
        assert!(MiningConfig::default().with_min_support(0.0).validate().is_err());
        assert!(MiningConfig::default().with_min_support(1.5).validate().is_err());
        assert!(MiningConfig::default().with_min_support(f64::NAN).validate().is_err());
        assert!(MiningConfig::default().with_min_support(1.0).validate().is_ok());
    }

    #[test]
    fn test_rejects_non_finite_threshold() {
        let config = MiningConfig::default().with_threshold(Metric::Lift, f64::INFINITY);
        assert!(matches!(
            config.validate(),
            Err(MiningError::InvalidThreshold { ref name, .. }) if name == "lift"
        ));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: MiningConfig =
            serde_json::from_str(r#"{"min_support": 0.1, "thresholds": {"lift": 2.0}}"#).unwrap();
        assert_eq!(config.min_support, 0.1);
        assert_eq!(config.thresholds.lift, 2.0);
        assert_eq!(config.thresholds.confidence, 0.5);
        assert_eq!(config.credit_marker, "C");
    }
}
