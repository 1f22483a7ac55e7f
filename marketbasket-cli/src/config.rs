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

use anyhow::{Context, Result};
use marketbasket_core::{Metric, MiningConfig};
use marketbasket_tasks::TaskConfig;
use marketbasket_viz::{ArrowPosition, EdgeStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Marketbasket configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mining: MiningConfig,

    #[serde(default)]
    pub tasks: TaskConfig,

    #[serde(default)]
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Spring,
    Circular,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphConfig {
    #[serde(default = "default_edge_style")]
    pub edge: EdgeStyle,

    /// Rules drawn from the top of the table
    #[serde(default = "default_rules_to_show")]
    pub rules_to_show: usize,

    #[serde(default = "default_layout")]
    pub layout: LayoutKind,

    /// Spring layout seed
    #[serde(default = "default_layout_seed")]
    pub seed: u64,

    #[serde(default = "default_layout_iterations")]
    pub iterations: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            edge: default_edge_style(),
            rules_to_show: default_rules_to_show(),
            layout: default_layout(),
            seed: default_layout_seed(),
            iterations: default_layout_iterations(),
        }
    }
}

fn default_edge_style() -> EdgeStyle {
    EdgeStyle::default().with_arrow(ArrowPosition::End)
}

fn default_rules_to_show() -> usize {
    10
}

fn default_layout() -> LayoutKind {
    LayoutKind::Spring
}

fn default_layout_seed() -> u64 {
    42
}

fn default_layout_iterations() -> usize {
    50
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }

    /// Load configuration with priority: env > file > defaults
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) if path.exists() => {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(path)?
            }
            Some(path) => {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        config.merge_with_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields whose variable is set. Unparseable values are
    /// logged and ignored.
    ///
    /// Supported environment variables:
    /// - MARKETBASKET_MIN_SUPPORT: Minimum itemset support (default: 0.03)
    /// - MARKETBASKET_MIN_CONFIDENCE / _MIN_LIFT / _MIN_LEVERAGE: Rule thresholds
    /// - MARKETBASKET_CREDIT_MARKER: Substring marking credit invoices (default: C)
    /// - MARKETBASKET_MAX_LEN: Largest itemset size to mine
    /// - MARKETBASKET_MAX_CONCURRENT_RUNS: Parallel mining runs (default: 4)
    /// - MARKETBASKET_TIMEOUT_SECS: Default wait timeout (default: 30)
    /// - MARKETBASKET_CACHE_ENABLED: Cache finished runs (default: true)
    /// - MARKETBASKET_RULES_TO_SHOW: Rules drawn in graphs (default: 10)
    /// - MARKETBASKET_LAYOUT_SEED: Spring layout seed (default: 42)
    pub fn merge_with_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "MARKETBASKET_MIN_SUPPORT") {
            self.mining.min_support = v;
        }
        for (key, metric) in [
            ("MARKETBASKET_MIN_CONFIDENCE", Metric::Confidence),
            ("MARKETBASKET_MIN_LIFT", Metric::Lift),
            ("MARKETBASKET_MIN_LEVERAGE", Metric::Leverage),
        ] {
            if let Some(v) = parse_var(&lookup, key) {
                self.mining = std::mem::take(&mut self.mining).with_threshold(metric, v);
            }
        }
        if let Some(marker) = lookup("MARKETBASKET_CREDIT_MARKER") {
            self.mining.credit_marker = marker;
        }
        if let Some(v) = parse_var(&lookup, "MARKETBASKET_MAX_LEN") {
            self.mining.max_len = Some(v);
        }

        if let Some(v) = parse_var(&lookup, "MARKETBASKET_MAX_CONCURRENT_RUNS") {
            self.tasks.max_concurrent_runs = v;
        }
        if let Some(v) = parse_var(&lookup, "MARKETBASKET_TIMEOUT_SECS") {
            self.tasks.default_timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "MARKETBASKET_CACHE_ENABLED") {
            self.tasks.cache_enabled = v;
        }

        if let Some(v) = parse_var(&lookup, "MARKETBASKET_RULES_TO_SHOW") {
            self.graph.rules_to_show = v;
        }
        if let Some(v) = parse_var(&lookup, "MARKETBASKET_LAYOUT_SEED") {
            self.graph.seed = v;
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}
