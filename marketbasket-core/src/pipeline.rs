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

//! End-to-end mining runs
//!
//! prepare -> encode -> mine -> derive -> select, as a pure computation over
//! an immutable input. No I/O, no shared state; callers that need to keep a
//! request thread free hand [`mine_serialized`] to a task executor.

use crate::config::MiningConfig;
use crate::encode::EncodedMatrix;
use crate::error::Result;
use crate::itemset::{FrequentItemsets, ItemsetMiner};
use crate::prepare::{DataPreparer, PrepareStats};
use crate::record::RawTable;
use crate::rules::{derive, Metric, Rule, RuleTable, RuleTables};
use serde::{Deserialize, Serialize};

/// Counters for one mining run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub prepare: PrepareStats,
    pub baskets: usize,
    pub items: usize,
    pub itemsets: usize,
    pub candidate_rules: usize,
}

/// Everything a mining run produced
#[derive(Debug, Clone)]
pub struct MiningOutcome {
    pub itemsets: FrequentItemsets,
    /// Full candidate population the tables were selected from
    pub rules: Vec<Rule>,
    pub tables: RuleTables,
    pub stats: RunStats,
}

impl MiningOutcome {
    pub fn table(&self, metric: Metric) -> &RuleTable {
        self.tables.get(metric)
    }
}

/// Runs the mining stages with a validated configuration
#[derive(Debug, Clone)]
pub struct MiningPipeline {
    config: MiningConfig,
}

impl MiningPipeline {
    pub fn new(config: MiningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    pub fn run(&self, table: &RawTable) -> Result<MiningOutcome> {
        let _span = tracing::info_span!("mining_run", rows = table.len()).entered();

        let prepared = DataPreparer::from_config(&self.config).prepare(table)?;
        let matrix = EncodedMatrix::encode(&prepared.records)?;
        self.run_matrix(&matrix, prepared.stats)
    }

    /// Mine an already encoded matrix
    pub fn run_matrix(&self, matrix: &EncodedMatrix, prepare: PrepareStats) -> Result<MiningOutcome> {
        if matrix.is_empty() {
            tracing::warn!("No baskets left after preparation; rule tables will be empty");
        }

        let itemsets = ItemsetMiner::new(self.config.min_support)
            .with_max_len(self.config.max_len)
            .mine(matrix)?;
        let rules = derive(&itemsets)?;
        let tables = RuleTables::build(&rules, &self.config.thresholds);

        let stats = RunStats {
            prepare,
            baskets: matrix.n_rows(),
            items: matrix.n_items(),
            itemsets: itemsets.len(),
            candidate_rules: rules.len(),
        };

        tracing::info!(
            baskets = stats.baskets,
            itemsets = stats.itemsets,
            candidate_rules = stats.candidate_rules,
            confidence_rules = tables.confidence.len(),
            lift_rules = tables.lift.len(),
            leverage_rules = tables.leverage.len(),
            "Mining run complete"
        );

        Ok(MiningOutcome {
            itemsets,
            rules,
            tables,
            stats,
        })
    }
}

/// Mine a serialized transaction table and return the requested rule table
/// as JSON. This is the unit of work submitted to a task executor.
///
/// An empty record list (`[]`) declares no columns and fails with
/// [`crate::MiningError::Schema`] for the invoice column. Declared but empty
/// columns mine to an empty table.
pub fn mine_serialized(transactions: &str, metric: Metric, config: &MiningConfig) -> Result<String> {
    let table = RawTable::from_json_str(transactions)?;
    let outcome = MiningPipeline::new(config.clone())?.run(&table)?;
    let table = outcome.tables.into_table(metric);
    Ok(serde_json::to_string(&table)?)
}

/// Small grocery dataset used for demonstrations
pub fn demo_dataset() -> Vec<Vec<&'static str>> {
    vec![
        vec!["Milk", "Onion", "Nutmeg", "Kidney Beans", "Eggs", "Yogurt"],
        vec!["Dill", "Onion", "Nutmeg", "Kidney Beans", "Eggs", "Yogurt"],
        vec!["Milk", "Apple", "Kidney Beans", "Eggs"],
        vec!["Milk", "Unicorn", "Corn", "Kidney Beans", "Yogurt"],
        vec!["Corn", "Onion", "Onion", "Kidney Beans", "Ice cream", "Eggs"],
    ]
}

/// Configuration the demo dataset is mined with
pub fn demo_config() -> MiningConfig {
    MiningConfig::default()
        .with_min_support(0.6)
        .with_threshold(Metric::Confidence, 0.7)
        .with_threshold(Metric::Lift, 1.2)
}

pub fn run_demo() -> Result<MiningOutcome> {
    let matrix = EncodedMatrix::from_baskets(demo_dataset())?;
    MiningPipeline::new(demo_config())?.run_matrix(&matrix, PrepareStats::default())
}
