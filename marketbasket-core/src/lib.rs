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

//! # Marketbasket Core
//!
//! Association rule mining over invoice/item/quantity transactions.
//!
//! ## Stages
//!
//! - **prepare**: locate the invoice/quantity/description columns, drop rows
//!   without an invoice id and credit invoices
//! - **encode**: sum quantities per (invoice, item) into a presence matrix
//! - **itemset**: Apriori search for itemsets meeting `min_support`
//! - **rules**: split itemsets into scored rules, select per metric
//!
//! ## Example
//!
//! ```rust,ignore
//! use marketbasket_core::{MiningConfig, MiningPipeline, RawTable, Metric};
//!
//! let table = RawTable::from_json_str(&std::fs::read_to_string("transactions.json")?)?;
//! let outcome = MiningPipeline::new(MiningConfig::default())?.run(&table)?;
//! for rule in outcome.table(Metric::Lift).iter() {
//!     println!("{} (lift {:.2})", rule, rule.lift);
//! }
//! ```

pub mod config;
pub mod encode;
pub mod error;
pub mod itemset;
pub mod pipeline;
pub mod prepare;
pub mod record;
pub mod rules;

pub use config::{MetricThresholds, MiningConfig, DEFAULT_CREDIT_MARKER, DEFAULT_MIN_SUPPORT};
pub use encode::{encode, Basket, EncodedMatrix};
pub use error::{MiningError, Result};
pub use itemset::{mine, FrequentItemsets, ItemSet, Itemset, ItemsetMiner};
pub use pipeline::{
    demo_config, demo_dataset, mine_serialized, run_demo, MiningOutcome, MiningPipeline, RunStats,
};
pub use prepare::{prepare, ColumnMapping, DataPreparer, PrepareStats, PreparedData};
pub use record::{RawTable, TransactionRecord};
pub use rules::{derive, select, Metric, Rule, RuleTable, RuleTables};
