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

use crate::error::{Result, VizError};
use marketbasket_core::{Metric, RuleTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Antecedent x consequent grid of one metric.
///
/// Rows and columns are the comma-joined itemset labels in sorted order.
/// Pairs without a rule are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub metric: Metric,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Heatmap {
    pub fn from_table(table: &RuleTable) -> Result<Self> {
        let mut values: BTreeMap<(String, String), f64> = BTreeMap::new();
        for rule in table.iter() {
            let key = (rule.antecedent.label(), rule.consequent.label());
            if values.contains_key(&key) {
                return Err(VizError::DuplicateCell {
                    antecedent: key.0,
                    consequent: key.1,
                });
            }
            values.insert(key, rule.metric(table.metric));
        }

        let rows: Vec<String> = values
            .keys()
            .map(|(a, _)| a.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns: Vec<String> = values
            .keys()
            .map(|(_, c)| c.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let cells = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| values.get(&(row.clone(), col.clone())).copied())
                    .collect()
            })
            .collect();

        Ok(Self {
            metric: table.metric,
            rows,
            columns,
            cells,
        })
    }

    pub fn get(&self, antecedent: &str, consequent: &str) -> Option<f64> {
        let row = self.rows.iter().position(|r| r == antecedent)?;
        let col = self.columns.iter().position(|c| c == consequent)?;
        self.cells[row][col]
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
