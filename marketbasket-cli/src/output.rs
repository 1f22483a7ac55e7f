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

//! Human-readable renderings of command results

use marketbasket_core::{FrequentItemsets, RuleTable};
use marketbasket_viz::Heatmap;
use std::fmt::Write;

pub fn rule_table(table: &RuleTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} rules with {} >= {}",
        table.len(),
        table.metric,
        table.threshold
    );
    for rule in table.iter() {
        let _ = writeln!(
            out,
            "  {}  support={:.4} confidence={:.4} lift={:.4} leverage={:.4}",
            rule, rule.support, rule.confidence, rule.lift, rule.leverage
        );
    }
    out
}

pub fn itemsets(itemsets: &FrequentItemsets) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} frequent itemsets over {} transactions (min_support {})",
        itemsets.len(),
        itemsets.transactions(),
        itemsets.min_support()
    );
    for itemset in itemsets {
        let _ = writeln!(out, "  {:.4}  {}", itemset.support, itemset.items);
    }
    out
}

pub fn heatmap(heatmap: &Heatmap) -> String {
    let mut out = String::new();
    if heatmap.is_empty() {
        let _ = writeln!(out, "No rules to plot");
        return out;
    }

    let row_width = heatmap.rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let col_width = heatmap.columns.iter().map(|c| c.len()).max().unwrap_or(0).max(8);

    let _ = write!(out, "{:row_width$}", "");
    for col in &heatmap.columns {
        let _ = write!(out, "  {:>col_width$}", col);
    }
    let _ = writeln!(out);

    for (row, cells) in heatmap.rows.iter().zip(&heatmap.cells) {
        let _ = write!(out, "{:row_width$}", row);
        for cell in cells {
            match cell {
                Some(v) => {
                    let _ = write!(out, "  {:>col_width$.4}", v);
                }
                None => {
                    let _ = write!(out, "  {:>col_width$}", "-");
                }
            }
        }
        let _ = writeln!(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketbasket_core::{run_demo, Metric};

    #[test]
    fn test_rule_table_lists_every_rule() {
        let outcome = run_demo().unwrap();
        let table = outcome.table(Metric::Lift);
        let text = rule_table(table);
        assert_eq!(text.lines().count(), table.len() + 1);
        assert!(text.contains("lift >= 1.2"));
    }

    #[test]
    fn test_heatmap_grid_shape() {
        let outcome = run_demo().unwrap();
        let map = Heatmap::from_table(outcome.table(Metric::Confidence)).unwrap();
        let text = heatmap(&map);
        assert_eq!(text.lines().count(), map.rows.len() + 1);
    }
}
