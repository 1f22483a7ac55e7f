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

//! Association rules: derivation, scoring, and per-metric selection
//!
//! ## Metrics
//!
//! For a rule `X -> Y` with `s(.)` the support of an itemset:
//!
//! - **confidence** = s(X ∪ Y) / s(X)
//! - **lift** = confidence / s(Y)
//! - **leverage** = s(X ∪ Y) - s(X) * s(Y)
//!
//! All three come from the same three support values, so a caller can
//! recompute any one of them from the fields stored on the [`Rule`].

use crate::config::MetricThresholds;
use crate::error::{MiningError, Result};
use crate::itemset::{FrequentItemsets, ItemSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Metric a rule table is filtered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Confidence,
    Lift,
    Leverage,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Confidence, Metric::Lift, Metric::Leverage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Confidence => "confidence",
            Metric::Lift => "lift",
            Metric::Leverage => "leverage",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = MiningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "confidence" => Ok(Metric::Confidence),
            "lift" => Ok(Metric::Lift),
            "leverage" => Ok(Metric::Leverage),
            other => Err(MiningError::InvalidInput(format!("unknown metric: {}", other))),
        }
    }
}

/// An association rule `antecedent -> consequent` with its scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub antecedent: ItemSet,
    pub consequent: ItemSet,
    /// Support of antecedent ∪ consequent
    pub support: f64,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
}

impl Rule {
    /// Score a rule from its three supports. Zero or non-finite supports
    /// cannot come out of a mining run and are rejected rather than turned
    /// into NaN or infinity.
    pub fn score(
        antecedent: ItemSet,
        consequent: ItemSet,
        support: f64,
        antecedent_support: f64,
        consequent_support: f64,
    ) -> Result<Self> {
        if antecedent.is_empty() || consequent.is_empty() {
            return Err(MiningError::invariant("rule sides must be non-empty"));
        }
        if !antecedent.is_disjoint(&consequent) {
            return Err(MiningError::invariant(format!(
                "antecedent {} and consequent {} overlap",
                antecedent, consequent
            )));
        }
        for (side, value) in [
            ("antecedent", antecedent_support),
            ("consequent", consequent_support),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(MiningError::invariant(format!(
                    "{} support of {} -> {} is {}",
                    side, antecedent, consequent, value
                )));
            }
        }

        let confidence = support / antecedent_support;
        let lift = confidence / consequent_support;
        let leverage = support - antecedent_support * consequent_support;

        Ok(Self {
            antecedent,
            consequent,
            support,
            antecedent_support,
            consequent_support,
            confidence,
            lift,
            leverage,
        })
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Confidence => self.confidence,
            Metric::Lift => self.lift,
            Metric::Leverage => self.leverage,
        }
    }

    /// The itemset the rule was split from
    pub fn itemset(&self) -> ItemSet {
        self.antecedent.union(&self.consequent)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.antecedent, self.consequent)
    }
}

/// Expand every frequent itemset of size >= 2 into all of its
/// antecedent/consequent splits.
///
/// Splits are produced per itemset from the largest antecedent down to a
/// single item, each size in lexicographic combination order.
pub fn derive(itemsets: &FrequentItemsets) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();

    for itemset in itemsets.iter().filter(|s| s.items.len() >= 2) {
        let items: Vec<&str> = itemset.items.iter().collect();
        let n = items.len();

        for size in (1..n).rev() {
            for picked in combinations(n, size) {
                let antecedent: ItemSet = picked.iter().map(|&i| items[i]).collect();
                let consequent: ItemSet = (0..n)
                    .filter(|i| !picked.contains(i))
                    .map(|i| items[i])
                    .collect();

                let antecedent_support = lookup(itemsets, &antecedent)?;
                let consequent_support = lookup(itemsets, &consequent)?;
                rules.push(Rule::score(
                    antecedent,
                    consequent,
                    itemset.support,
                    antecedent_support,
                    consequent_support,
                )?);
            }
        }
    }

    tracing::info!(candidates = rules.len(), "Derived candidate rules");
    Ok(rules)
}

fn lookup(itemsets: &FrequentItemsets, items: &ItemSet) -> Result<f64> {
    itemsets.support(items).ok_or_else(|| {
        MiningError::invariant(format!("subset {} of a frequent itemset is missing", items))
    })
}

/// Index combinations of `k` out of `n`, in lexicographic order
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());
        let Some(pos) = (0..k).rev().find(|&i| idx[i] != i + n - k) else {
            return out;
        };
        idx[pos] += 1;
        for j in pos + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

/// Rules kept for one metric at one threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    pub metric: Metric,
    pub threshold: f64,
    pub rules: Vec<Rule>,
}

impl RuleTable {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Value of the table's own metric for each rule, in table order
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rules.iter().map(move |r| r.metric(self.metric))
    }
}

/// Keep the rules whose `metric` is at least `threshold`, in input order
pub fn select(rules: &[Rule], metric: Metric, threshold: f64) -> RuleTable {
    let kept: Vec<Rule> = rules
        .iter()
        .filter(|r| r.metric(metric) >= threshold)
        .cloned()
        .collect();

    if kept.is_empty() && !rules.is_empty() {
        tracing::info!(%metric, threshold, "No rules meet the threshold");
    }

    RuleTable {
        metric,
        threshold,
        rules: kept,
    }
}

/// The three independent per-metric views over one candidate population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTables {
    pub confidence: RuleTable,
    pub lift: RuleTable,
    pub leverage: RuleTable,
}

impl RuleTables {
    pub fn build(rules: &[Rule], thresholds: &MetricThresholds) -> Self {
        Self {
            confidence: select(rules, Metric::Confidence, thresholds.confidence),
            lift: select(rules, Metric::Lift, thresholds.lift),
            leverage: select(rules, Metric::Leverage, thresholds.leverage),
        }
    }

    pub fn get(&self, metric: Metric) -> &RuleTable {
        match metric {
            Metric::Confidence => &self.confidence,
            Metric::Lift => &self.lift,
            Metric::Leverage => &self.leverage,
        }
    }

    pub fn by_name(&self, name: &str) -> Result<&RuleTable> {
        Ok(self.get(name.parse()?))
    }

    pub fn into_table(self, metric: Metric) -> RuleTable {
        match metric {
            Metric::Confidence => self.confidence,
            Metric::Lift => self.lift,
            Metric::Leverage => self.leverage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::EncodedMatrix;
    use crate::itemset::mine;

    fn scenario_rules() -> Vec<Rule> {
        let matrix = EncodedMatrix::from_baskets(vec![
            vec!["A", "B"],
            vec!["A", "B"],
            vec!["A", "C"],
            vec!["A", "B", "C"],
        ])
        .unwrap();
        derive(&mine(&matrix, 0.5).unwrap()).unwrap()
    }

    fn set(items: &[&str]) -> ItemSet {
        ItemSet::new(items.iter().copied())
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("lift".parse::<Metric>().unwrap(), Metric::Lift);
        assert_eq!(" Confidence ".parse::<Metric>().unwrap(), Metric::Confidence);
        assert!("support".parse::<Metric>().is_err());
        assert_eq!(serde_json::to_string(&Metric::Leverage).unwrap(), "\"leverage\"");
    }

    #[test]
    fn test_combinations() {
        assert_eq!(
            combinations(3, 2),
            vec![vec![0, 1], vec![0, 2], vec![1, 2]]
        );
        assert_eq!(combinations(3, 3), vec![vec![0, 1, 2]]);
        assert!(combinations(2, 3).is_empty());
        assert_eq!(combinations(4, 1).len(), 4);
    }

    #[test]
    fn test_derive_scenario_rules() {
        let rules = scenario_rules();
        // {A,B} and {A,C} each split two ways
        assert_eq!(rules.len(), 4);

        let b_to_a = rules
            .iter()
            .find(|r| r.antecedent == set(&["B"]) && r.consequent == set(&["A"]))
            .unwrap();
        assert_eq!(b_to_a.confidence, 1.0);
        assert_eq!(b_to_a.lift, 1.0);
        assert_eq!(b_to_a.leverage, 0.0);

        let a_to_c = rules
            .iter()
            .find(|r| r.antecedent == set(&["A"]) && r.consequent == set(&["C"]))
            .unwrap();
        assert_eq!(a_to_c.confidence, 0.5);
        assert_eq!(a_to_c.lift, 1.0);
    }

    #[test]
    fn test_split_order_within_itemset() {
        let matrix = EncodedMatrix::from_baskets(vec![vec!["A", "B", "C"]]).unwrap();
        let itemsets = mine(&matrix, 1.0).unwrap();
        let rules = derive(&itemsets).unwrap();
        let abc: Vec<String> = rules
            .iter()
            .filter(|r| r.itemset().len() == 3)
            .map(|r| r.to_string())
            .collect();
        assert_eq!(
            abc,
            vec![
                "{A, B} -> {C}",
                "{A, C} -> {B}",
                "{B, C} -> {A}",
                "{A} -> {B, C}",
                "{B} -> {A, C}",
                "{C} -> {A, B}",
            ]
        );
    }

    #[test]
    fn test_score_rejects_zero_support() {
        let err = Rule::score(set(&["A"]), set(&["B"]), 0.1, 0.0, 0.5).unwrap_err();
        assert!(matches!(err, MiningError::Invariant(_)));

        let err = Rule::score(set(&["A"]), set(&["A"]), 0.1, 0.2, 0.5).unwrap_err();
        assert!(matches!(err, MiningError::Invariant(_)));
    }

    #[test]
    fn test_select_keeps_order_and_threshold() {
        let rules = scenario_rules();
        let table = select(&rules, Metric::Confidence, 0.75);
        assert!(table.values().all(|v| v >= 0.75));

        let expected: Vec<&Rule> = rules.iter().filter(|r| r.confidence >= 0.75).collect();
        assert_eq!(table.rules.iter().collect::<Vec<_>>(), expected);

        // Threshold equal to a value keeps the rule
        let exact = select(&rules, Metric::Confidence, 1.0);
        assert!(exact.iter().any(|r| r.confidence == 1.0));
    }

    #[test]
    fn test_strict_threshold_yields_empty_table() {
        let rules = scenario_rules();
        let table = select(&rules, Metric::Lift, 100.0);
        assert!(table.is_empty());
        assert_eq!(table.threshold, 100.0);
    }

    #[test]
    fn test_rule_tables_are_independent() {
        let rules = scenario_rules();
        let tables = RuleTables::build(
            &rules,
            &MetricThresholds {
                confidence: 0.9,
                lift: 1.0,
                leverage: 0.01,
            },
        );
        assert_eq!(tables.lift.len(), 4);
        assert_eq!(tables.confidence.len(), 2);
        assert!(tables.leverage.is_empty());
        assert_eq!(tables.by_name("lift").unwrap().metric, Metric::Lift);
        assert!(tables.by_name("nope").is_err());
    }
}
