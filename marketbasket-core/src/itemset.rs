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

//! Frequent itemset mining (Apriori)
//!
//! ## Algorithm
//!
//! Level-wise search over column indices:
//!
//! 1. Level 1 keeps every item whose column count meets `min_support`.
//! 2. Level k+1 joins pairs of level-k itemsets sharing their first k-1
//!    items, drops any candidate with an infrequent k-subset (support is
//!    anti-monotone, so such a candidate cannot be frequent), and counts the
//!    survivors by intersecting the parents' row bitmaps.
//! 3. Stops when a level comes out empty or `max_len` is reached.
//!
//! Output order is by size, then lexicographically by column, which makes
//! repeated runs over the same matrix produce identical results.

use crate::encode::EncodedMatrix;
use crate::error::{MiningError, Result};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Canonical, ordered set of item labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemSet(BTreeSet<String>);

impl ItemSet {
    pub fn new<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self(items.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0.contains(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_subset(&self, other: &ItemSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn is_disjoint(&self, other: &ItemSet) -> bool {
        self.0.is_disjoint(&other.0)
    }

    pub fn union(&self, other: &ItemSet) -> ItemSet {
        Self(self.0.union(&other.0).cloned().collect())
    }

    /// Items joined with `,` in sorted order, as used for table and heatmap labels
    pub fn label(&self) -> String {
        self.iter().collect::<Vec<_>>().join(",")
    }
}

impl fmt::Display for ItemSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.iter().collect::<Vec<_>>().join(", "))
    }
}

impl<S: Into<String>> FromIterator<S> for ItemSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// A frequent itemset and its support
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itemset {
    pub items: ItemSet,
    pub support: f64,
    /// Number of baskets containing every item
    pub count: u64,
}

/// All itemsets of one mining run, with support lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequentItemsets {
    itemsets: Vec<Itemset>,
    lookup: HashMap<ItemSet, usize>,
    transactions: usize,
    min_support: f64,
}

impl FrequentItemsets {
    fn new(itemsets: Vec<Itemset>, transactions: usize, min_support: f64) -> Self {
        let lookup = itemsets
            .iter()
            .enumerate()
            .map(|(i, s)| (s.items.clone(), i))
            .collect();
        Self {
            itemsets,
            lookup,
            transactions,
            min_support,
        }
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Itemset> {
        self.itemsets.iter()
    }

    pub fn as_slice(&self) -> &[Itemset] {
        &self.itemsets
    }

    pub fn get(&self, items: &ItemSet) -> Option<&Itemset> {
        self.lookup.get(items).map(|&i| &self.itemsets[i])
    }

    pub fn support(&self, items: &ItemSet) -> Option<f64> {
        self.get(items).map(|s| s.support)
    }

    /// Number of baskets the supports are relative to
    pub fn transactions(&self) -> usize {
        self.transactions
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    pub fn max_size(&self) -> usize {
        self.itemsets.iter().map(|s| s.items.len()).max().unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a FrequentItemsets {
    type Item = &'a Itemset;
    type IntoIter = std::slice::Iter<'a, Itemset>;

    fn into_iter(self) -> Self::IntoIter {
        self.itemsets.iter()
    }
}

/// Level-wise frequent itemset miner
#[derive(Debug, Clone)]
pub struct ItemsetMiner {
    min_support: f64,
    max_len: Option<usize>,
}

/// Candidate at the current level: sorted column indices and matching rows
struct LevelEntry {
    columns: Vec<usize>,
    rows: RoaringBitmap,
}

impl ItemsetMiner {
    pub fn new(min_support: f64) -> Self {
        Self {
            min_support,
            max_len: None,
        }
    }

    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn mine(&self, matrix: &EncodedMatrix) -> Result<FrequentItemsets> {
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return Err(MiningError::InvalidThreshold {
                name: "min_support".to_string(),
                value: self.min_support,
            });
        }

        let n_rows = matrix.n_rows();
        if n_rows == 0 {
            tracing::warn!("No baskets to mine");
            return Ok(FrequentItemsets::new(Vec::new(), 0, self.min_support));
        }

        let total = n_rows as f64;
        let support_of = |count: u64| count as f64 / total;
        let max_len = self.max_len.unwrap_or(usize::MAX);

        let mut found = Vec::new();
        let mut level: Vec<LevelEntry> = (0..matrix.n_items())
            .filter_map(|col| {
                let rows = matrix.column(col).clone();
                (support_of(rows.len()) >= self.min_support).then(|| LevelEntry {
                    columns: vec![col],
                    rows,
                })
            })
            .collect();

        let mut size = 1;
        while !level.is_empty() {
            tracing::debug!(size, frequent = level.len(), "Mined itemset level");
            for entry in &level {
                let count = entry.rows.len();
                found.push(Itemset {
                    items: entry
                        .columns
                        .iter()
                        .map(|&c| matrix.items()[c].clone())
                        .collect(),
                    support: support_of(count),
                    count,
                });
            }
            if size >= max_len {
                break;
            }
            level = self.next_level(&level, support_of);
            size += 1;
        }

        tracing::info!(
            itemsets = found.len(),
            min_support = self.min_support,
            "Mined frequent itemsets"
        );

        Ok(FrequentItemsets::new(found, n_rows, self.min_support))
    }

    fn next_level(&self, level: &[LevelEntry], support_of: impl Fn(u64) -> f64) -> Vec<LevelEntry> {
        let known: HashSet<&[usize]> = level.iter().map(|e| e.columns.as_slice()).collect();
        let mut next = Vec::new();

        for (i, a) in level.iter().enumerate() {
            let prefix = &a.columns[..a.columns.len() - 1];
            for b in &level[i + 1..] {
                // Level is sorted, so entries sharing a prefix are contiguous.
                if &b.columns[..b.columns.len() - 1] != prefix {
                    break;
                }

                let mut columns = a.columns.clone();
                columns.push(b.columns[b.columns.len() - 1]);

                let all_subsets_frequent = (0..columns.len() - 2).all(|skip| {
                    let subset: Vec<usize> = columns
                        .iter()
                        .enumerate()
                        .filter(|&(j, _)| j != skip)
                        .map(|(_, &c)| c)
                        .collect();
                    known.contains(subset.as_slice())
                });
                if !all_subsets_frequent {
                    continue;
                }

                let rows = &a.rows & &b.rows;
                if support_of(rows.len()) >= self.min_support {
                    next.push(LevelEntry { columns, rows });
                }
            }
        }

        next
    }
}

/// Mine all itemsets whose support is at least `min_support`
pub fn mine(matrix: &EncodedMatrix, min_support: f64) -> Result<FrequentItemsets> {
    ItemsetMiner::new(min_support).mine(matrix)
}
