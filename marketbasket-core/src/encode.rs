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

//! One-hot encoding of baskets
//!
//! The matrix is stored column-wise: each item keeps a bitmap of the rows
//! (invoices) it is present in. Joint presence of an itemset is then the
//! intersection of its column bitmaps, which is what the miner counts.

use crate::error::{MiningError, Result};
use crate::record::TransactionRecord;
use roaring::RoaringBitmap;
use std::collections::{BTreeMap, HashMap};

/// Presence mapping for a summed quantity
pub fn is_present(quantity: i64) -> bool {
    quantity > 0
}

/// Items present in one invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basket<'a> {
    pub invoice_id: &'a str,
    pub items: Vec<&'a str>,
}

/// Binary item-presence matrix: one row per invoice, one column per item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedMatrix {
    invoices: Vec<String>,
    items: Vec<String>,
    item_index: HashMap<String, usize>,
    columns: Vec<RoaringBitmap>,
}

impl EncodedMatrix {
    /// Group quantities by (invoice, item), sum them, and map the sums to
    /// presence. Rows and columns come out in sorted order.
    pub fn encode(records: &[TransactionRecord]) -> Result<Self> {
        let mut sums: BTreeMap<&str, BTreeMap<&str, i64>> = BTreeMap::new();
        let mut vocabulary: BTreeMap<&str, usize> = BTreeMap::new();

        for record in records {
            let qty = sums
                .entry(record.invoice_id.as_str())
                .or_default()
                .entry(record.item_label.as_str())
                .or_insert(0);
            *qty = qty.saturating_add(record.quantity);
            vocabulary.insert(record.item_label.as_str(), 0);
        }

        if sums.len() > u32::MAX as usize {
            return Err(MiningError::InvalidInput(format!(
                "{} invoices exceed the supported row count",
                sums.len()
            )));
        }

        let items: Vec<String> = vocabulary.keys().map(|s| s.to_string()).collect();
        for (i, slot) in vocabulary.values_mut().enumerate() {
            *slot = i;
        }

        let mut columns = vec![RoaringBitmap::new(); items.len()];
        let mut invoices = Vec::with_capacity(sums.len());
        for (row, (invoice, item_sums)) in sums.into_iter().enumerate() {
            for (item, qty) in item_sums {
                if is_present(qty) {
                    columns[vocabulary[item]].insert(row as u32);
                }
            }
            invoices.push(invoice.to_string());
        }

        let item_index = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.clone(), i))
            .collect();

        tracing::info!(
            rows = invoices.len(),
            items = items.len(),
            "Encoded transactions"
        );

        Ok(Self {
            invoices,
            items,
            item_index,
            columns,
        })
    }

    /// Build a matrix directly from item lists, one list per transaction.
    /// Transactions are identified by their position.
    pub fn from_baskets<B, S>(baskets: impl IntoIterator<Item = B>) -> Result<Self>
    where
        B: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records: Vec<TransactionRecord> = baskets
            .into_iter()
            .enumerate()
            .flat_map(|(i, basket)| {
                let id = format!("{:06}", i);
                basket
                    .into_iter()
                    .map(move |item| TransactionRecord::new(id.clone(), item, 1))
            })
            .collect();
        Self::encode(&records)
    }

    pub fn n_rows(&self) -> usize {
        self.invoices.len()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    pub fn invoices(&self) -> &[String] {
        &self.invoices
    }

    /// Column vocabulary
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn item_index(&self, item: &str) -> Option<usize> {
        self.item_index.get(item).copied()
    }

    pub fn row_index(&self, invoice_id: &str) -> Option<usize> {
        self.invoices.iter().position(|i| i == invoice_id)
    }

    /// Rows in which the item at `column` is present
    pub fn column(&self, column: usize) -> &RoaringBitmap {
        &self.columns[column]
    }

    pub fn get(&self, row: usize, column: usize) -> bool {
        u32::try_from(row)
            .map(|r| self.columns.get(column).is_some_and(|c| c.contains(r)))
            .unwrap_or(false)
    }

    /// Presence lookup by labels; unseen invoices or items read as absent
    pub fn contains(&self, invoice_id: &str, item: &str) -> bool {
        match (self.row_index(invoice_id), self.item_index(item)) {
            (Some(row), Some(column)) => self.get(row, column),
            _ => false,
        }
    }

    /// Re-derive the baskets represented by the matrix
    pub fn baskets(&self) -> Vec<Basket<'_>> {
        self.invoices
            .iter()
            .enumerate()
            .map(|(row, invoice_id)| Basket {
                invoice_id,
                items: (0..self.items.len())
                    .filter(|&col| self.get(row, col))
                    .map(|col| self.items[col].as_str())
                    .collect(),
            })
            .collect()
    }
}

/// Encode prepared records into a presence matrix
pub fn encode(records: &[TransactionRecord]) -> Result<EncodedMatrix> {
    EncodedMatrix::encode(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(invoice: &str, item: &str, qty: i64) -> TransactionRecord {
        TransactionRecord::new(invoice, item, qty)
    }

    #[test]
    fn test_sums_quantities_before_presence() {
        let matrix = encode(&[
            rec("1", "A", 2),
            rec("1", "A", -2),
            rec("1", "B", 1),
            rec("2", "A", -1),
            rec("2", "A", 3),
        ])
        .unwrap();

        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.items(), &["A", "B"]);
        assert!(!matrix.contains("1", "A"));
        assert!(matrix.contains("1", "B"));
        assert!(matrix.contains("2", "A"));
        assert!(!matrix.contains("2", "B"));
    }

    #[test]
    fn test_non_positive_invoice_keeps_its_row() {
        let matrix = encode(&[rec("1", "A", 0), rec("2", "B", 5)]).unwrap();
        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.n_items(), 2);
        assert!(matrix.column(0).is_empty());
    }

    #[test]
    fn test_unseen_cells_are_absent() {
        let matrix = encode(&[rec("1", "A", 1)]).unwrap();
        assert!(!matrix.contains("1", "Z"));
        assert!(!matrix.contains("9", "A"));
        assert!(!matrix.get(5, 0));
    }

    #[test]
    fn test_from_baskets_and_back() {
        let matrix = EncodedMatrix::from_baskets(vec![
            vec!["Milk", "Eggs", "Eggs"],
            vec!["Bread"],
        ])
        .unwrap();

        let baskets = matrix.baskets();
        assert_eq!(baskets.len(), 2);
        assert_eq!(baskets[0].items, vec!["Eggs", "Milk"]);
        assert_eq!(baskets[1].items, vec!["Bread"]);
    }

    #[test]
    fn test_empty_input() {
        let matrix = encode(&[]).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.n_items(), 0);
    }
}
