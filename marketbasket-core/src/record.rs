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

//! Raw transaction tables and typed transaction records
//!
//! A [`RawTable`] is what an upstream data source hands over: named columns
//! and untyped cells. It is parsed from either of the two JSON layouts a
//! serialized table can take:
//!
//! - records: `[{"InvoiceNo": "536365", "Description": "...", "Quantity": 6}, ...]`
//! - columns: `{"InvoiceNo": {"0": "536365", ...}, "Description": {"0": "..."}, ...}`
//!
//! or read from CSV with a header row.

use crate::error::{MiningError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One line of an invoice after preparation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub invoice_id: String,
    pub item_label: String,
    pub quantity: i64,
}

impl TransactionRecord {
    pub fn new(invoice_id: impl Into<String>, item_label: impl Into<String>, quantity: i64) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            item_label: item_label.into(),
            quantity,
        }
    }
}

/// Untyped tabular input with named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from row objects. Columns are collected in first-seen order.
    pub fn from_rows(rows: impl IntoIterator<Item = Map<String, Value>>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, row: Map<String, Value>) {
        for key in row.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell lookup; absent cells read as `Value::Null`
    pub fn cell(&self, row: usize, column: &str) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Value::Null)
    }

    /// Read CSV with a header row. Columns keep header order. Empty cells
    /// read as `Value::Null`; every other cell stays text and is coerced
    /// during preparation.
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Map<String, Value> = headers
                .iter()
                .zip(record.iter())
                .map(|(name, cell)| {
                    let value = if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::String(cell.to_string())
                    };
                    (name.clone(), value)
                })
                .collect();
            rows.push(row);
        }

        Ok(Self {
            columns: headers,
            rows,
        })
    }

    /// Column-layout JSON with one array per column. Declared columns
    /// survive a table with no rows.
    pub fn to_value(&self) -> Value {
        let columns: Map<String, Value> = self
            .columns
            .iter()
            .map(|name| {
                let cells = (0..self.rows.len())
                    .map(|row| self.cell(row, name).clone())
                    .collect();
                (name.clone(), Value::Array(cells))
            })
            .collect();
        Value::Object(columns)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_value())?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => Self::from_records(items),
            Value::Object(columns) => Self::from_columns(columns),
            other => Err(MiningError::InvalidInput(format!(
                "expected a JSON array of records or an object of columns, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_records(items: Vec<Value>) -> Result<Self> {
        let mut table = Self::new();
        for (i, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(row) => table.push_row(row),
                other => {
                    return Err(MiningError::InvalidInput(format!(
                        "record {} is a {}, expected an object",
                        i,
                        json_kind(&other)
                    )))
                }
            }
        }
        Ok(table)
    }

    fn from_columns(columns: Map<String, Value>) -> Result<Self> {
        // Row keys are the column-layout index labels ("0", "1", ...).
        // Numeric labels sort numerically; anything else after them by text.
        let mut rows: BTreeMap<(Option<u64>, String), Map<String, Value>> = BTreeMap::new();
        let mut names = Vec::with_capacity(columns.len());

        for (name, cells) in columns {
            let cells: Vec<(String, Value)> = match cells {
                Value::Object(map) => map.into_iter().collect(),
                Value::Array(list) => list
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
                other => {
                    return Err(MiningError::InvalidInput(format!(
                        "column {} is a {}, expected an object or array",
                        name,
                        json_kind(&other)
                    )))
                }
            };
            for (index, cell) in cells {
                let key = (index.parse::<u64>().ok(), index);
                rows.entry(key).or_default().insert(name.clone(), cell);
            }
            names.push(name);
        }

        Ok(Self {
            columns: names,
            rows: rows.into_values().collect(),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_layout() {
        let table = RawTable::from_value(json!([
            {"InvoiceNo": "1", "Description": "A", "Quantity": 1},
            {"InvoiceNo": "2", "Description": "B", "Quantity": 2, "Country": "UK"}
        ]))
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.columns(),
            &["InvoiceNo", "Description", "Quantity", "Country"]
        );
        assert_eq!(table.cell(0, "Country"), &Value::Null);
        assert_eq!(table.cell(1, "Country"), &json!("UK"));
    }

    #[test]
    fn test_columns_layout_orders_rows_numerically() {
        let table = RawTable::from_json_str(
            r#"{
                "InvoiceNo": {"0": "a", "10": "c", "2": "b"},
                "Quantity": {"0": 1, "10": 3, "2": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.cell(0, "InvoiceNo"), &json!("a"));
        assert_eq!(table.cell(1, "InvoiceNo"), &json!("b"));
        assert_eq!(table.cell(2, "InvoiceNo"), &json!("c"));
        assert_eq!(table.cell(2, "Quantity"), &json!(3));
    }

    #[test]
    fn test_columns_layout_accepts_arrays() {
        let table = RawTable::from_value(json!({
            "InvoiceNo": ["1", "2"],
            "Quantity": [5, 6]
        }))
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, "Quantity"), &json!(6));
    }

    #[test]
    fn test_csv_keeps_header_order_and_nulls_empty_cells() {
        let csv = "InvoiceNo,StockCode,Description,Quantity\n\
                   536365,85123A,WHITE METAL LANTERN,6\n\
                   536366,71053,,2\n";
        let table = RawTable::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.columns(), &["InvoiceNo", "StockCode", "Description", "Quantity"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "Description"), &json!("WHITE METAL LANTERN"));
        assert_eq!(table.cell(0, "Quantity"), &json!("6"));
        assert_eq!(table.cell(1, "Description"), &Value::Null);
    }

    #[test]
    fn test_csv_ragged_row_is_an_error() {
        let err = RawTable::from_csv_reader("a,b\n1,2,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MiningError::Csv(_)));
    }

    #[test]
    fn test_header_only_csv_keeps_columns_through_json() {
        let table = RawTable::from_csv_reader("InvoiceNo,Description,Quantity\n".as_bytes()).unwrap();
        assert!(table.is_empty());

        let reparsed = RawTable::from_json_str(&table.to_json_string().unwrap()).unwrap();
        assert_eq!(reparsed.columns(), table.columns());
        assert!(reparsed.is_empty());
    }

    #[test]
    fn test_to_value_fills_absent_cells() {
        let table = RawTable::from_value(json!([
            {"InvoiceNo": "1", "Quantity": 1},
            {"InvoiceNo": "2", "Country": "UK"}
        ]))
        .unwrap();
        let reparsed = RawTable::from_value(table.to_value()).unwrap();

        assert_eq!(reparsed.columns(), table.columns());
        assert_eq!(reparsed.cell(1, "Quantity"), &Value::Null);
        assert_eq!(reparsed.cell(1, "Country"), &json!("UK"));
    }

    #[test]
    fn test_rejects_scalar_payload() {
        let err = RawTable::from_value(json!(42)).unwrap_err();
        assert!(matches!(err, MiningError::InvalidInput(_)));

        let err = RawTable::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, MiningError::InvalidInput(_)));
    }
}
