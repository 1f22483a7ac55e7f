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

//! Data preparation: schema checks and cleaning of raw transaction rows
//!
//! The three required columns are located by case-insensitive substring
//! match, so `InvoiceNo`, `invoice_id` and `INVOICE` all qualify as the
//! invoice column. When several columns match, the first one wins.
//!
//! Credit notes are recognised by a marker substring in the invoice id
//! (`"C"` by default, case-sensitive). The filter runs on rows before any
//! grouping; every line of an invoice carries the same id, so whole invoices
//! are removed. The heuristic also catches ids that happen to contain the
//! marker for unrelated reasons.

use crate::config::MiningConfig;
use crate::error::{MiningError, Result};
use crate::record::{RawTable, TransactionRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const INVOICE_FIELD: &str = "invoice";
pub const QUANTITY_FIELD: &str = "quantity";
pub const DESCRIPTION_FIELD: &str = "description";

/// Names of the columns that carry the three required fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub invoice: String,
    pub quantity: String,
    pub description: String,
}

impl ColumnMapping {
    /// Locate the required columns, failing with a schema error naming the
    /// first field that has no matching column.
    pub fn locate(columns: &[String]) -> Result<Self> {
        let find = |field: &str| -> Result<String> {
            columns
                .iter()
                .find(|c| c.to_lowercase().contains(field))
                .cloned()
                .ok_or_else(|| MiningError::schema(field))
        };

        let invoice = find(INVOICE_FIELD)?;
        let quantity = find(QUANTITY_FIELD)?;
        let description = find(DESCRIPTION_FIELD)?;

        Ok(Self {
            invoice,
            quantity,
            description,
        })
    }
}

/// Counters describing what preparation kept and dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareStats {
    pub rows_read: usize,
    pub dropped_missing_invoice: usize,
    pub dropped_credit: usize,
    pub dropped_missing_description: usize,
}

/// Cleaned records ready for encoding
#[derive(Debug, Clone, Default)]
pub struct PreparedData {
    pub records: Vec<TransactionRecord>,
    pub stats: PrepareStats,
}

/// Validates and cleans raw transaction rows
#[derive(Debug, Clone)]
pub struct DataPreparer {
    credit_marker: String,
}

impl Default for DataPreparer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CREDIT_MARKER)
    }
}

impl DataPreparer {
    pub fn new(credit_marker: impl Into<String>) -> Self {
        Self {
            credit_marker: credit_marker.into(),
        }
    }

    pub fn from_config(config: &MiningConfig) -> Self {
        Self::new(config.credit_marker.clone())
    }

    pub fn credit_marker(&self) -> &str {
        &self.credit_marker
    }

    /// Whether an invoice id marks a credit note
    pub fn is_credit(&self, invoice_id: &str) -> bool {
        invoice_id.contains(self.credit_marker.as_str())
    }

    pub fn prepare(&self, table: &RawTable) -> Result<PreparedData> {
        let mapping = ColumnMapping::locate(table.columns())?;
        let mut stats = PrepareStats {
            rows_read: table.len(),
            ..Default::default()
        };
        let mut records = Vec::with_capacity(table.len());

        for (row, cells) in table.rows().iter().enumerate() {
            let cell = |column: &str| cells.get(column).unwrap_or(&Value::Null);

            let Some(invoice_id) = text_cell(cell(&mapping.invoice), row, &mapping.invoice)? else {
                stats.dropped_missing_invoice += 1;
                continue;
            };
            if self.is_credit(&invoice_id) {
                stats.dropped_credit += 1;
                continue;
            }
            let Some(item_label) =
                text_cell(cell(&mapping.description), row, &mapping.description)?
            else {
                stats.dropped_missing_description += 1;
                continue;
            };
            let quantity = quantity_cell(cell(&mapping.quantity), row)?;

            records.push(TransactionRecord {
                invoice_id,
                item_label,
                quantity,
            });
        }

        tracing::info!(
            rows_read = stats.rows_read,
            kept = records.len(),
            dropped_missing_invoice = stats.dropped_missing_invoice,
            dropped_credit = stats.dropped_credit,
            dropped_missing_description = stats.dropped_missing_description,
            "Prepared transaction rows"
        );

        Ok(PreparedData { records, stats })
    }
}

/// Prepare a table with the given configuration
pub fn prepare(table: &RawTable, config: &MiningConfig) -> Result<PreparedData> {
    DataPreparer::from_config(config).prepare(table)
}

/// Coerce a cell to text. Null reads as missing.
fn text_cell(value: &Value, row: usize, column: &str) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(number_text(n))),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(MiningError::InvalidInput(format!(
            "row {} has a nested value in column {}",
            row, column
        ))),
    }
}

/// Integral floats render without a fractional part, so 536365.0 and
/// 536365 name the same invoice.
fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

fn quantity_cell(value: &Value, row: usize) -> Result<i64> {
    let invalid = || MiningError::InvalidQuantity {
        row,
        value: value.to_string(),
    };
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| integral(n.as_f64()))
            .ok_or_else(invalid),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0);
            }
            s.parse::<i64>()
                .ok()
                .or_else(|| integral(s.parse::<f64>().ok()))
                .ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

fn integral(f: Option<f64>) -> Option<i64> {
    f.filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}
