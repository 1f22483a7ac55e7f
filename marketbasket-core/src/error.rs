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

//! Error types for the mining pipeline

use thiserror::Error;

/// Errors raised while preparing, encoding, or mining transactions.
///
/// An empty dataset or an empty rule table is not an error: both are
/// reported as empty results.
#[derive(Debug, Error)]
pub enum MiningError {
    /// A required column could not be located in the input table.
    #[error("DataFrame is missing a {field} column")]
    Schema { field: String },

    #[error("Invalid quantity {value} in row {row}")]
    InvalidQuantity { row: usize, value: String },

    #[error("Invalid threshold for {name}: {value}")]
    InvalidThreshold { name: String, value: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An internal invariant was broken (for example a rule whose antecedent
    /// support is zero). Never expected on well-formed input.
    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl MiningError {
    pub fn schema(field: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
        }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}

/// Result type for mining operations.
pub type Result<T> = std::result::Result<T, MiningError>;
