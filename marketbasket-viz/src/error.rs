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

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VizError {
    #[error("Layout has {got} positions for {expected} nodes")]
    LayoutMismatch { expected: usize, got: usize },

    #[error("Invalid style {field}: {reason}")]
    InvalidStyle { field: String, reason: String },

    #[error("Rule table has more than one rule for {antecedent} -> {consequent}")]
    DuplicateCell {
        antecedent: String,
        consequent: String,
    },
}

impl VizError {
    pub fn invalid_style(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStyle {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VizError>;
