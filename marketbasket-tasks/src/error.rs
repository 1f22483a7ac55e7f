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

use marketbasket_core::MiningError;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TaskError {
    /// The run did not finish in time. It keeps going in the background but
    /// its result is never delivered to this caller.
    #[error("Task {task_id} timed out after {timeout:?}")]
    Timeout { task_id: Uuid, timeout: Duration },

    #[error("Task {task_id} panicked: {message}")]
    Panicked { task_id: Uuid, message: String },

    #[error("Executor is shut down")]
    Shutdown,

    #[error("Invalid task configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Mining(#[from] MiningError),
}

impl TaskError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
