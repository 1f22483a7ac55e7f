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

//! # Marketbasket Tasks
//!
//! Runs mining off the caller's thread with a bounded wait.
//!
//! ```rust,ignore
//! use marketbasket_tasks::{MiningExecutor, TaskConfig, TaskExecutor};
//!
//! let executor = MiningExecutor::new(MiningConfig::default(), TaskConfig::default())?;
//! let handle = executor.submit(payload, Metric::Lift);
//! let table_json = executor.wait(handle, Duration::from_secs(10)).await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;

pub use cache::{CacheKey, CacheStats, ResultCache};
pub use config::TaskConfig;
pub use error::{Result, TaskError};
pub use executor::{MiningExecutor, TaskExecutor, TaskHandle};
