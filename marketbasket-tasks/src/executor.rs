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

//! Submit/await execution of mining runs
//!
//! A submitted run is a tokio task that takes a concurrency permit and then
//! mines on the blocking pool. Waiting is bounded by a timeout; when it
//! elapses the handle is dropped, which detaches the run. There is no
//! mid-run cancellation point, so a timed-out run is abandoned, not stopped.

use crate::cache::{CacheKey, CacheStats, ResultCache};
use crate::config::TaskConfig;
use crate::error::{Result, TaskError};
use async_trait::async_trait;
use marketbasket_core::{mine_serialized, Metric, MiningConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// A submitted run. Consumed by [`TaskExecutor::wait`].
#[derive(Debug)]
pub struct TaskHandle {
    id: Uuid,
    join: JoinHandle<Result<String>>,
}

impl TaskHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Queue a run over serialized transactions. Must be called from within
    /// a Tokio runtime.
    fn submit(&self, transactions: String, metric: Metric) -> TaskHandle;

    /// Wait for a run's serialized result table
    async fn wait(&self, handle: TaskHandle, timeout: Duration) -> Result<String>;

    async fn run(&self, transactions: String, metric: Metric, timeout: Duration) -> Result<String> {
        let handle = self.submit(transactions, metric);
        self.wait(handle, timeout).await
    }
}

type Runner = Arc<dyn Fn(&str, Metric, &MiningConfig) -> marketbasket_core::Result<String> + Send + Sync>;

/// Runs [`mine_serialized`] on the blocking pool
pub struct MiningExecutor {
    mining: Arc<MiningConfig>,
    config: TaskConfig,
    permits: Arc<Semaphore>,
    cache: Option<ResultCache>,
    runner: Runner,
}

impl MiningExecutor {
    pub fn new(mining: MiningConfig, config: TaskConfig) -> Result<Self> {
        mining.validate()?;
        config.validate()?;

        let cache = config
            .cache_enabled
            .then(|| ResultCache::new(config.cache_capacity, config.cache_ttl_secs));

        tracing::info!(
            max_concurrent_runs = config.max_concurrent_runs,
            cache_enabled = config.cache_enabled,
            "Mining executor ready"
        );

        Ok(Self {
            mining: Arc::new(mining),
            permits: Arc::new(Semaphore::new(config.max_concurrent_runs)),
            config,
            cache,
            runner: Arc::new(mine_serialized),
        })
    }

    #[cfg(test)]
    fn with_runner<F>(mut self, runner: F) -> Self
    where
        F: Fn(&str, Metric, &MiningConfig) -> marketbasket_core::Result<String> + Send + Sync + 'static,
    {
        self.runner = Arc::new(runner);
        self
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn mining_config(&self) -> &MiningConfig {
        &self.mining
    }

    /// Wait using the configured default timeout
    pub async fn wait_default(&self, handle: TaskHandle) -> Result<String> {
        self.wait(handle, self.config.default_timeout()).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.as_ref().map(ResultCache::stats).unwrap_or_default()
    }

    /// Stop accepting work. Runs already holding a permit finish normally;
    /// queued and later submissions fail with [`TaskError::Shutdown`].
    pub fn shutdown(&self) {
        self.permits.close();
        tracing::info!("Mining executor shut down");
    }
}

#[async_trait]
impl TaskExecutor for MiningExecutor {
    fn submit(&self, transactions: String, metric: Metric) -> TaskHandle {
        let id = Uuid::new_v4();
        let mining = Arc::clone(&self.mining);
        let permits = Arc::clone(&self.permits);
        let cache = self.cache.clone();
        let runner = Arc::clone(&self.runner);

        tracing::debug!(task_id = %id, %metric, bytes = transactions.len(), "Submitted mining run");

        let join = tokio::spawn(async move {
            let key = CacheKey::new(&transactions, metric, &mining);
            if let Some(cache) = &cache {
                if let Some(hit) = cache.get(&key).await {
                    tracing::debug!(task_id = %id, key = key.as_str(), "Cache hit");
                    return Ok(hit);
                }
            }

            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| TaskError::Shutdown)?;

            let started = Instant::now();
            let blocking_mining = Arc::clone(&mining);
            let result = tokio::task::spawn_blocking(move || {
                runner(&transactions, metric, &blocking_mining)
            })
            .await
            .map_err(|e| TaskError::Panicked {
                task_id: id,
                message: e.to_string(),
            })??;

            tracing::info!(
                task_id = %id,
                %metric,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Mining run finished"
            );

            if let Some(cache) = &cache {
                cache.insert(key, result.clone()).await;
            }
            Ok(result)
        });

        TaskHandle { id, join }
    }

    async fn wait(&self, handle: TaskHandle, timeout: Duration) -> Result<String> {
        let TaskHandle { id, join } = handle;
        match tokio::time::timeout(timeout, join).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(TaskError::Panicked {
                task_id: id,
                message: e.to_string(),
            }),
            Err(_) => {
                tracing::warn!(task_id = %id, ?timeout, "Mining run timed out, abandoning it");
                Err(TaskError::Timeout {
                    task_id: id,
                    timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn executor(config: TaskConfig) -> MiningExecutor {
        MiningExecutor::new(MiningConfig::default(), config).unwrap()
    }

    #[tokio::test]
    async fn test_slow_run_times_out() {
        let exec = executor(TaskConfig::default()).with_runner(|_, _, _| {
            std::thread::sleep(Duration::from_millis(500));
            Ok("late".to_string())
        });

        let handle = exec.submit("[]".to_string(), Metric::Lift);
        let err = exec.wait(handle, Duration::from_millis(20)).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_runner_panic_is_reported() {
        let exec = executor(TaskConfig::default()).with_runner(|_, _, _| panic!("boom"));

        let handle = exec.submit("[]".to_string(), Metric::Lift);
        let id = handle.id();
        match exec.wait(handle, Duration::from_secs(5)).await {
            Err(TaskError::Panicked { task_id, .. }) => assert_eq!(task_id, id),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));

        let exec = executor(TaskConfig {
            max_concurrent_runs: 1,
            cache_enabled: false,
            ..Default::default()
        })
        .with_runner(move |payload, _, _| {
            let now = a.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            a.fetch_sub(1, Ordering::SeqCst);
            Ok(payload.to_string())
        });

        let handles: Vec<_> = (0..4)
            .map(|i| exec.submit(format!("[{}]", i), Metric::Confidence))
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let out = exec.wait(handle, Duration::from_secs(5)).await.unwrap();
            assert_eq!(out, format!("[{}]", i));
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_skips_second_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let exec = executor(TaskConfig::default()).with_runner(move |_, _, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok("table".to_string())
        });

        for _ in 0..2 {
            let out = exec
                .run("[]".to_string(), Metric::Lift, Duration::from_secs(5))
                .await
                .unwrap();
            assert_eq!(out, "table");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(exec.cache_stats().hits, 1);
    }
}
