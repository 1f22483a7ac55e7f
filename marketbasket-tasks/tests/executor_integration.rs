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

//! Submit/await against real mining runs

use marketbasket_core::{demo_config, demo_dataset, Metric, MiningConfig, RuleTable};
use marketbasket_tasks::{MiningExecutor, TaskConfig, TaskError, TaskExecutor};
use serde_json::{json, Value};
use std::time::Duration;

/// The demo baskets as invoice/description/quantity records
fn demo_payload() -> String {
    let rows: Vec<Value> = demo_dataset()
        .into_iter()
        .enumerate()
        .flat_map(|(i, basket)| {
            basket.into_iter().map(move |item| {
                json!({"InvoiceNo": format!("{}", 500 + i), "Description": item, "Quantity": 1})
            })
        })
        .collect();
    Value::Array(rows).to_string()
}

#[tokio::test]
async fn test_submit_and_wait_returns_rule_table() {
    let executor = MiningExecutor::new(demo_config(), TaskConfig::default()).unwrap();
    let handle = executor.submit(demo_payload(), Metric::Lift);
    let out = executor.wait(handle, Duration::from_secs(10)).await.unwrap();

    let table: RuleTable = serde_json::from_str(&out).unwrap();
    assert_eq!(table.metric, Metric::Lift);
    assert!(!table.is_empty());
    assert!(table.values().all(|v| v >= demo_config().thresholds.lift));
}

#[tokio::test]
async fn test_identical_requests_hit_cache() {
    let executor = MiningExecutor::new(demo_config(), TaskConfig::default()).unwrap();
    let timeout = Duration::from_secs(10);

    let first = executor.run(demo_payload(), Metric::Confidence, timeout).await.unwrap();
    let second = executor.run(demo_payload(), Metric::Confidence, timeout).await.unwrap();
    assert_eq!(first, second);

    let third = executor.run(demo_payload(), Metric::Leverage, timeout).await.unwrap();
    assert_ne!(first, third);

    let stats = executor.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
}

#[tokio::test]
async fn test_malformed_payload_is_mining_error() {
    let executor = MiningExecutor::new(MiningConfig::default(), TaskConfig::default()).unwrap();
    let err = executor
        .run("not json".to_string(), Metric::Lift, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Mining(_)));
}

#[tokio::test]
async fn test_shutdown_rejects_new_runs() {
    let executor = MiningExecutor::new(
        MiningConfig::default(),
        TaskConfig {
            cache_enabled: false,
            ..Default::default()
        },
    )
    .unwrap();
    executor.shutdown();

    let err = executor
        .run(demo_payload(), Metric::Lift, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Shutdown));
}

#[test]
fn test_invalid_mining_config_rejected() {
    let err = MiningExecutor::new(
        MiningConfig::default().with_min_support(0.0),
        TaskConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, TaskError::Mining(_)));
}
