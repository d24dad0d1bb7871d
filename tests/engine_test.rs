//! Engine assembly tests: configuration-driven wiring, the freeze gate,
//! and the dispatch → worker → correlator round trip.

mod common;

use common::{manual_freeze, setup_step, ContextBuilder};
use rollout_core::config::RolloutConfig;
use rollout_core::engine::RolloutEngine;
use rollout_core::execution::{ExecutionStatus, WorkerResult};
use rollout_core::freeze::InMemoryFreezeRegistry;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn engine_round_trips_a_step_through_the_correlator() {
    let (engine, mut work_units) = RolloutEngine::from_config(RolloutConfig::default());
    let results = engine.spawn_correlator();
    let context = ContextBuilder::new().build();

    let response = engine
        .execute_step(&setup_step(4), &context)
        .await
        .unwrap();
    assert!(response.is_async);
    assert_eq!(engine.correlator().pending_count(), 1);

    // play the worker: consume the unit, report success
    let unit = work_units.recv().await.unwrap();
    results
        .send(WorkerResult::success(unit.correlation_id, json!({})))
        .await
        .unwrap();

    // the correlator task resumes the step and consumes the pending entry
    tokio::time::timeout(Duration::from_secs(2), async {
        while engine.correlator().pending_count() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("pending execution should drain");

    let activities = engine.executor().activities();
    assert_eq!(activities.len(), 1);
}

#[tokio::test]
async fn freeze_gate_blocks_and_records() {
    let registry = Arc::new(InMemoryFreezeRegistry::new());
    registry.create(manual_freeze("fr1", None, None)).unwrap();

    let (engine, _work_units) = RolloutEngine::from_config(RolloutConfig::default());
    let engine = engine.with_freeze_registry(registry);
    let context = ContextBuilder::new().build();

    // the daily fixture window may or may not cover "now"; the gate call
    // itself must succeed either way and never error
    let blocking = engine
        .check_freeze_gate(&context, &HashMap::new())
        .await
        .unwrap();
    for summary in &blocking {
        assert_eq!(summary.identifier, "fr1");
    }
}

#[tokio::test]
async fn disabled_gate_always_reports_clear() {
    let registry = Arc::new(InMemoryFreezeRegistry::new());
    registry.create(manual_freeze("fr1", None, None)).unwrap();

    let mut config = RolloutConfig::default();
    config.freeze.enabled = false;
    let (engine, _work_units) = RolloutEngine::from_config(config);
    let engine = engine.with_freeze_registry(registry);

    let blocking = engine
        .check_freeze_gate(&ContextBuilder::new().build(), &HashMap::new())
        .await
        .unwrap();
    assert!(blocking.is_empty());
}

#[tokio::test]
async fn engine_without_registry_reports_clear() {
    let (engine, _work_units) = RolloutEngine::from_config(RolloutConfig::default());
    let blocking = engine
        .check_freeze_gate(&ContextBuilder::new().build(), &HashMap::new())
        .await
        .unwrap();
    assert!(blocking.is_empty());
}
