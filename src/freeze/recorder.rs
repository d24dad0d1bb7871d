//! Frozen-execution audit recorder.
//!
//! Snapshots which freezes were active for a given execution so operators
//! can audit why a deployment was held. Records are append-on-create and
//! immutable thereafter.

use super::types::{FreezeSummary, FrozenExecution};
use crate::constants::events;
use crate::execution::{EventPublisher, ExecutionContext};
use chrono::Utc;
use dashmap::DashMap;
use serde_json::json;
use tracing::debug;

/// Write-once store of frozen-execution snapshots, keyed by plan execution
#[derive(Default)]
pub struct FrozenExecutionRecorder {
    records: DashMap<String, FrozenExecution>,
    events: EventPublisher,
}

impl FrozenExecutionRecorder {
    pub fn new(events: EventPublisher) -> Self {
        Self {
            records: DashMap::new(),
            events,
        }
    }

    /// Record the active freezes for one execution.
    ///
    /// A missing context or empty freeze lists is "nothing to record", not
    /// an error: the call is a no-op and never fails. A repeat call for the
    /// same plan execution leaves the existing snapshot untouched.
    pub fn record(
        &self,
        context: Option<&ExecutionContext>,
        manual_freezes: &[FreezeSummary],
        global_freezes: &[FreezeSummary],
    ) {
        let Some(context) = context else {
            debug!("No execution context supplied, nothing to record");
            return;
        };
        if manual_freezes.is_empty() && global_freezes.is_empty() {
            return;
        }

        let key = context.plan_execution_id.clone();
        if self.records.contains_key(&key) {
            debug!(
                plan_execution_id = %key,
                "Frozen execution already recorded, snapshot is immutable"
            );
            return;
        }

        let record = FrozenExecution {
            account_id: context.account_id.clone(),
            org_id: context.org_id.clone(),
            project_id: context.project_id.clone(),
            plan_execution_id: context.plan_execution_id.clone(),
            stage_execution_id: context.stage_execution_id.clone(),
            pipeline_id: context.pipeline_id.clone(),
            manual_freeze_list: manual_freezes.to_vec(),
            global_freeze_list: global_freezes.to_vec(),
            created_at: Utc::now(),
        };
        self.records.insert(key.clone(), record);
        self.events.publish(
            events::FREEZE_EXECUTION_RECORDED,
            json!({
                "plan_execution_id": key,
                "manual_count": manual_freezes.len(),
                "global_count": global_freezes.len(),
            }),
        );
    }

    /// Fetch the snapshot for a plan execution
    pub fn find(&self, plan_execution_id: &str) -> Option<FrozenExecution> {
        self.records
            .get(plan_execution_id)
            .map(|entry| entry.clone())
    }

    /// Number of recorded executions
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn context() -> ExecutionContext {
        ExecutionContext::new(
            "acct",
            Some("org".to_string()),
            Some("proj".to_string()),
            "app",
            "env",
            "infra",
            "pipe",
            "plan-1",
            "stage-1",
            "Phase 1",
            None,
            HashMap::new(),
        )
    }

    fn summary() -> FreezeSummary {
        use crate::freeze::types::{FreezeScope, FreezeStatus, FreezeType};
        FreezeSummary {
            account_id: "acct".to_string(),
            org_id: None,
            project_id: None,
            identifier: "fr1".to_string(),
            name: "Freeze".to_string(),
            freeze_type: FreezeType::Manual,
            scope: FreezeScope::Account,
            status: FreezeStatus::Enabled,
            windows: vec![],
            rules: vec![],
            next_iteration: None,
        }
    }

    #[test]
    fn test_missing_context_is_a_noop() {
        let recorder = FrozenExecutionRecorder::new(EventPublisher::new(4));
        recorder.record(None, &[summary()], &[]);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_empty_freeze_lists_record_nothing() {
        let recorder = FrozenExecutionRecorder::new(EventPublisher::new(4));
        recorder.record(Some(&context()), &[], &[]);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_snapshot_is_written_once() {
        let recorder = FrozenExecutionRecorder::new(EventPublisher::new(4));
        recorder.record(Some(&context()), &[summary()], &[]);
        assert_eq!(recorder.len(), 1);

        // a second record for the same execution is ignored
        recorder.record(Some(&context()), &[summary(), summary()], &[summary()]);
        let record = recorder.find("plan-1").unwrap();
        assert_eq!(record.manual_freeze_list.len(), 1);
        assert!(record.global_freeze_list.is_empty());
    }
}
