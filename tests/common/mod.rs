//! Shared fixtures for integration tests.

#![allow(dead_code)] // Not every test binary uses every fixture

use rollout_core::config::ExecutionConfig;
use rollout_core::execution::{
    ActivityStore, EventPublisher, ExecutionContext, QueuedDispatcher, ResponseCorrelator,
    SweepingOutputStore, WorkUnit,
};
use rollout_core::freeze::{
    EntityConfig, FilterType, FreezeConfig, FreezeEntityRule, FreezeEntityType, FreezeStatus,
    FreezeWindow, Recurrence, RecurrencePattern, WindowEnd,
};
use rollout_core::steps::{
    FacilitationMode, InstanceTarget, InstanceUnit, ResizeParams, SetupParams, Step, StepAction,
    StepExecutor, SwapRoutesParams,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Fully wired step engine backed by an in-process work queue
pub struct EngineHarness {
    pub executor: Arc<StepExecutor>,
    pub correlator: ResponseCorrelator,
    pub work_queue: mpsc::Receiver<WorkUnit>,
}

impl EngineHarness {
    pub fn new() -> Self {
        let (dispatcher, work_queue) = QueuedDispatcher::new(64);
        let executor = Arc::new(StepExecutor::new(
            Arc::new(dispatcher),
            Arc::new(SweepingOutputStore::new()),
            Arc::new(ActivityStore::new()),
            EventPublisher::new(64),
            ExecutionConfig::default(),
        ));
        let correlator = ResponseCorrelator::new(Arc::clone(&executor));
        Self {
            executor,
            correlator,
            work_queue,
        }
    }
}

/// Builder for test execution contexts
pub struct ContextBuilder {
    plan_execution_id: String,
    phase_name: String,
    rollback_phase_name: Option<String>,
    variables: HashMap<String, String>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            plan_execution_id: "plan-1".to_string(),
            phase_name: "Phase 1".to_string(),
            rollback_phase_name: None,
            variables: HashMap::new(),
        }
    }

    pub fn with_plan_execution_id(mut self, id: &str) -> Self {
        self.plan_execution_id = id.to_string();
        self
    }

    pub fn with_phase(mut self, phase: &str) -> Self {
        self.phase_name = phase.to_string();
        self
    }

    pub fn in_rollback_of(mut self, forward_phase: &str) -> Self {
        self.rollback_phase_name = Some(forward_phase.to_string());
        self
    }

    pub fn with_variable(mut self, name: &str, value: &str) -> Self {
        self.variables.insert(name.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> ExecutionContext {
        ExecutionContext::new(
            "acct",
            Some("org1".to_string()),
            Some("proj1".to_string()),
            "app-1",
            "env-1",
            "infra-1",
            "pipeline-1",
            self.plan_execution_id,
            "stage-1",
            self.phase_name,
            self.rollback_phase_name,
            self.variables,
        )
    }
}

pub fn setup_step(max_instances: u32) -> Step {
    Step::new(
        "step-setup",
        "App Setup",
        FacilitationMode::Task,
        StepAction::Setup(SetupParams {
            application_name: "orders".to_string(),
            max_instances,
            organization: "org1".to_string(),
            space: "dev".to_string(),
            routes: vec!["orders.example.com".to_string()],
            manifest: None,
        }),
    )
}

pub fn resize_step(percent: u32) -> Step {
    Step::new(
        "step-resize",
        "App Resize",
        FacilitationMode::Task,
        StepAction::Resize(ResizeParams {
            upsize: InstanceTarget {
                value: percent,
                unit: InstanceUnit::Percentage,
            },
            downsize: None,
        }),
    )
}

pub fn rollback_step() -> Step {
    Step::new(
        "step-rollback",
        "App Rollback",
        FacilitationMode::Task,
        StepAction::Rollback,
    )
}

pub fn swap_routes_step() -> Step {
    Step::new(
        "step-swap",
        "Swap Routes",
        FacilitationMode::Task,
        StepAction::SwapRoutes(SwapRoutesParams {
            active_application: "orders-v2".to_string(),
            inactive_application: "orders-v1".to_string(),
            active_routes: vec!["live.example.com".to_string()],
            inactive_routes: vec!["idle.example.com".to_string()],
        }),
    )
}

pub fn window_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 5, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

/// A two-hour window starting at [`window_start`]
pub fn plain_window() -> FreezeWindow {
    FreezeWindow::build("UTC", window_start(), WindowEnd::DurationMinutes(120), None).unwrap()
}

/// A daily-recurring two-hour window starting at [`window_start`]
pub fn daily_window() -> FreezeWindow {
    FreezeWindow::build(
        "UTC",
        window_start(),
        WindowEnd::DurationMinutes(120),
        Some(Recurrence {
            pattern: RecurrencePattern::Daily,
            until: None,
            every: None,
        }),
    )
    .unwrap()
}

pub fn match_all_rule() -> FreezeEntityRule {
    FreezeEntityRule {
        name: "everything".to_string(),
        entity_configs: vec![EntityConfig {
            freeze_entity_type: FreezeEntityType::Service,
            filter_type: FilterType::All,
            entity_references: vec![],
        }],
    }
}

pub fn manual_freeze(
    identifier: &str,
    org_id: Option<&str>,
    project_id: Option<&str>,
) -> FreezeConfig {
    FreezeConfig::build_manual(
        "acct",
        org_id.map(str::to_string),
        project_id.map(str::to_string),
        identifier,
        format!("Freeze {identifier}"),
        FreezeStatus::Enabled,
        vec![daily_window()],
        vec![match_all_rule()],
    )
    .unwrap()
}
