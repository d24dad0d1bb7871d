//! # Engine Assembly
//!
//! Wires the dispatcher, stores, executor, correlator, and freeze gate into
//! one operational engine from a [`RolloutConfig`]. Embedding hosts hand
//! the returned work-unit receiver to their worker transport and feed
//! results back through the correlator channel.

use crate::config::RolloutConfig;
use crate::execution::{
    ActivityStore, EventPublisher, ExecutionContext, ExecutionResponse, QueuedDispatcher,
    ResponseCorrelator, SweepingOutputStore, WorkUnit, WorkerResult,
};
use crate::freeze::{
    EntityMap, FreezeError, FreezeEvaluator, FreezeRegistry, FreezeSummary,
    FrozenExecutionRecorder,
};
use crate::steps::{Step, StepError, StepExecutor};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Fully wired orchestration engine
pub struct RolloutEngine {
    config: RolloutConfig,
    executor: Arc<StepExecutor>,
    correlator: Arc<ResponseCorrelator>,
    events: EventPublisher,
    freeze_gate: Option<FreezeGate>,
}

struct FreezeGate {
    evaluator: FreezeEvaluator,
    recorder: FrozenExecutionRecorder,
}

impl RolloutEngine {
    /// Assemble an engine from configuration. Returns the engine and the
    /// receiving half of the work-unit queue for the worker transport.
    pub fn from_config(config: RolloutConfig) -> (Self, mpsc::Receiver<WorkUnit>) {
        let (dispatcher, work_units) = QueuedDispatcher::new(config.dispatcher.queue_capacity);
        let events = EventPublisher::new(config.execution.event_channel_capacity);
        let executor = Arc::new(StepExecutor::new(
            Arc::new(dispatcher),
            Arc::new(SweepingOutputStore::new()),
            Arc::new(ActivityStore::new()),
            events.clone(),
            config.execution.clone(),
        ));
        let correlator = Arc::new(ResponseCorrelator::new(Arc::clone(&executor)));

        info!(
            queue_capacity = config.dispatcher.queue_capacity,
            freeze_gate = config.freeze.enabled,
            "Rollout engine assembled"
        );
        (
            Self {
                config,
                executor,
                correlator,
                events,
                freeze_gate: None,
            },
            work_units,
        )
    }

    /// Attach a freeze registry, enabling the freeze gate
    pub fn with_freeze_registry(mut self, registry: Arc<dyn FreezeRegistry>) -> Self {
        self.freeze_gate = Some(FreezeGate {
            evaluator: FreezeEvaluator::new(registry),
            recorder: FrozenExecutionRecorder::new(self.events.clone()),
        });
        self
    }

    /// Run a step; an async step is automatically registered with the
    /// correlator before the response is returned, so a worker result can
    /// never arrive for an unregistered id.
    pub async fn execute_step(
        &self,
        step: &Step,
        context: &ExecutionContext,
    ) -> Result<ExecutionResponse, StepError> {
        let response = self.executor.execute(step, context).await?;
        if response.is_async {
            if let Some(state) = response.state_data.clone() {
                self.correlator.register(step.clone(), state);
            }
        }
        Ok(response)
    }

    /// Consult the freeze gate for an execution. Returns the blocking
    /// freezes (empty means clear) and records the audit snapshot when the
    /// execution is blocked. A disabled gate or absent registry always
    /// reports clear.
    pub async fn check_freeze_gate(
        &self,
        context: &ExecutionContext,
        entity_map: &EntityMap,
    ) -> Result<Vec<FreezeSummary>, FreezeError> {
        if !self.config.freeze.enabled {
            return Ok(Vec::new());
        }
        let Some(gate) = &self.freeze_gate else {
            return Ok(Vec::new());
        };

        let blocking = gate
            .evaluator
            .is_blocked(
                &context.account_id,
                context.org_id.as_deref(),
                context.project_id.as_deref(),
                Some(context.pipeline_id.as_str()),
                entity_map,
            )
            .await?;
        if !blocking.is_empty() {
            let (manual, global): (Vec<_>, Vec<_>) = blocking
                .iter()
                .cloned()
                .partition(|s| s.freeze_type == crate::freeze::FreezeType::Manual);
            gate.recorder.record(Some(context), &manual, &global);
        }
        Ok(blocking)
    }

    /// Spawn the correlator loop; feed worker results into the returned
    /// sender
    pub fn spawn_correlator(&self) -> mpsc::Sender<WorkerResult> {
        let (sender, receiver) =
            mpsc::channel(self.config.dispatcher.response_channel_capacity);
        let correlator = Arc::clone(&self.correlator);
        tokio::spawn(async move {
            correlator.run(receiver).await;
        });
        sender
    }

    /// The step executor, for direct driving in tests and embeddings
    pub fn executor(&self) -> &Arc<StepExecutor> {
        &self.executor
    }

    /// The response correlator
    pub fn correlator(&self) -> &Arc<ResponseCorrelator> {
        &self.correlator
    }

    /// Lifecycle event publisher
    pub fn events(&self) -> &EventPublisher {
        &self.events
    }
}
