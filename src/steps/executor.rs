//! Shared step lifecycle.
//!
//! The lifecycle is implemented once for every action: create the activity
//! record, build the action's worker request, then either complete
//! synchronously or dispatch and suspend. Only request construction varies
//! per action; forward and rollback never diverge in lifecycle handling.

use super::errors::StepError;
use super::instance_count::{resolve_instance_count, ResizeDirection};
use super::outcomes::{ResizeOutcome, SetupOutcome, SwapRoutesOutcome};
use super::request::WorkerRequest;
use super::state_data::StateExecutionData;
use super::step::{Step, StepAction, StepActionKind};
use crate::config::ExecutionConfig;
use crate::constants::events;
use crate::execution::{
    ActivityStatus, ActivityStore, CorrelationId, DelegateDispatcher, EventPublisher,
    ExecutionContext, ExecutionResponse, ExecutionStatus, SweepingOutputStore, SweepingScope,
    WorkerResult,
};
use crate::logging::{log_error, log_step_operation};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A request together with the output it will record on success
struct BuiltRequest {
    request: WorkerRequest,
    output_name: Option<String>,
    pending_output: Option<serde_json::Value>,
}

/// Drives steps through the shared lifecycle
pub struct StepExecutor {
    dispatcher: Arc<dyn DelegateDispatcher>,
    sweeping_outputs: Arc<SweepingOutputStore>,
    activities: Arc<ActivityStore>,
    events: EventPublisher,
    config: ExecutionConfig,
}

impl StepExecutor {
    pub fn new(
        dispatcher: Arc<dyn DelegateDispatcher>,
        sweeping_outputs: Arc<SweepingOutputStore>,
        activities: Arc<ActivityStore>,
        events: EventPublisher,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            dispatcher,
            sweeping_outputs,
            activities,
            events,
            config,
        }
    }

    /// Shared artifact store, for callers that seed or inspect outputs
    pub fn sweeping_outputs(&self) -> &Arc<SweepingOutputStore> {
        &self.sweeping_outputs
    }

    /// Shared activity store
    pub fn activities(&self) -> &Arc<ActivityStore> {
        &self.activities
    }

    /// Run a step up to its terminal status or async suspension point.
    ///
    /// Request-build and dispatch failures surface as a terminal `Failed`
    /// response; retry, if any, is the outer scheduler's policy.
    pub async fn execute(
        &self,
        step: &Step,
        context: &ExecutionContext,
    ) -> Result<ExecutionResponse, StepError> {
        let activity =
            self.activities
                .create(&step.id, &step.name, command_units(&step.action));
        self.events.publish(
            events::STEP_EXECUTION_STARTED,
            json!({
                "step_id": step.id,
                "action": step.action.kind().to_string(),
                "plan_execution_id": context.plan_execution_id,
            }),
        );
        log_step_operation(
            "execute",
            &context.plan_execution_id,
            Some(step.id.as_str()),
            Some(step.name.as_str()),
            "running",
            None,
        );

        let built = match self.build_request(step, context) {
            Ok(built) => built,
            Err(err) => {
                return Ok(self.fail_step(step, context, activity.id, &err.to_string()));
            }
        };

        if !step.mode.is_async() {
            return self.complete_sync(step, context, activity.id, built);
        }

        let timeout_minutes = self.resolve_timeout(step, context);
        let payload = serde_json::to_value(&built.request)?;
        let correlation_id = match self
            .dispatcher
            .dispatch(built.request.task_type(), payload, timeout_minutes)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                return Ok(self.fail_step(step, context, activity.id, &err.to_string()));
            }
        };

        let state = StateExecutionData {
            step_id: step.id.clone(),
            step_name: step.name.clone(),
            action_kind: step.action.kind(),
            correlation_id,
            activity_id: activity.id,
            output_name: built.output_name,
            pending_output: built.pending_output,
            timeout_minutes,
            context: context.clone(),
            started_at: Utc::now(),
        };

        self.events.publish(
            events::STEP_DISPATCHED,
            json!({
                "step_id": step.id,
                "correlation_id": correlation_id,
                "timeout_minutes": timeout_minutes,
            }),
        );
        Ok(ExecutionResponse::awaiting(vec![correlation_id], state))
    }

    /// Continue a suspended step with its worker result. Invoked exactly
    /// once per correlation id by the correlator.
    pub async fn handle_async_response(
        &self,
        step: &Step,
        context: &ExecutionContext,
        state: &StateExecutionData,
        responses: &HashMap<CorrelationId, WorkerResult>,
    ) -> Result<ExecutionResponse, StepError> {
        let result =
            responses
                .get(&state.correlation_id)
                .ok_or(StepError::MissingResponse {
                    correlation_id: state.correlation_id,
                })?;

        match result.status {
            ExecutionStatus::Success => {
                if let (Some(name), Some(pending)) = (&state.output_name, &state.pending_output) {
                    let payload =
                        finalize_output(state.action_kind, pending.clone(), &result.output)?;
                    self.sweeping_outputs.write(
                        SweepingScope::WorkflowRun,
                        &context.plan_execution_id,
                        name,
                        payload,
                    )?;
                }
                self.activities
                    .complete(state.activity_id, ActivityStatus::Success)?;
                self.events.publish(
                    events::STEP_COMPLETED,
                    json!({
                        "step_id": step.id,
                        "correlation_id": state.correlation_id,
                    }),
                );
                log_step_operation(
                    "handle_async_response",
                    &context.plan_execution_id,
                    Some(step.id.as_str()),
                    Some(step.name.as_str()),
                    "success",
                    None,
                );
                Ok(ExecutionResponse::success(Some(result.output.clone())))
            }
            ExecutionStatus::Failed => {
                let message = result
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "worker reported failure".to_string());
                Ok(self.fail_step(step, context, state.activity_id, &message))
            }
            ExecutionStatus::Running => Err(StepError::invalid_parameters(format!(
                "non-terminal worker result for correlation id {}",
                state.correlation_id
            ))),
        }
    }

    fn complete_sync(
        &self,
        step: &Step,
        context: &ExecutionContext,
        activity_id: Uuid,
        built: BuiltRequest,
    ) -> Result<ExecutionResponse, StepError> {
        if let (Some(name), Some(payload)) = (&built.output_name, built.pending_output.clone()) {
            self.sweeping_outputs.write(
                SweepingScope::WorkflowRun,
                &context.plan_execution_id,
                name,
                payload,
            )?;
        }
        self.activities.complete(activity_id, ActivityStatus::Success)?;
        self.events.publish(
            events::STEP_COMPLETED,
            json!({"step_id": step.id, "sync": true}),
        );
        Ok(ExecutionResponse::success(Some(serde_json::to_value(
            &built.request,
        )?)))
    }

    /// Terminal failure path shared by build, dispatch, and worker failures
    fn fail_step(
        &self,
        step: &Step,
        context: &ExecutionContext,
        activity_id: Uuid,
        message: &str,
    ) -> ExecutionResponse {
        if let Err(err) = self.activities.complete(activity_id, ActivityStatus::Failed) {
            debug!(activity_id = %activity_id, error = %err, "Activity already settled");
        }
        self.events.publish(
            events::STEP_FAILED,
            json!({"step_id": step.id, "error": message}),
        );
        log_error("steps", "execute", message, Some(step.id.as_str()));
        log_step_operation(
            "execute",
            &context.plan_execution_id,
            Some(step.id.as_str()),
            Some(step.name.as_str()),
            "failed",
            Some(message),
        );
        ExecutionResponse::failure(message)
    }

    /// Build the action's worker request. This is the only point where
    /// forward and rollback actions differ.
    fn build_request(
        &self,
        step: &Step,
        context: &ExecutionContext,
    ) -> Result<BuiltRequest, StepError> {
        match &step.action {
            StepAction::Setup(params) => {
                if params.max_instances == 0 {
                    return Err(StepError::invalid_parameters(
                        "setup requires max_instances of at least 1",
                    ));
                }
                let application_name = context.render(&params.application_name)?;
                let organization = context.render(&params.organization)?;
                let space = context.render(&params.space)?;
                let routes = context.render_all(&params.routes)?;
                let manifest = params
                    .manifest
                    .as_deref()
                    .map(|m| context.render(m))
                    .transpose()?;

                let outcome = SetupOutcome {
                    application_name: application_name.clone(),
                    max_instances: params.max_instances,
                    previous_count: 0,
                    organization: organization.clone(),
                    space: space.clone(),
                    routes: routes.clone(),
                    timeout_minutes: None,
                };
                Ok(BuiltRequest {
                    request: WorkerRequest::Setup {
                        application_name,
                        max_instances: params.max_instances,
                        organization,
                        space,
                        routes,
                        manifest,
                    },
                    output_name: context.setup_output_name(false),
                    pending_output: Some(serde_json::to_value(outcome)?),
                })
            }

            StepAction::Resize(params) => {
                let setup = self.read_setup_output(context, false)?;
                let desired_count = resolve_instance_count(
                    setup.max_instances,
                    params.upsize.value,
                    params.upsize.unit,
                    ResizeDirection::Upsize,
                );
                // symmetric resize when no explicit downsize is supplied
                let downsize_count = params.downsize.map_or(desired_count, |target| {
                    resolve_instance_count(
                        setup.max_instances,
                        target.value,
                        target.unit,
                        ResizeDirection::Downsize,
                    )
                });

                let outcome = ResizeOutcome {
                    previous_count: setup.previous_count,
                    desired_count,
                };
                Ok(BuiltRequest {
                    request: WorkerRequest::Resize {
                        application_name: setup.application_name,
                        desired_count,
                        downsize_count,
                    },
                    output_name: context.resize_output_name(false),
                    pending_output: Some(serde_json::to_value(outcome)?),
                })
            }

            StepAction::Rollback => {
                let setup = self.read_setup_output(context, true)?;
                let name = context
                    .resize_output_name(true)
                    .ok_or(StepError::NotInRollbackPhase)?;
                let recorded: ResizeOutcome = self
                    .sweeping_outputs
                    .find_typed(
                        SweepingScope::WorkflowRun,
                        &context.plan_execution_id,
                        &name,
                    )?
                    .ok_or(StepError::MissingRollbackSource { name })?;
                let inverted = recorded.inverted();

                Ok(BuiltRequest {
                    request: WorkerRequest::Resize {
                        application_name: setup.application_name,
                        desired_count: inverted.desired_count,
                        downsize_count: inverted.previous_count,
                    },
                    output_name: None,
                    pending_output: None,
                })
            }

            StepAction::MapRoute(params) => Ok(BuiltRequest {
                request: WorkerRequest::MapRoutes {
                    application_name: context.render(&params.application_name)?,
                    routes: context.render_all(&params.routes)?,
                },
                output_name: None,
                pending_output: None,
            }),

            StepAction::UnmapRoute(params) => Ok(BuiltRequest {
                request: WorkerRequest::UnmapRoutes {
                    application_name: context.render(&params.application_name)?,
                    routes: context.render_all(&params.routes)?,
                },
                output_name: None,
                pending_output: None,
            }),

            StepAction::SwapRoutes(params) => {
                let active_application = context.render(&params.active_application)?;
                let inactive_application = context.render(&params.inactive_application)?;
                let active_routes = context.render_all(&params.active_routes)?;
                let inactive_routes = context.render_all(&params.inactive_routes)?;

                let outcome = SwapRoutesOutcome {
                    active_application: active_application.clone(),
                    inactive_application: inactive_application.clone(),
                    active_routes: active_routes.clone(),
                    inactive_routes: inactive_routes.clone(),
                };
                Ok(BuiltRequest {
                    request: WorkerRequest::SwapRoutes {
                        active_application,
                        inactive_application,
                        active_routes,
                        inactive_routes,
                    },
                    output_name: context.swap_routes_output_name(false),
                    pending_output: Some(serde_json::to_value(outcome)?),
                })
            }

            StepAction::SwapRoutesRollback => {
                let name = context
                    .swap_routes_output_name(true)
                    .ok_or(StepError::NotInRollbackPhase)?;
                let recorded: SwapRoutesOutcome = self
                    .sweeping_outputs
                    .find_typed(
                        SweepingScope::WorkflowRun,
                        &context.plan_execution_id,
                        &name,
                    )?
                    .ok_or(StepError::MissingRollbackSource { name })?;
                let inverted = recorded.inverted();

                Ok(BuiltRequest {
                    request: WorkerRequest::SwapRoutes {
                        active_application: inverted.active_application,
                        inactive_application: inverted.inactive_application,
                        active_routes: inverted.active_routes,
                        inactive_routes: inverted.inactive_routes,
                    },
                    output_name: None,
                    pending_output: None,
                })
            }
        }
    }

    fn read_setup_output(
        &self,
        context: &ExecutionContext,
        for_rollback: bool,
    ) -> Result<SetupOutcome, StepError> {
        let name = context
            .setup_output_name(for_rollback)
            .ok_or(StepError::NotInRollbackPhase)?;
        let setup = self
            .sweeping_outputs
            .find_typed::<SetupOutcome>(
                SweepingScope::WorkflowRun,
                &context.plan_execution_id,
                &name,
            )?;
        match (setup, for_rollback) {
            (Some(output), _) => Ok(output),
            (None, false) => Err(StepError::MissingSetupOutput { name }),
            (None, true) => Err(StepError::MissingRollbackSource { name }),
        }
    }

    /// Explicit step timeout, else the recorded setup hint, else the
    /// configured default
    fn resolve_timeout(&self, step: &Step, context: &ExecutionContext) -> u64 {
        if let Some(minutes) = step.timeout_minutes {
            return minutes;
        }
        if let Some(name) = context.setup_output_name(step.action.is_rollback()) {
            if let Ok(Some(setup)) = self.sweeping_outputs.find_typed::<SetupOutcome>(
                SweepingScope::WorkflowRun,
                &context.plan_execution_id,
                &name,
            ) {
                if let Some(minutes) = setup.timeout_minutes {
                    return minutes;
                }
            }
        }
        self.config.default_step_timeout_minutes
    }
}

/// Merge worker-reported fields into the pre-computed output payload
fn finalize_output(
    kind: StepActionKind,
    pending: serde_json::Value,
    worker_output: &serde_json::Value,
) -> Result<serde_json::Value, StepError> {
    if kind != StepActionKind::Setup {
        return Ok(pending);
    }
    let mut outcome: SetupOutcome = serde_json::from_value(pending)?;
    if let Some(previous) = worker_output.get("previous_count").and_then(|v| v.as_u64()) {
        outcome.previous_count = u32::try_from(previous).unwrap_or(u32::MAX);
    }
    if let Some(timeout) = worker_output.get("timeout_minutes").and_then(|v| v.as_u64()) {
        outcome.timeout_minutes = Some(timeout);
    }
    Ok(serde_json::to_value(outcome)?)
}

/// Audit command units shown for each action
fn command_units(action: &StepAction) -> Vec<String> {
    let units: &[&str] = match action.kind() {
        StepActionKind::Setup => &["Preparing infrastructure", "Creating application"],
        StepActionKind::Resize => &["Upsize application", "Downsize old application"],
        StepActionKind::Rollback => &["Restore previous counts"],
        StepActionKind::MapRoute => &["Map routes"],
        StepActionKind::UnmapRoute => &["Unmap routes"],
        StepActionKind::SwapRoutes => &["Swap routes"],
        StepActionKind::SwapRoutesRollback => &["Restore route assignment"],
    };
    units.iter().map(|s| (*s).to_string()).collect()
}
