//! Per-run execution context and expression rendering.
//!
//! The context is an explicit argument to every state-machine function; no
//! ambient or thread-local lookup exists. It is fully serializable so a
//! suspended step's snapshot can reconstruct it on resume.

use crate::constants::sweeping_output;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while rendering templated expressions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Unresolved expression: ${{{name}}}")]
    UnresolvedExpression { name: String },

    #[error("Unterminated expression in: {input}")]
    UnterminatedExpression { input: String },
}

/// Renders `${var}` placeholders from a per-run variable map.
///
/// Unresolved placeholders are configuration errors: a step must fail fast
/// rather than dispatch a request with a dangling template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpressionRenderer {
    variables: HashMap<String, String>,
}

impl ExpressionRenderer {
    pub fn new(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }

    /// Render every `${var}` occurrence in `input`
    pub fn render(&self, input: &str) -> Result<String, RenderError> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                return Err(RenderError::UnterminatedExpression {
                    input: input.to_string(),
                });
            };
            let name = &after[..end];
            let value =
                self.variables
                    .get(name)
                    .ok_or_else(|| RenderError::UnresolvedExpression {
                        name: name.to_string(),
                    })?;
            out.push_str(value);
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Render each element of a list
    pub fn render_all(&self, inputs: &[String]) -> Result<Vec<String>, RenderError> {
        inputs.iter().map(|i| self.render(i)).collect()
    }
}

/// Ephemeral per-run state: application/environment/infrastructure
/// references, organizational scope, phase naming, and the expression
/// renderer. One instance per workflow run; reconstructed from persisted
/// state data on resume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionContext {
    pub account_id: String,
    pub org_id: Option<String>,
    pub project_id: Option<String>,
    pub app_id: String,
    pub env_id: String,
    pub infra_id: String,
    pub pipeline_id: String,
    pub plan_execution_id: String,
    pub stage_execution_id: String,
    /// Name of the currently executing phase
    pub phase_name: String,
    /// For rollback phases: the name of the forward phase being reverted
    pub rollback_phase_name: Option<String>,
    renderer: ExpressionRenderer,
}

impl ExecutionContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: impl Into<String>,
        org_id: Option<String>,
        project_id: Option<String>,
        app_id: impl Into<String>,
        env_id: impl Into<String>,
        infra_id: impl Into<String>,
        pipeline_id: impl Into<String>,
        plan_execution_id: impl Into<String>,
        stage_execution_id: impl Into<String>,
        phase_name: impl Into<String>,
        rollback_phase_name: Option<String>,
        variables: HashMap<String, String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            org_id,
            project_id,
            app_id: app_id.into(),
            env_id: env_id.into(),
            infra_id: infra_id.into(),
            pipeline_id: pipeline_id.into(),
            plan_execution_id: plan_execution_id.into(),
            stage_execution_id: stage_execution_id.into(),
            phase_name: phase_name.into(),
            rollback_phase_name,
            renderer: ExpressionRenderer::new(variables),
        }
    }

    /// Render a templated field against this run's variables
    pub fn render(&self, input: &str) -> Result<String, RenderError> {
        self.renderer.render(input)
    }

    /// Render a list of templated fields
    pub fn render_all(&self, inputs: &[String]) -> Result<Vec<String>, RenderError> {
        self.renderer.render_all(inputs)
    }

    /// Deterministic sweeping-output name for a recording step kind.
    ///
    /// Forward steps append the current phase name; rollback lookups append
    /// the forward phase this rollback reverts, so both sides of a pair
    /// resolve the same key. Returns `None` for a rollback lookup outside a
    /// rollback phase.
    pub fn sweeping_output_name(&self, prefix: &str, for_rollback: bool) -> Option<String> {
        if for_rollback {
            self.rollback_phase_name
                .as_deref()
                .map(|phase| format!("{prefix}{}", phase.trim()))
        } else {
            Some(format!("{prefix}{}", self.phase_name.trim()))
        }
    }

    /// Name under which this run's setup output is recorded
    pub fn setup_output_name(&self, for_rollback: bool) -> Option<String> {
        self.sweeping_output_name(sweeping_output::SETUP_PREFIX, for_rollback)
    }

    /// Name under which this run's resize output is recorded
    pub fn resize_output_name(&self, for_rollback: bool) -> Option<String> {
        self.sweeping_output_name(sweeping_output::RESIZE_PREFIX, for_rollback)
    }

    /// Name under which this run's route-swap output is recorded
    pub fn swap_routes_output_name(&self, for_rollback: bool) -> Option<String> {
        self.sweeping_output_name(sweeping_output::SWAP_ROUTES_PREFIX, for_rollback)
    }
}
