//! Step definitions: a closed sum of deployment actions sharing one
//! lifecycle.

use super::instance_count::InstanceUnit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a step's work is facilitated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilitationMode {
    /// Runs to a terminal status within `execute`
    Sync,
    /// Dispatches to a remote worker and suspends
    Async,
    /// Dispatches as a long-running task and suspends
    Task,
}

impl FacilitationMode {
    /// Check if this mode suspends awaiting a worker result
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async | Self::Task)
    }
}

/// A requested resize value with its unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceTarget {
    pub value: u32,
    pub unit: InstanceUnit,
}

/// Parameters for a platform setup step.
///
/// String fields may carry `${var}` expressions resolved at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupParams {
    pub application_name: String,
    pub max_instances: u32,
    pub organization: String,
    pub space: String,
    pub routes: Vec<String>,
    pub manifest: Option<String>,
}

/// Parameters for a resize/deploy step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeParams {
    pub upsize: InstanceTarget,
    /// Absent means symmetric resize: the downsize reuses the
    /// upsize-resolved count unchanged
    pub downsize: Option<InstanceTarget>,
}

/// Parameters for route map/unmap steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteUpdateParams {
    pub application_name: String,
    pub routes: Vec<String>,
}

/// Parameters for a blue/green route swap step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRoutesParams {
    pub active_application: String,
    pub inactive_application: String,
    pub active_routes: Vec<String>,
    pub inactive_routes: Vec<String>,
}

/// The closed set of deployment actions.
///
/// Rollback variants carry no parameters of their own: they compute their
/// request by inverting the paired forward step's recorded output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    Setup(SetupParams),
    Resize(ResizeParams),
    /// Rollback of a resize: swaps the recorded previous and desired counts
    Rollback,
    MapRoute(RouteUpdateParams),
    UnmapRoute(RouteUpdateParams),
    SwapRoutes(SwapRoutesParams),
    /// Rollback of a route swap: restores the recorded prior assignment
    SwapRoutesRollback,
}

/// Discriminator for a step action, used in persisted state snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepActionKind {
    Setup,
    Resize,
    Rollback,
    MapRoute,
    UnmapRoute,
    SwapRoutes,
    SwapRoutesRollback,
}

impl StepAction {
    /// Discriminator for this action
    pub fn kind(&self) -> StepActionKind {
        match self {
            Self::Setup(_) => StepActionKind::Setup,
            Self::Resize(_) => StepActionKind::Resize,
            Self::Rollback => StepActionKind::Rollback,
            Self::MapRoute(_) => StepActionKind::MapRoute,
            Self::UnmapRoute(_) => StepActionKind::UnmapRoute,
            Self::SwapRoutes(_) => StepActionKind::SwapRoutes,
            Self::SwapRoutesRollback => StepActionKind::SwapRoutesRollback,
        }
    }

    /// Check if this action reverts a paired forward action
    pub fn is_rollback(&self) -> bool {
        matches!(self, Self::Rollback | Self::SwapRoutesRollback)
    }
}

impl fmt::Display for StepActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Resize => write!(f, "resize"),
            Self::Rollback => write!(f, "rollback"),
            Self::MapRoute => write!(f, "map_route"),
            Self::UnmapRoute => write!(f, "unmap_route"),
            Self::SwapRoutes => write!(f, "swap_routes"),
            Self::SwapRoutesRollback => write!(f, "swap_routes_rollback"),
        }
    }
}

/// One discrete, resumable deployment action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub name: String,
    pub mode: FacilitationMode,
    /// Overrides the recorded or configured timeout when present
    pub timeout_minutes: Option<u64>,
    pub action: StepAction,
}

impl Step {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mode: FacilitationMode,
        action: StepAction,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mode,
            timeout_minutes: None,
            action,
        }
    }

    /// Set an explicit timeout for the dispatched work unit
    pub fn with_timeout_minutes(mut self, minutes: u64) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_modes() {
        assert!(!FacilitationMode::Sync.is_async());
        assert!(FacilitationMode::Async.is_async());
        assert!(FacilitationMode::Task.is_async());
    }

    #[test]
    fn test_rollback_actions_are_flagged() {
        assert!(StepAction::Rollback.is_rollback());
        assert!(StepAction::SwapRoutesRollback.is_rollback());
        assert!(!StepAction::Resize(ResizeParams {
            upsize: InstanceTarget {
                value: 50,
                unit: InstanceUnit::Percentage
            },
            downsize: None,
        })
        .is_rollback());
    }

    #[test]
    fn test_action_serde_uses_tag() {
        let action = StepAction::MapRoute(RouteUpdateParams {
            application_name: "orders".to_string(),
            routes: vec!["orders.example.com".to_string()],
        });
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "map_route");
    }
}
