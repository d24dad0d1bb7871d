//! Typed worker requests, one per step action.
//!
//! Forward and rollback actions never diverge in lifecycle handling, only
//! in which of these requests they build and from what source.

use serde::{Deserialize, Serialize};

/// Outbound request dispatched to a remote worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerRequest {
    /// Create the inactive application shell with capacity for
    /// `max_instances`
    Setup {
        application_name: String,
        max_instances: u32,
        organization: String,
        space: String,
        routes: Vec<String>,
        manifest: Option<String>,
    },
    /// Resize the incoming application up and the outgoing application down
    Resize {
        application_name: String,
        desired_count: u32,
        downsize_count: u32,
    },
    /// Attach routes to an application
    MapRoutes {
        application_name: String,
        routes: Vec<String>,
    },
    /// Detach routes from an application
    UnmapRoutes {
        application_name: String,
        routes: Vec<String>,
    },
    /// Exchange the live and idle route sets between two applications
    SwapRoutes {
        active_application: String,
        inactive_application: String,
        active_routes: Vec<String>,
        inactive_routes: Vec<String>,
    },
}

impl WorkerRequest {
    /// Task type string used when dispatching this request
    pub fn task_type(&self) -> &'static str {
        match self {
            Self::Setup { .. } => "deploy.setup",
            Self::Resize { .. } => "deploy.resize",
            Self::MapRoutes { .. } => "deploy.map_routes",
            Self::UnmapRoutes { .. } => "deploy.unmap_routes",
            Self::SwapRoutes { .. } => "deploy.swap_routes",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_types_are_distinct() {
        let requests = [
            WorkerRequest::Setup {
                application_name: "a".into(),
                max_instances: 1,
                organization: "o".into(),
                space: "s".into(),
                routes: vec![],
                manifest: None,
            },
            WorkerRequest::Resize {
                application_name: "a".into(),
                desired_count: 1,
                downsize_count: 0,
            },
            WorkerRequest::MapRoutes {
                application_name: "a".into(),
                routes: vec![],
            },
            WorkerRequest::UnmapRoutes {
                application_name: "a".into(),
                routes: vec![],
            },
            WorkerRequest::SwapRoutes {
                active_application: "a".into(),
                inactive_application: "b".into(),
                active_routes: vec![],
                inactive_routes: vec![],
            },
        ];
        let mut types: Vec<_> = requests.iter().map(|r| r.task_type()).collect();
        types.sort_unstable();
        types.dedup();
        assert_eq!(types.len(), requests.len());
    }
}
