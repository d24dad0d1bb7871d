//! Sweeping-output payloads recorded by forward steps.
//!
//! Each recording step writes exactly one of these under its deterministic
//! name; the paired rollback step reads it back to invert the action.

use serde::{Deserialize, Serialize};

/// Recorded by a successful setup step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupOutcome {
    pub application_name: String,
    pub max_instances: u32,
    /// Instances the outgoing application was running at setup time
    pub previous_count: u32,
    pub organization: String,
    pub space: String,
    pub routes: Vec<String>,
    /// Worker-reported timeout hint for subsequent steps of this run
    pub timeout_minutes: Option<u64>,
}

/// Recorded by a successful forward resize step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeOutcome {
    pub previous_count: u32,
    pub desired_count: u32,
}

impl ResizeOutcome {
    /// The rollback view: previous and desired quantities swapped
    pub fn inverted(self) -> Self {
        Self {
            previous_count: self.desired_count,
            desired_count: self.previous_count,
        }
    }
}

/// Recorded by a successful route-swap step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRoutesOutcome {
    pub active_application: String,
    pub inactive_application: String,
    pub active_routes: Vec<String>,
    pub inactive_routes: Vec<String>,
}

impl SwapRoutesOutcome {
    /// The rollback view: applications and route sets exchanged back
    pub fn inverted(self) -> Self {
        Self {
            active_application: self.inactive_application,
            inactive_application: self.active_application,
            active_routes: self.inactive_routes,
            inactive_routes: self.active_routes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_inversion_swaps_counts() {
        let outcome = ResizeOutcome {
            previous_count: 4,
            desired_count: 2,
        };
        let inverted = outcome.inverted();
        assert_eq!(inverted.previous_count, 2);
        assert_eq!(inverted.desired_count, 4);
        // inverting twice restores the original
        assert_eq!(inverted.inverted(), outcome);
    }

    #[test]
    fn test_swap_inversion_exchanges_assignments() {
        let outcome = SwapRoutesOutcome {
            active_application: "orders-v2".into(),
            inactive_application: "orders-v1".into(),
            active_routes: vec!["live.example.com".into()],
            inactive_routes: vec!["idle.example.com".into()],
        };
        let inverted = outcome.clone().inverted();
        assert_eq!(inverted.active_application, "orders-v1");
        assert_eq!(inverted.active_routes, vec!["idle.example.com".to_string()]);
        assert_eq!(inverted.inverted(), outcome);
    }
}
