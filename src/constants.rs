//! # System Constants
//!
//! Core constants and naming schemes that define the operational boundaries
//! of the rollout orchestration engine.

/// Reserved identifier for the single global freeze at each scope level.
pub const GLOBAL_FREEZE_IDENTIFIER: &str = "_GLOBAL_";

/// Lifecycle event names published by the step execution engine
pub mod events {
    // Step lifecycle events
    pub const STEP_EXECUTION_STARTED: &str = "step.execution_started";
    pub const STEP_DISPATCHED: &str = "step.dispatched";
    pub const STEP_COMPLETED: &str = "step.completed";
    pub const STEP_FAILED: &str = "step.failed";

    // Freeze gate events
    pub const FREEZE_EVALUATED: &str = "freeze.evaluated";
    pub const FREEZE_EXECUTION_RECORDED: &str = "freeze.execution_recorded";
}

/// Deterministic sweeping-output name prefixes, one per recording step kind.
///
/// The full name is the prefix plus the phase name; rollback steps resolve
/// the paired forward name through the rollback phase name so both sides of
/// a pair agree on the lookup key.
pub mod sweeping_output {
    pub const SETUP_PREFIX: &str = "setupSweepingOutput";
    pub const RESIZE_PREFIX: &str = "deploySweepingOutput";
    pub const SWAP_ROUTES_PREFIX: &str = "swapRouteSweepingOutput";
}

/// System-level defaults
pub mod system {
    /// Default timeout applied to dispatched work units when neither the
    /// step nor the recorded setup output supplies one.
    pub const DEFAULT_STEP_TIMEOUT_MINUTES: u64 = 30;

    /// Default capacity for the dispatcher work queue and the correlator
    /// response channel.
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

    /// Default capacity for the lifecycle event broadcast channel.
    pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

    /// Freeze windows shorter than this are rejected at build time.
    pub const MIN_FREEZE_WINDOW_MINUTES: i64 = 30;

    /// Freeze windows longer than this are rejected at build time.
    pub const MAX_FREEZE_WINDOW_DAYS: i64 = 365;
}
