//! # Freeze Evaluation Engine
//!
//! Hierarchical resolution of deployment freeze configurations and the pure
//! evaluation logic deciding whether an execution may proceed.
//!
//! Freeze configurations live at account, organization, or project scope
//! and come in two types: **manual** freezes are explicitly authored rules
//! with time windows and entity matching; the **global** freeze is a single
//! scope-wide switch per level under a reserved identifier. The evaluator
//! queries every applicable scope level, applies temporal and entity-rule
//! matching, and returns the union of everything blocking — never
//! short-circuiting, so operators see every concurrently-active block.

pub mod errors;
pub mod evaluator;
pub mod recorder;
pub mod registry;
pub mod types;
pub mod window;

pub use errors::FreezeError;
pub use evaluator::{entity_config_matches, freeze_matches, rule_matches, FreezeEvaluator};
pub use recorder::FrozenExecutionRecorder;
pub use registry::{FreezeRegistry, InMemoryFreezeRegistry};
pub use types::{
    EntityConfig, EntityMap, FilterType, FreezeConfig, FreezeEntityRule, FreezeEntityType,
    FreezeScope, FreezeStatus, FreezeSummary, FreezeType, FreezeWindow, FrozenExecution,
    Recurrence, RecurrencePattern, WindowEnd,
};
pub use window::{next_iteration, upcoming_occurrences, window_active_at, WindowOccurrence};
