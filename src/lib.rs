#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Rollout Core
//!
//! Continuous-delivery orchestration core: a typed, resumable step execution
//! state machine for deployment actions, and a freeze evaluation engine that
//! decides whether an execution may proceed.
//!
//! ## Architecture
//!
//! The engine is split into two tightly-coupled subsystems:
//!
//! - **Step execution**: deployment actions (platform setup, resize,
//!   route map/unmap/swap, and their rollback counterparts) run through a
//!   single shared lifecycle. Synchronous steps return a terminal status
//!   directly; asynchronous steps dispatch a work unit to a remote worker,
//!   persist a [`steps::StateExecutionData`] snapshot, and are resumed by the
//!   [`execution::ResponseCorrelator`] when the worker's result arrives.
//! - **Freeze evaluation**: hierarchical (account → org → project)
//!   resolution of freeze configurations with temporal matching, recurrence,
//!   and entity-rule matching. The pipeline scheduler consults
//!   [`freeze::FreezeEvaluator::is_blocked`] before driving steps.
//!
//! ## Module Organization
//!
//! - [`execution`] - Execution context, artifact store, dispatcher, correlator
//! - [`steps`] - Step state machine, worker requests, instance count resolver
//! - [`freeze`] - Freeze configuration types, registry, evaluator, recorder
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rollout_core::execution::{ExecutionContext, SweepingOutputStore};
//! use rollout_core::freeze::{FreezeEvaluator, InMemoryFreezeRegistry};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(InMemoryFreezeRegistry::new());
//! let evaluator = FreezeEvaluator::new(registry);
//!
//! let blocking = evaluator
//!     .is_blocked("acct", Some("org"), Some("proj"), Some("pipe"), &HashMap::new())
//!     .await?;
//! if blocking.is_empty() {
//!     // clear to deploy
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod execution;
pub mod freeze;
pub mod logging;
pub mod steps;

pub use config::{DispatcherConfig, ExecutionConfig, FreezeGateConfig, RolloutConfig};
pub use engine::RolloutEngine;
pub use constants::{system, GLOBAL_FREEZE_IDENTIFIER};
pub use error::{Result, RolloutError};
pub use execution::{
    ActivityStatus, ActivityStore, DelegateDispatcher, ExecutionContext, ExecutionResponse,
    ExecutionStatus, QueuedDispatcher, ResponseCorrelator, SweepingOutputStore, SweepingScope,
};
pub use freeze::{FreezeEvaluator, FreezeRegistry, FrozenExecutionRecorder, InMemoryFreezeRegistry};
pub use steps::{
    resolve_instance_count, FacilitationMode, InstanceUnit, ResizeDirection, Step, StepAction,
};
