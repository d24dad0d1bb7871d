//! # Deployment Steps
//!
//! The step execution state machine: a closed set of deployment actions
//! sharing one lifecycle, differing only in how each builds its outbound
//! worker request. Synchronous steps run `CREATED → RUNNING → TERMINAL`;
//! asynchronous and task steps suspend at `AWAITING_ASYNC` and are resumed
//! by the response correlator.
//!
//! Rollback actions are paired 1:1 with a forward action: they read the
//! forward step's recorded sweeping output, invert it (swap previous and
//! desired quantities, map ↔ unmap, un-swap routes), and reuse the shared
//! lifecycle unchanged.

pub mod errors;
pub mod executor;
pub mod instance_count;
pub mod outcomes;
pub mod request;
pub mod state_data;
pub mod step;

pub use errors::StepError;
pub use executor::StepExecutor;
pub use instance_count::{resolve_instance_count, InstanceUnit, ResizeDirection};
pub use outcomes::{ResizeOutcome, SetupOutcome, SwapRoutesOutcome};
pub use request::WorkerRequest;
pub use state_data::StateExecutionData;
pub use step::{
    FacilitationMode, InstanceTarget, ResizeParams, RouteUpdateParams, SetupParams, Step,
    StepAction, StepActionKind, SwapRoutesParams,
};
