//! # Execution Primitives
//!
//! Per-run execution context, the cross-step artifact store, activity
//! auditing, and the delegate dispatch / response correlation pair that
//! carries a step across its asynchronous suspension point.
//!
//! ## Architecture
//!
//! A step that returns `async = true` from `execute` has dispatched a
//! [`WorkUnit`] through a [`DelegateDispatcher`] and registered its
//! [`crate::steps::StateExecutionData`] with the [`ResponseCorrelator`].
//! The calling thread is released; resumption happens on the correlator's
//! thread of control when an inbound [`WorkerResult`] matches the pending
//! correlation id. Each resume is a single synchronous continuation.

pub mod activity;
pub mod context;
pub mod correlator;
pub mod dispatcher;
pub mod events;
pub mod response;
pub mod sweeping_output;

pub use activity::{ActivityError, ActivityRecord, ActivityStatus, ActivityStore};
pub use context::{ExecutionContext, ExpressionRenderer, RenderError};
pub use correlator::{CorrelationError, PendingExecution, ResponseCorrelator, WorkerResult};
pub use dispatcher::{CorrelationId, DelegateDispatcher, DispatchError, QueuedDispatcher, WorkUnit};
pub use events::{EventPublisher, PublishedEvent};
pub use response::{ExecutionResponse, ExecutionStatus};
pub use sweeping_output::{
    SweepingOutput, SweepingOutputError, SweepingOutputStore, SweepingScope,
};
