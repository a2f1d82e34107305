//! # Ingestion Core
//!
//! The control plane: window policy, per-run context, the orchestrating
//! job state machine, the method handler registry, and the cron scheduler.

pub mod context;
pub mod job;
pub mod methods;
pub mod registry;
pub mod scheduler;
pub mod window;

pub use context::RunContext;
pub use job::{ExecutionOutcome, IngestionJob, TriggerRequest};
pub use registry::{MethodHandler, MethodRegistry};
pub use scheduler::IngestionScheduler;
pub use window::WindowPolicy;
