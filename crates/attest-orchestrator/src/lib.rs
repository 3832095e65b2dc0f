//! The scenario orchestrator (§4.4): a bounded worker pool that runs a
//! scenario set to a single `TestSession`, honouring prerequisite gating,
//! per-scenario retries and timeouts, and a configurable cancel-on-failure
//! policy.

pub mod config;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod timeout;
pub mod triage;

pub use config::OrchestratorConfig;
pub use registry::{build_agent, primary_role};
pub use retry::run_with_retries;
pub use scheduler::Orchestrator;
pub use session::{SessionSummary, TestSession};
pub use timeout::{run_attempt, AttemptOutcome};
pub use triage::TriagePipeline;
