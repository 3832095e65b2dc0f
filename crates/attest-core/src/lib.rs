//! Foundational types shared by every agent and orchestrator crate: the
//! scenario data model, the `Agent` contract and execution template, the
//! error-kind taxonomy, cooperative cancellation, and small atomic-I/O and
//! time utilities.

pub mod agent;
pub mod atomic_io;
pub mod cancellation;
pub mod config;
pub mod contract;
pub mod error;
pub mod model;
pub mod time_utils;

pub use agent::{execute_scenario, Agent, AgentState};
pub use atomic_io::write_text_atomic;
pub use cancellation::CancellationToken;
pub use error::AgentError;
pub use time_utils::{current_unix_timestamp, current_unix_timestamp_ms, is_expired_unix};
