//! Ambient health-check infrastructure (§4.1 "SYSTEM agent"): process,
//! port, disk, and memory checks usable as scenario steps.

pub mod agent;
pub mod checks;
pub mod config;

pub use agent::SystemAgent;
pub use checks::{check_disk_space, check_memory, check_port, check_process, CheckStatus, SystemCheckResult};
pub use config::SystemAgentConfig;
