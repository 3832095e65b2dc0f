//! The HTTP/API request subsystem (§4.2): retrying client, auth, header
//! masking, response validation contracts, and the `ApiAgent` that wires
//! them into the step-action dispatch table.

pub mod agent;
pub mod auth;
pub mod client;
pub mod config;
pub mod history;
pub mod masking;
pub mod performance;
pub mod retry;
pub mod validation;

pub use agent::ApiAgent;
pub use client::{HttpClient, HttpMethod};
pub use config::{
    AuthConfig, HttpAgentConfig, LoggingConfig, PerformanceConfig, PerformanceThresholds,
    RetryConfig, ValidationConfig,
};
pub use history::{HttpRequestRecord, HttpResponseRecord, RequestHistory};
