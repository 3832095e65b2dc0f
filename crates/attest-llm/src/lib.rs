//! The `COMPREHENSION`/LLM agent contract (§6 "LLM contract"): a single
//! chat-completion request/response shape, a client trait, and a
//! deterministic in-memory fake — no vendor-specific wire format.

pub mod agent;
pub mod client;
pub mod extract;
pub mod types;

pub use agent::ComprehensionAgent;
pub use client::{ChatCompletionClient, FakeChatCompletionClient};
pub use extract::extract_first_json_object;
pub use types::{ChatRequest, ChatResponse, ChatUsage};
