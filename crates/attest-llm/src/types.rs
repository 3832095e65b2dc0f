//! Provider-agnostic chat-completion request/response shapes for the
//! `COMPREHENSION` agent (§6 "LLM contract"), generalized from the
//! teacher's `tau-ai::types::ChatRequest`/`ChatResponse` down to the single
//! wire shape the orchestrator actually needs: a system/user prompt pair
//! returning a text payload, with no vendor-specific fields.

use serde::{Deserialize, Serialize};

fn default_temperature() -> f32 {
    0.0
}

fn default_max_tokens() -> u32 {
    1_024
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub system: String,
    pub user: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub text: String,
    #[serde(default)]
    pub usage: ChatUsage,
}
