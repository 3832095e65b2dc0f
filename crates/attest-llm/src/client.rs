//! The `ChatCompletionClient` contract (§6 "LLM contract") and a
//! deterministic in-memory fake used by tests and by scenario replay when no
//! real provider is configured — no vendor wire format, per Non-goals.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use attest_core::error::AgentError;

use crate::types::{ChatRequest, ChatResponse};

#[async_trait(?Send)]
pub trait ChatCompletionClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;
}

/// Replays a fixed queue of canned text responses, cycling back to the last
/// entry once exhausted. Never makes a network call.
pub struct FakeChatCompletionClient {
    responses: Mutex<VecDeque<String>>,
}

impl FakeChatCompletionClient {
    pub fn new(responses: impl IntoIterator<Item = String>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }

    pub fn constant(response: impl Into<String>) -> Self {
        Self::new([response.into()])
    }
}

#[async_trait(?Send)]
impl ChatCompletionClient for FakeChatCompletionClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let mut responses = self
            .responses
            .lock()
            .map_err(|_| AgentError::transport("fake chat client mutex poisoned"))?;
        let text = if responses.len() > 1 {
            responses.pop_front().unwrap_or_default()
        } else {
            responses.front().cloned().unwrap_or_default()
        };
        if text.is_empty() {
            return Err(AgentError::NoResponse(format!(
                "no canned response configured for prompt '{}'",
                request.user
            )));
        }
        Ok(ChatResponse {
            text,
            usage: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatCompletionClient, FakeChatCompletionClient};
    use crate::types::ChatRequest;

    #[tokio::test]
    async fn functional_constant_client_returns_same_response_every_call() {
        let client = FakeChatCompletionClient::constant("{\"ok\":true}");
        let request = ChatRequest::new("sys", "user");
        let first = client.complete(&request).await.expect("should complete");
        let second = client.complete(&request).await.expect("should complete");
        assert_eq!(first.text, second.text);
    }

    #[tokio::test]
    async fn regression_empty_queue_fails_with_no_response_error() {
        let client = FakeChatCompletionClient::new(Vec::<String>::new());
        let request = ChatRequest::new("sys", "user");
        let error = client.complete(&request).await.expect_err("should fail");
        assert!(matches!(error, attest_core::error::AgentError::NoResponse(_)));
    }

    #[tokio::test]
    async fn functional_multi_entry_queue_drains_in_order() {
        let client = FakeChatCompletionClient::new(vec!["first".to_string(), "second".to_string()]);
        let request = ChatRequest::new("sys", "user");
        let first = client.complete(&request).await.expect("should complete");
        let second = client.complete(&request).await.expect("should complete");
        assert_eq!(first.text, "first");
        assert_eq!(second.text, "second");
    }
}
