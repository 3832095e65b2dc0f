use thiserror::Error;

/// Structured error kinds shared across every agent and subsystem.
///
/// Matches the error-kind taxonomy of the orchestration contract: each
/// variant is a classification an orchestrator or triage consumer can
/// match on, while the `Display` text stays close to conventional
/// `bail!`-style human-readable messages.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("config error: {0}")]
    Config(String),

    #[error("initialization error: {0}")]
    Initialization(String),

    #[error("action error: {0}")]
    Action(String),

    #[error("timeout error: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("cancelled")]
    Cancelled,

    #[error("no response error: {0}")]
    NoResponse(String),

    #[error("invalid schema error: {0}")]
    InvalidSchema(String),

    #[error("not initialized: {0}")]
    NotInitialized(String),
}

impl AgentError {
    pub fn action(message: impl Into<String>) -> Self {
        Self::Action(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization(message.into())
    }

    /// The `error` string attached to a `StepResult`; callers match
    /// substrings against this (e.g. tests assert `"Unsupported"` or
    /// `"ActionError"` appear for unsupported actions).
    pub fn step_error_text(&self) -> String {
        match self {
            Self::Action(message) => format!("ActionError: {message}"),
            Self::Timeout(message) => format!("TimeoutError: {message}"),
            Self::Transport(message) => format!("TransportError: {message}"),
            Self::Validation(message) => format!("ValidationError: {message}"),
            Self::Cancelled => "Cancelled".to_string(),
            Self::NoResponse(message) => format!("NoResponseError: {message}"),
            Self::InvalidSchema(message) => format!("InvalidSchemaError: {message}"),
            Self::NotInitialized(message) => format!("NotInitialized: {message}"),
            Self::Initialization(message) => format!("InitializationError: {message}"),
            Self::Config(message) => format!("ConfigError: {message}"),
        }
    }

    pub fn unsupported_action(action: &str) -> Self {
        Self::Action(format!("Unsupported action '{action}'"))
    }
}
