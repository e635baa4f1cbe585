//! LLM Types
//!
//! Request, configuration and error types shared by all providers.

use serde::{Deserialize, Serialize};

/// Smallest reasoning budget the Messages API accepts.
pub const MIN_THINKING_BUDGET: u32 = 1024;

/// Connection settings for a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (read from the environment, never persisted)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL override (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    15
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// One streaming model invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Model identifier
    pub model: String,
    /// System instruction
    pub system: String,
    /// Single user message carrying the document
    pub user_message: String,
    /// Output/reasoning budget in tokens
    pub max_tokens: u32,
    /// Request extended reasoning
    #[serde(default)]
    pub enable_thinking: bool,
}

impl ModelRequest {
    pub fn new(
        model: impl Into<String>,
        system: impl Into<String>,
        user_message: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user_message: user_message.into(),
            max_tokens,
            enable_thinking: false,
        }
    }

    /// Builder: request extended reasoning.
    pub fn with_thinking(mut self, enabled: bool) -> Self {
        self.enable_thinking = enabled;
        self
    }

    /// Reasoning share of the budget.
    ///
    /// Half of `max_tokens` goes to reasoning so the visible output keeps the
    /// other half. `None` when reasoning is off or the budget is too small
    /// to leave room for both.
    pub fn thinking_budget(&self) -> Option<u32> {
        if !self.enable_thinking {
            return None;
        }
        let budget = self.max_tokens / 2;
        if budget < MIN_THINKING_BUDGET {
            None
        } else {
            Some(budget)
        }
    }
}

/// Token usage reported by a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors that can occur when talking to a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LlmError {
    /// Authentication failed (invalid API key)
    AuthenticationFailed { message: String },
    /// Rate limit exceeded
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },
    /// Model not found or not available
    ModelNotFound { model: String },
    /// Invalid request (bad parameters)
    InvalidRequest { message: String },
    /// Server error from the provider
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// Network/connection error
    NetworkError { message: String },
    /// Response parsing error
    ParseError { message: String },
    /// Other error
    Other { message: String },
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            LlmError::RateLimited { message, .. } => {
                write!(f, "Rate limited: {}", message)
            }
            LlmError::ModelNotFound { model } => {
                write!(f, "Model not found: {}", model)
            }
            LlmError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
            LlmError::ServerError { message, status } => {
                if let Some(s) = status {
                    write!(f, "Server error ({}): {}", s, message)
                } else {
                    write!(f, "Server error: {}", message)
                }
            }
            LlmError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            LlmError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            LlmError::Other { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for LlmError {}

/// Result type alias for provider calls
pub type LlmResult<T> = Result<T, LlmError>;
