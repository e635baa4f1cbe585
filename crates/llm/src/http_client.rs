//! HTTP Client Factory
//!
//! Builds the reqwest client shared by every invocation of a provider.

use std::time::Duration;

use crate::types::{LlmError, LlmResult, ProviderConfig};

/// Build a `reqwest::Client` for streaming requests.
///
/// Only the connect phase is bounded; an overall request timeout would cut
/// long reasoning streams short. Proxy environment variables are ignored.
pub fn build_http_client(config: &ProviderConfig) -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .no_proxy()
        .user_agent(concat!("clausewise/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| LlmError::Other {
            message: format!("failed to build HTTP client: {}", e),
        })
}
