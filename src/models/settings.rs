//! Settings Models
//!
//! Analysis configuration stored in config.json.

use serde::{Deserialize, Serialize};

/// Analysis configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Messages API base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model for the fast identification worker
    pub fast_model: String,
    /// Model for the slow card worker (and comparison worker)
    pub slow_model: String,
    /// Token budget of the fast worker
    pub fast_max_tokens: u32,
    /// Request extended reasoning from the slow worker
    pub enable_thinking: bool,
    /// Capacity of the shared worker channel
    pub channel_capacity: usize,
    /// Orchestrator poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Abort a session after this many seconds without worker messages
    pub idle_timeout_secs: u64,
    /// TCP connect timeout for provider requests
    pub connect_timeout_secs: u64,
    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Phase detector window capacity in characters
    #[serde(default = "default_window_capacity")]
    pub phase_window_capacity: usize,
    /// Characters kept when the phase window is trimmed
    #[serde(default = "default_window_tail")]
    pub phase_window_tail: usize,
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_window_capacity() -> usize {
    300
}

fn default_window_tail() -> usize {
    150
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            fast_model: "claude-3-5-haiku-latest".to_string(),
            slow_model: "claude-sonnet-4-20250514".to_string(),
            fast_max_tokens: 4096,
            enable_thinking: true,
            channel_capacity: 256,
            poll_interval_ms: 500,
            idle_timeout_secs: 120,
            connect_timeout_secs: 15,
            log_filter: default_log_filter(),
            phase_window_capacity: default_window_capacity(),
            phase_window_tail: default_window_tail(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub base_url: Option<String>,
    pub fast_model: Option<String>,
    pub slow_model: Option<String>,
    pub fast_max_tokens: Option<u32>,
    pub enable_thinking: Option<bool>,
    pub poll_interval_ms: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub log_filter: Option<String>,
}

impl AnalysisSettings {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(base_url) = update.base_url {
            self.base_url = if base_url.trim().is_empty() {
                None
            } else {
                Some(base_url)
            };
        }
        if let Some(model) = update.fast_model {
            self.fast_model = model;
        }
        if let Some(model) = update.slow_model {
            self.slow_model = model;
        }
        if let Some(tokens) = update.fast_max_tokens {
            self.fast_max_tokens = tokens;
        }
        if let Some(enabled) = update.enable_thinking {
            self.enable_thinking = enabled;
        }
        if let Some(interval) = update.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        if let Some(timeout) = update.idle_timeout_secs {
            self.idle_timeout_secs = timeout;
        }
        if let Some(filter) = update.log_filter {
            self.log_filter = filter;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.fast_model.trim().is_empty() || self.slow_model.trim().is_empty() {
            return Err("fast_model and slow_model must be set".to_string());
        }

        if self.fast_max_tokens == 0 {
            return Err("fast_max_tokens must be positive".to_string());
        }

        if self.channel_capacity == 0 {
            return Err("channel_capacity must be positive".to_string());
        }

        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be positive".to_string());
        }

        if self.idle_timeout_secs * 1000 < self.poll_interval_ms {
            return Err("idle_timeout_secs must cover at least one poll interval".to_string());
        }

        if self.phase_window_tail == 0 || self.phase_window_tail >= self.phase_window_capacity {
            return Err(format!(
                "phase_window_tail ({}) must be between 1 and phase_window_capacity ({})",
                self.phase_window_tail, self.phase_window_capacity
            ));
        }

        Ok(())
    }
}
