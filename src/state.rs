//! Application State
//!
//! Shared state for one process: the settings file, the session registry and
//! the model provider.

use std::sync::Arc;

use clausewise_llm::{AnthropicProvider, LlmProvider, ProviderConfig};
use tokio::sync::RwLock;

use crate::models::settings::{AnalysisSettings, SettingsUpdate};
use crate::services::analysis::AnalysisService;
use crate::services::registry::DocumentRegistry;
use crate::storage::ConfigService;
use crate::utils::error::{AppError, AppResult};

/// Environment variable holding the Anthropic API key
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Application state shared across requests
#[derive(Clone)]
pub struct AppState {
    /// Configuration service for analysis settings
    config: Arc<RwLock<ConfigService>>,
    /// Pending sessions
    registry: DocumentRegistry,
    provider: Arc<dyn LlmProvider>,
}

impl AppState {
    /// Create state around an existing config service and provider
    pub fn new(config: ConfigService, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            registry: DocumentRegistry::new(),
            provider,
        }
    }

    /// Load settings from disk and build the Anthropic provider.
    ///
    /// The API key is read from the environment; a missing key surfaces as an
    /// error event on the first analysis rather than here.
    pub fn initialize() -> AppResult<Self> {
        let config = ConfigService::new()?;
        let provider = Self::build_provider(config.get_config())?;
        Ok(Self::new(config, provider))
    }

    /// Build the provider described by `settings`
    pub fn build_provider(settings: &AnalysisSettings) -> AppResult<Arc<dyn LlmProvider>> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("{} is not set; analyses will fail", API_KEY_ENV);
        }

        let provider_config = ProviderConfig {
            api_key,
            base_url: settings.base_url.clone(),
            connect_timeout_secs: settings.connect_timeout_secs,
        };
        let provider = AnthropicProvider::new(provider_config)?;
        Ok(Arc::new(provider))
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    /// Get a copy of the current settings
    pub async fn get_config(&self) -> AnalysisSettings {
        self.config.read().await.get_config_clone()
    }

    /// Validate, apply and persist a settings update
    pub async fn update_config(&self, update: SettingsUpdate) -> AppResult<AnalysisSettings> {
        let mut config = self.config.write().await;
        config.update_config(update)
    }

    /// Analysis service over the current settings.
    ///
    /// Sessions created through any returned service share this state's
    /// registry.
    pub async fn analysis_service(&self) -> AnalysisService {
        let settings = self.get_config().await;
        AnalysisService::new(
            self.registry.clone(),
            Arc::clone(&self.provider),
            settings,
        )
    }

    /// Replace the provider, e.g. after the base URL changed
    pub async fn rebuild_provider(&mut self) -> AppResult<()> {
        let settings = self.get_config().await;
        self.provider = Self::build_provider(&settings)
            .map_err(|e| AppError::config(format!("Failed to rebuild provider: {}", e)))?;
        Ok(())
    }
}
