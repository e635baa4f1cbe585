//! Session Models
//!
//! Analysis sessions: the document payload and the configuration chosen for
//! one analysis request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::error::{AppError, AppResult};

/// Computation budget preset for the slow worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthPreset {
    Quick,
    #[default]
    Standard,
    Deep,
}

impl DepthPreset {
    /// Output/reasoning token ceiling passed to the slow worker.
    pub fn budget(&self) -> u32 {
        match self {
            DepthPreset::Quick => 16_000,
            DepthPreset::Standard => 32_000,
            DepthPreset::Deep => 64_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DepthPreset::Quick => "quick",
            DepthPreset::Standard => "standard",
            DepthPreset::Deep => "deep",
        }
    }
}

impl std::fmt::Display for DepthPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DepthPreset {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(DepthPreset::Quick),
            "standard" => Ok(DepthPreset::Standard),
            "deep" => Ok(DepthPreset::Deep),
            other => Err(AppError::validation(format!(
                "Unknown depth preset '{}'. Must be 'quick', 'standard', or 'deep'",
                other
            ))),
        }
    }
}

/// Whether a session analyzes one document or compares two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Single,
    Compare,
}

/// Reader-facing configuration of one analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// The reader's role in the agreement (e.g. "tenant", "contractor")
    pub role: String,
    /// How much room the reader has to negotiate
    pub negotiability: String,
    #[serde(default)]
    pub depth: DepthPreset,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            role: "signing party".to_string(),
            negotiability: "some".to_string(),
            depth: DepthPreset::default(),
        }
    }
}

/// One pending analysis, stored in the registry until its stream ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique session token
    pub id: String,
    /// Extracted document text
    pub document: String,
    /// Second document text (comparison mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_document: Option<String>,
    pub config: AnalysisConfig,
    pub mode: AnalysisMode,
}

impl SessionRecord {
    /// Create a single-document session.
    pub fn single(document: impl Into<String>, config: AnalysisConfig) -> AppResult<Self> {
        let document = document.into();
        if document.trim().is_empty() {
            return Err(AppError::validation("Document text is empty"));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            document,
            comparison_document: None,
            config,
            mode: AnalysisMode::Single,
        })
    }

    /// Create a two-document comparison session.
    pub fn comparison(
        first: impl Into<String>,
        second: impl Into<String>,
        config: AnalysisConfig,
    ) -> AppResult<Self> {
        let first = first.into();
        let second = second.into();
        if first.trim().is_empty() || second.trim().is_empty() {
            return Err(AppError::validation(
                "Comparison requires two non-empty documents",
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            document: first,
            comparison_document: Some(second),
            config,
            mode: AnalysisMode::Compare,
        })
    }
}
