//! Clausewise - Contract Analysis Backend
//!
//! Streams a contract through two concurrent model workers and emits one
//! ordered SSE event stream. It includes:
//! - Session registry and dual-stream orchestration
//! - Phase detection and SSE encoding
//! - Clause parsing of the completed model output
//! - Storage layer (JSON config) and utilities

pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::clause::{ClauseRecord, GreenClause, RiskAssessment, RiskTier, TrickCategory};
pub use models::session::{AnalysisConfig, AnalysisMode, DepthPreset, SessionRecord};
pub use models::settings::{AnalysisSettings, SettingsUpdate};
pub use services::analysis::{AnalysisReport, AnalysisService, AnalysisStream};
pub use services::registry::DocumentRegistry;
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
