//! Clausewise Core
//!
//! Foundational error types and the canonical stream event vocabulary for the
//! Clausewise workspace. This crate has no dependencies on the LLM provider
//! code or the application crate.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `streaming` - Canonical stream events, worker labels and the adapter trait

pub mod error;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::{AdapterError, EventPayload, StreamAdapter, StreamEvent, WorkerLabel};
