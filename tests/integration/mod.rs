//! Integration Tests Module
//!
//! End-to-end tests for Clausewise: dual-stream orchestration against
//! scripted providers, the analysis service session lifecycle, and clause
//! parsing of realistic model output.

// Scripted provider and helpers
mod common;

// Dual-stream ordering, errors, timeouts and disconnects
mod orchestrator_test;

// Session registration, streaming and reports
mod service_test;

// Identification, card and claims parsing
mod clause_parser_test;
