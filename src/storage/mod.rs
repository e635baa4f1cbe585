//! Storage Layer
//!
//! Handles persistence of the JSON analysis config.

pub mod config;

pub use config::*;
