//! Data Models
//!
//! Contains the data structures shared by the analysis services.

pub mod clause;
pub mod session;
pub mod settings;

pub use clause::*;
pub use session::*;
pub use settings::*;
