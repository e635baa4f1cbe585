//! Services
//!
//! Business logic: the session registry, the streaming analysis pipeline and
//! the clause parser.

pub mod analysis;
pub mod clauses;
pub mod registry;

pub use analysis::{AnalysisReport, AnalysisService, AnalysisStream};
pub use registry::{DocumentRegistry, SessionLease};
