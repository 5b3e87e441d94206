//! Reserved IP replace workflow
//!
//! Deletes the reserved IP bound to a machine and creates a new one, confirming
//! each step by polling the provider.

mod engine;
pub mod error;
pub mod lock;
pub mod types;

pub use engine::ReplaceWorkflow;
pub use error::ReplaceError;
pub use lock::{ReplaceLease, ReplaceLocks};
pub use types::{ReplacePhase, ReplaceReport};
