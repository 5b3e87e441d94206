//! floatip-common - Shared types and utilities
//!
//! This crate provides the data model shared by the coordinator library, the
//! CLI and the test helpers, without any HTTP dependencies.
//!
//! ## Modules
//!
//! - [`credential`]: Account keys and bearer credentials
//! - [`defaults`]: Default configuration values and provider constants
//! - [`droplet`]: Droplet (compute instance) records
//! - [`error`]: Configuration errors
//! - [`fleet`]: Static machine/credential configuration and its loader
//! - [`reserved_ip`]: Reserved IP records and action results

pub mod credential;
pub mod defaults;
pub mod droplet;
pub mod error;
pub mod fleet;
pub mod reserved_ip;

// Re-export commonly used types
pub use credential::{AccountKey, Credential};
pub use droplet::Droplet;
pub use error::ConfigError;
pub use fleet::{FleetConfig, MachineConfig};
pub use reserved_ip::{ActionResult, AttachedDroplet, Region, ReservedIp};
