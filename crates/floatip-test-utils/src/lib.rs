//! Shared test utilities for floatip
//!
//! This crate provides common test helpers that can be used across
//! multiple test modules without circular dependencies.
//!
//! ## Modules
//!
//! - [`fleet`]: Sample credentials and machine configurations
//! - [`fixtures`]: Provider API response bodies

pub mod fixtures;
pub mod fleet;

// Re-export commonly used items
pub use fixtures::{reserved_ip, reserved_ip_on};
pub use fleet::{TEST_DROPLET_ID, TEST_MACHINE, sample_fleet, sample_fleet_json, test_token};
