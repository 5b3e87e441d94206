//! Provider API client modules
//!
//! This module wraps the DigitalOcean REST API:
//! - context: shared HTTP client and single classified attempts
//! - retry: per-operation retry policies and the retry driver
//! - error: response classification and the provider error taxonomy
//! - reserved_ips / droplets: endpoint methods on [`DigitalOceanClient`]
//! - operations: the mockable [`ReservedIpOperations`] seam
//! - accounts: concurrent listing across all accounts

pub mod accounts;
mod client;
pub mod context;
mod droplets;
pub mod error;
pub mod operations;
mod reserved_ips;
pub mod retry;

pub use accounts::{AccountOutcome, AccountResult, AccountResults, fetch_all_accounts};
pub use client::DigitalOceanClient;
pub use error::{ProviderError, classify_response};
pub use operations::{DeleteOutcome, ReservedIpOperations};
pub use retry::{AttemptOutcome, Backoff, RetryPolicies, RetryPolicy};

#[cfg(test)]
pub use operations::MockReservedIpOperations;
