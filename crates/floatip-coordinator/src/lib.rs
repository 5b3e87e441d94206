//! floatip-coordinator - Reserved IP orchestration across provider accounts
//!
//! This crate provides the provider client, the short-lived listing cache,
//! the multi-account aggregator and the reserved IP replace workflow, plus the
//! `floatip` operator binary built on top of them.

pub mod cache;
pub mod config;
pub mod locator;
pub mod provider;
pub mod replace;
pub mod service;
pub mod summary;
pub mod wait;

pub use service::{ReservedIpService, ServiceError};
