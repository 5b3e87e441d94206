//! Shared test utilities for integration tests
//!
//! Scripted provider for driving the replace workflow without HTTP.
//! Generic fixtures (sample fleet, response bodies) are in floatip-test-utils.

#![allow(dead_code)]

use floatip_common::{ActionResult, Credential, Droplet, ReservedIp};
use floatip_coordinator::provider::{DeleteOutcome, ProviderError, ReservedIpOperations};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

pub use floatip_test_utils::fixtures::{reserved_ip, reserved_ip_on};
pub use floatip_test_utils::{TEST_DROPLET_ID, TEST_MACHINE, sample_fleet};

/// One recorded provider call
#[derive(Debug, Clone)]
pub struct Call {
    pub op: &'static str,
    pub at: Instant,
}

/// Provider whose responses are queued up front.
///
/// Each queue is consumed in order; the last listing keeps being returned once
/// the queue is down to one entry. Deletes default to `Deleted`.
#[derive(Debug, Default)]
pub struct FakeProvider {
    listings: Mutex<VecDeque<Result<Vec<ReservedIp>, ProviderError>>>,
    creates: Mutex<VecDeque<Result<ReservedIp, ProviderError>>>,
    deletes: Mutex<VecDeque<Result<DeleteOutcome, ProviderError>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reserved IP listing
    pub fn listing(self, ips: Vec<ReservedIp>) -> Self {
        self.listing_result(Ok(ips))
    }

    pub fn listing_result(mut self, result: Result<Vec<ReservedIp>, ProviderError>) -> Self {
        self.listings.get_mut().unwrap().push_back(result);
        self
    }

    pub fn create(mut self, result: Result<ReservedIp, ProviderError>) -> Self {
        self.creates.get_mut().unwrap().push_back(result);
        self
    }

    pub fn delete(mut self, result: Result<DeleteOutcome, ProviderError>) -> Self {
        self.deletes.get_mut().unwrap().push_back(result);
        self
    }

    fn record(&self, op: &'static str) {
        self.calls.lock().unwrap().push(Call {
            op,
            at: Instant::now(),
        });
    }

    /// Instants at which `op` was called
    pub fn calls_to(&self, op: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.op == op)
            .map(|c| c.at)
            .collect()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls_to(op).len()
    }
}

fn unscripted(op: &str) -> ProviderError {
    ProviderError::Configuration {
        message: format!("{op} is not scripted"),
    }
}

impl ReservedIpOperations for FakeProvider {
    async fn list_reserved_ips(
        &self,
        _credential: &Credential,
        _use_cache: bool,
    ) -> Result<Vec<ReservedIp>, ProviderError> {
        self.record("list_reserved_ips");
        let mut listings = self.listings.lock().unwrap();
        match listings.len() {
            0 => Ok(Vec::new()),
            1 => listings[0].clone(),
            _ => listings.pop_front().unwrap(),
        }
    }

    async fn create_reserved_ip(
        &self,
        _credential: &Credential,
        _droplet_id: u64,
    ) -> Result<ReservedIp, ProviderError> {
        self.record("create_reserved_ip");
        self.creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("create_reserved_ip")))
    }

    async fn delete_reserved_ip(
        &self,
        _credential: &Credential,
        _ip: &str,
    ) -> Result<DeleteOutcome, ProviderError> {
        self.record("delete_reserved_ip");
        self.deletes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(DeleteOutcome::Deleted))
    }

    async fn assign_reserved_ip(
        &self,
        _credential: &Credential,
        _ip: &str,
        _droplet_id: u64,
    ) -> Result<ActionResult, ProviderError> {
        self.record("assign_reserved_ip");
        Err(unscripted("assign_reserved_ip"))
    }

    async fn unassign_reserved_ip(
        &self,
        _credential: &Credential,
        _ip: &str,
    ) -> Result<ActionResult, ProviderError> {
        self.record("unassign_reserved_ip");
        Err(unscripted("unassign_reserved_ip"))
    }

    async fn list_droplets(
        &self,
        _credential: &Credential,
        _use_cache: bool,
    ) -> Result<Vec<Droplet>, ProviderError> {
        self.record("list_droplets");
        Ok(Vec::new())
    }

    async fn droplet_public_ip(
        &self,
        _credential: &Credential,
        _droplet_id: u64,
    ) -> Result<Option<String>, ProviderError> {
        self.record("droplet_public_ip");
        Ok(None)
    }
}
