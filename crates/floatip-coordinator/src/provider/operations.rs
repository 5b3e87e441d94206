//! Provider operations trait for testing

use super::client::DigitalOceanClient;
use super::error::ProviderError;
use floatip_common::{ActionResult, Credential, Droplet, ReservedIp};
use serde::Serialize;

/// Accepted result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The provider removed the IP (204)
    Deleted,
    /// The IP did not exist (404)
    AlreadyGone,
}

/// Trait for provider operations that can be mocked in tests.
///
/// This trait abstracts the provider client so the locator, aggregator and
/// replace workflow can be tested without a live API.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait ReservedIpOperations: Send + Sync {
    /// List the account's reserved IPs
    async fn list_reserved_ips(
        &self,
        credential: &Credential,
        use_cache: bool,
    ) -> Result<Vec<ReservedIp>, ProviderError>;

    /// Create a reserved IP bound to a droplet
    async fn create_reserved_ip(
        &self,
        credential: &Credential,
        droplet_id: u64,
    ) -> Result<ReservedIp, ProviderError>;

    /// Delete a reserved IP; a missing IP is accepted
    async fn delete_reserved_ip(
        &self,
        credential: &Credential,
        ip: &str,
    ) -> Result<DeleteOutcome, ProviderError>;

    /// Bind an existing reserved IP to a droplet
    async fn assign_reserved_ip(
        &self,
        credential: &Credential,
        ip: &str,
        droplet_id: u64,
    ) -> Result<ActionResult, ProviderError>;

    /// Release a reserved IP from its droplet
    async fn unassign_reserved_ip(
        &self,
        credential: &Credential,
        ip: &str,
    ) -> Result<ActionResult, ProviderError>;

    /// List the account's droplets that have a public IPv4
    async fn list_droplets(
        &self,
        credential: &Credential,
        use_cache: bool,
    ) -> Result<Vec<Droplet>, ProviderError>;

    /// First IPv4 address of a droplet
    async fn droplet_public_ip(
        &self,
        credential: &Credential,
        droplet_id: u64,
    ) -> Result<Option<String>, ProviderError>;
}

impl ReservedIpOperations for DigitalOceanClient {
    async fn list_reserved_ips(
        &self,
        credential: &Credential,
        use_cache: bool,
    ) -> Result<Vec<ReservedIp>, ProviderError> {
        let ips = DigitalOceanClient::list_reserved_ips(self, credential, use_cache).await?;
        Ok(ips.as_ref().clone())
    }

    async fn create_reserved_ip(
        &self,
        credential: &Credential,
        droplet_id: u64,
    ) -> Result<ReservedIp, ProviderError> {
        DigitalOceanClient::create_reserved_ip(self, credential, droplet_id).await
    }

    async fn delete_reserved_ip(
        &self,
        credential: &Credential,
        ip: &str,
    ) -> Result<DeleteOutcome, ProviderError> {
        DigitalOceanClient::delete_reserved_ip(self, credential, ip).await
    }

    async fn assign_reserved_ip(
        &self,
        credential: &Credential,
        ip: &str,
        droplet_id: u64,
    ) -> Result<ActionResult, ProviderError> {
        DigitalOceanClient::assign_reserved_ip(self, credential, ip, droplet_id).await
    }

    async fn unassign_reserved_ip(
        &self,
        credential: &Credential,
        ip: &str,
    ) -> Result<ActionResult, ProviderError> {
        DigitalOceanClient::unassign_reserved_ip(self, credential, ip).await
    }

    async fn list_droplets(
        &self,
        credential: &Credential,
        use_cache: bool,
    ) -> Result<Vec<Droplet>, ProviderError> {
        let droplets = DigitalOceanClient::list_droplets(self, credential, use_cache).await?;
        Ok(droplets.as_ref().clone())
    }

    async fn droplet_public_ip(
        &self,
        credential: &Credential,
        droplet_id: u64,
    ) -> Result<Option<String>, ProviderError> {
        DigitalOceanClient::droplet_public_ip(self, credential, droplet_id).await
    }
}
