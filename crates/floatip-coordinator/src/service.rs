//! Reserved IP service facade
//!
//! `ReservedIpService` owns the fleet configuration, the provider operations,
//! the shared listing cache and the replace lock registry, and exposes every
//! operation the CLI needs.

use std::sync::Arc;
use std::time::Instant;

use floatip_common::{
    AccountKey, ActionResult, ConfigError, Credential, Droplet, FleetConfig, ReservedIp,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::{CacheStatus, ResponseCache};
use crate::config::{ProviderConfig, ReplaceConfig};
use crate::locator::{MachineTarget, find_owning_account, machine_info};
use crate::provider::{
    AccountResults, DeleteOutcome, DigitalOceanClient, ProviderError, ReservedIpOperations,
    fetch_all_accounts,
};
use crate::replace::{ReplaceError, ReplaceLocks, ReplaceReport, ReplaceWorkflow};
use crate::summary::{
    AccountReservedIp, AccountsOverview, DeletedIp, DropletInfo, IpLocation, MachineSummary,
    QuotaInfo,
};

/// Errors from service operations other than replace
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Reserved IP {ip} does not belong to any configured account (searched: {})", format_accounts(.searched))]
    IpNotFound { ip: String, searched: Vec<AccountKey> },

    #[error("Droplet {droplet_id} of machine '{machine}' not found in account {account}")]
    DropletNotFound {
        machine: String,
        droplet_id: u64,
        account: AccountKey,
    },
}

fn format_accounts(accounts: &[AccountKey]) -> String {
    accounts
        .iter()
        .map(AccountKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ServiceError {
    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ServiceError::Provider(e) => e.suggestion(),
            ServiceError::IpNotFound { .. } => {
                Some("Check the IP address, or whether it has already been deleted.")
            }
            _ => None,
        }
    }
}

/// Droplet matched by IP or id
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FoundDroplet {
    pub name: String,
    pub id: u64,
}

/// Entry point for all reserved IP operations
pub struct ReservedIpService<O> {
    ops: O,
    fleet: Arc<FleetConfig>,
    cache: Arc<ResponseCache>,
    locks: ReplaceLocks,
    replace: ReplaceConfig,
}

impl<O> std::fmt::Debug for ReservedIpService<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservedIpService")
            .field("machines", &self.fleet.machine_names())
            .field("cache", &self.cache.status())
            .finish_non_exhaustive()
    }
}

impl ReservedIpService<DigitalOceanClient> {
    /// Build a service talking to the provider API
    pub fn connect(fleet: FleetConfig, provider: &ProviderConfig) -> Result<Self, ProviderError> {
        let cache = Arc::new(ResponseCache::new(provider.cache_ttl));
        let client = DigitalOceanClient::with_cache(provider, cache.clone())?;
        Ok(Self::new(client, fleet, cache))
    }
}

impl<O: ReservedIpOperations> ReservedIpService<O> {
    /// Wrap an operations implementation. `cache` should be the one `ops` reads from.
    pub fn new(ops: O, fleet: FleetConfig, cache: Arc<ResponseCache>) -> Self {
        Self {
            ops,
            fleet: Arc::new(fleet),
            cache,
            locks: ReplaceLocks::new(),
            replace: ReplaceConfig::default(),
        }
    }

    pub fn with_replace_config(mut self, replace: ReplaceConfig) -> Self {
        self.replace = replace;
        self
    }

    pub fn fleet(&self) -> &FleetConfig {
        &self.fleet
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    pub fn locks(&self) -> &ReplaceLocks {
        &self.locks
    }

    fn credentials(&self) -> Vec<Credential> {
        self.fleet.credentials().cloned().collect()
    }

    /// Resolve an account selector (`do_token2` or `2`)
    pub fn credential(&self, selector: &str) -> Result<&Credential, ConfigError> {
        self.fleet.credential(&AccountKey::from_selector(selector))
    }

    pub fn machine(&self, name: &str) -> Result<MachineTarget, ConfigError> {
        machine_info(&self.fleet, name)
    }

    // Single-account operations

    pub async fn list_reserved_ips(
        &self,
        credential: &Credential,
        use_cache: bool,
    ) -> Result<Vec<ReservedIp>, ProviderError> {
        self.ops.list_reserved_ips(credential, use_cache).await
    }

    pub async fn create_reserved_ip(
        &self,
        credential: &Credential,
        droplet_id: u64,
    ) -> Result<ReservedIp, ProviderError> {
        self.ops.create_reserved_ip(credential, droplet_id).await
    }

    pub async fn delete_reserved_ip(
        &self,
        credential: &Credential,
        ip: &str,
    ) -> Result<DeleteOutcome, ProviderError> {
        self.ops.delete_reserved_ip(credential, ip).await
    }

    pub async fn assign(
        &self,
        credential: &Credential,
        ip: &str,
        droplet_id: u64,
    ) -> Result<ActionResult, ProviderError> {
        self.ops.assign_reserved_ip(credential, ip, droplet_id).await
    }

    pub async fn unassign(
        &self,
        credential: &Credential,
        ip: &str,
    ) -> Result<ActionResult, ProviderError> {
        self.ops.unassign_reserved_ip(credential, ip).await
    }

    pub async fn list_droplets(
        &self,
        credential: &Credential,
        use_cache: bool,
    ) -> Result<Vec<Droplet>, ProviderError> {
        self.ops.list_droplets(credential, use_cache).await
    }

    pub async fn droplet_public_ip(
        &self,
        credential: &Credential,
        droplet_id: u64,
    ) -> Result<Option<String>, ProviderError> {
        self.ops.droplet_public_ip(credential, droplet_id).await
    }

    /// Find a droplet by one of its public IPs or its id
    pub async fn find_droplet(
        &self,
        credential: &Credential,
        identifier: &str,
    ) -> Result<Option<FoundDroplet>, ProviderError> {
        let droplets = self.ops.list_droplets(credential, true).await?;
        Ok(droplets
            .into_iter()
            .find(|d| d.matches(identifier))
            .map(|d| FoundDroplet {
                name: d.name,
                id: d.id,
            }))
    }

    pub async fn quota(&self, credential: &Credential) -> Result<QuotaInfo, ProviderError> {
        let ips = self.ops.list_reserved_ips(credential, true).await?;
        Ok(QuotaInfo::from_reserved_ips(credential.key().clone(), &ips))
    }

    // Cross-account operations

    pub async fn fetch_all_accounts(&self, use_cache: bool) -> AccountResults {
        fetch_all_accounts(&self.ops, &self.credentials(), use_cache).await
    }

    pub fn machines(&self) -> Vec<MachineSummary> {
        MachineSummary::from_config(&self.fleet)
    }

    pub async fn all_reserved_ips(&self, use_cache: bool) -> Vec<AccountReservedIp> {
        let results = self.fetch_all_accounts(use_cache).await;
        AccountReservedIp::flatten(results.values())
    }

    pub async fn accounts_overview(&self, use_cache: bool) -> AccountsOverview {
        let start = Instant::now();
        let results = self.fetch_all_accounts(use_cache).await;
        AccountsOverview::build(
            &self.fleet,
            results,
            start.elapsed().as_secs_f64(),
            use_cache,
        )
    }

    /// Find the account owning `ip`, using cached listings when fresh
    async fn owning_account(
        &self,
        ip: &str,
    ) -> Result<(Credential, AccountResults), ServiceError> {
        let results = self.fetch_all_accounts(true).await;
        match find_owning_account(&self.fleet, ip, &results) {
            Some(credential) => Ok((credential.clone(), results)),
            None => Err(ServiceError::IpNotFound {
                ip: ip.to_string(),
                searched: results.keys().cloned().collect(),
            }),
        }
    }

    pub async fn locate_reserved_ip(&self, ip: &str) -> Result<IpLocation, ServiceError> {
        let (credential, results) = self.owning_account(ip).await?;
        let record = results
            .get(credential.key())
            .and_then(|r| r.reserved_ips().iter().find(|r| r.ip == ip))
            .ok_or_else(|| ServiceError::IpNotFound {
                ip: ip.to_string(),
                searched: results.keys().cloned().collect(),
            })?;
        Ok(IpLocation::new(&self.fleet, credential.key(), record))
    }

    /// Delete an IP with the credential of whichever account owns it
    pub async fn delete_by_ip(&self, ip: &str) -> Result<DeletedIp, ServiceError> {
        let (credential, _) = self.owning_account(ip).await?;
        info!(ip, account = %credential.key(), "Deleting reserved IP");
        let outcome = self.ops.delete_reserved_ip(&credential, ip).await?;
        Ok(DeletedIp {
            deleted_ip: ip.to_string(),
            used_token: credential.key().clone(),
            outcome,
        })
    }

    pub async fn unassign_ip(&self, ip: &str) -> Result<ActionResult, ServiceError> {
        let (credential, _) = self.owning_account(ip).await?;
        Ok(self.ops.unassign_reserved_ip(&credential, ip).await?)
    }

    // Machine-addressed operations

    pub async fn create_for_machine(&self, name: &str) -> Result<ReservedIp, ServiceError> {
        let target = self.machine(name)?;
        info!(
            machine = name,
            droplet_id = target.droplet_id,
            account = %target.credential.key(),
            "Creating reserved IP"
        );
        Ok(self
            .ops
            .create_reserved_ip(&target.credential, target.droplet_id)
            .await?)
    }

    /// Assign `ip` to a machine using the machine's account
    pub async fn assign_to_machine(
        &self,
        ip: &str,
        name: &str,
    ) -> Result<ActionResult, ServiceError> {
        let target = self.machine(name)?;
        Ok(self
            .ops
            .assign_reserved_ip(&target.credential, ip, target.droplet_id)
            .await?)
    }

    pub async fn machine_droplet_info(&self, name: &str) -> Result<DropletInfo, ServiceError> {
        let target = self.machine(name)?;
        let current_ip = self
            .ops
            .droplet_public_ip(&target.credential, target.droplet_id)
            .await?;
        let droplets = self.ops.list_droplets(&target.credential, true).await?;
        let droplet = droplets
            .into_iter()
            .find(|d| d.id == target.droplet_id)
            .ok_or_else(|| ServiceError::DropletNotFound {
                machine: name.to_string(),
                droplet_id: target.droplet_id,
                account: target.credential.key().clone(),
            })?;

        Ok(DropletInfo {
            name: droplet.name,
            id: droplet.id,
            ips: droplet.public_ips,
            current_ip,
            token_key: target.credential.key().clone(),
        })
    }

    /// Replace the reserved IP of a configured machine
    pub async fn replace_reserved_ip(
        &self,
        name: &str,
        cancel: CancellationToken,
    ) -> Result<ReplaceReport, ReplaceError> {
        let target = self.machine(name)?;
        ReplaceWorkflow::new(&self.ops, &self.replace, &self.locks, cancel)
            .run(&target)
            .await
    }

    // Cache

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Cache cleared");
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockReservedIpOperations;
    use floatip_common::MachineConfig;
    use std::time::Duration;

    fn fleet() -> FleetConfig {
        FleetConfig::new()
            .with_credential(AccountKey::from_index(1), "dop_v1_aaaaaaaaaaaa")
            .with_credential(AccountKey::from_index(2), "dop_v1_bbbbbbbbbbbb")
            .with_machine("edge", MachineConfig::new(101, AccountKey::from_index(2)))
    }

    fn ip(addr: &str) -> ReservedIp {
        serde_json::from_value(serde_json::json!({ "ip": addr })).unwrap()
    }

    fn service(ops: MockReservedIpOperations) -> ReservedIpService<MockReservedIpOperations> {
        ReservedIpService::new(
            ops,
            fleet(),
            Arc::new(ResponseCache::new(Duration::from_secs(30))),
        )
    }

    #[tokio::test]
    async fn delete_by_ip_uses_owning_account() {
        let mut ops = MockReservedIpOperations::new();
        ops.expect_list_reserved_ips().returning(|credential, use_cache| {
            assert!(use_cache);
            if credential.key().as_str() == "do_token2" {
                Ok(vec![ip("203.0.113.9")])
            } else {
                Ok(Vec::new())
            }
        });
        ops.expect_delete_reserved_ip()
            .withf(|credential, ip| credential.key().as_str() == "do_token2" && ip == "203.0.113.9")
            .times(1)
            .returning(|_, _| Ok(DeleteOutcome::Deleted));

        let deleted = service(ops).delete_by_ip("203.0.113.9").await.unwrap();
        assert_eq!(deleted.used_token.as_str(), "do_token2");
        assert_eq!(deleted.outcome, DeleteOutcome::Deleted);
    }

    #[tokio::test]
    async fn unknown_ip_lists_searched_accounts() {
        let mut ops = MockReservedIpOperations::new();
        ops.expect_list_reserved_ips()
            .returning(|_, _| Ok(Vec::new()));
        ops.expect_delete_reserved_ip().never();

        let err = service(ops).delete_by_ip("198.51.100.1").await.unwrap_err();
        match err {
            ServiceError::IpNotFound { searched, .. } => assert_eq!(searched.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn create_for_machine_uses_machine_account() {
        let mut ops = MockReservedIpOperations::new();
        ops.expect_create_reserved_ip()
            .withf(|credential, droplet_id| {
                credential.key().as_str() == "do_token2" && *droplet_id == 101
            })
            .times(1)
            .returning(|_, _| Ok(ip("203.0.113.20")));

        let created = service(ops).create_for_machine("edge").await.unwrap();
        assert_eq!(created.ip, "203.0.113.20");
    }

    #[tokio::test]
    async fn assign_to_machine_uses_machine_account() {
        let mut ops = MockReservedIpOperations::new();
        ops.expect_list_reserved_ips().never();
        ops.expect_assign_reserved_ip()
            .withf(|credential, ip, droplet_id| {
                credential.key().as_str() == "do_token2"
                    && ip == "203.0.113.9"
                    && *droplet_id == 101
            })
            .times(1)
            .returning(|_, _, droplet_id| {
                Ok(serde_json::from_value(
                    serde_json::json!({ "id": 31, "resource_id": droplet_id }),
                )
                .unwrap())
            });

        let action = service(ops)
            .assign_to_machine("203.0.113.9", "edge")
            .await
            .unwrap();
        assert_eq!(action.id, 31);
        assert_eq!(action.resource_id, Some(101));
    }

    #[tokio::test]
    async fn unassign_ip_uses_owning_account() {
        let mut ops = MockReservedIpOperations::new();
        ops.expect_list_reserved_ips().returning(|credential, _| {
            if credential.key().as_str() == "do_token2" {
                Ok(vec![ip("203.0.113.9")])
            } else {
                Ok(Vec::new())
            }
        });
        ops.expect_unassign_reserved_ip()
            .withf(|credential, ip| credential.key().as_str() == "do_token2" && ip == "203.0.113.9")
            .times(1)
            .returning(|_, _| {
                Ok(serde_json::from_value(serde_json::json!({ "id": 32, "type": "unassign_ip" }))
                    .unwrap())
            });

        let action = service(ops).unassign_ip("203.0.113.9").await.unwrap();
        assert_eq!(action.id, 32);
        assert_eq!(action.kind.as_deref(), Some("unassign_ip"));
    }

    #[tokio::test]
    async fn unassign_unknown_ip_makes_no_action() {
        let mut ops = MockReservedIpOperations::new();
        ops.expect_list_reserved_ips()
            .returning(|_, _| Ok(Vec::new()));
        ops.expect_unassign_reserved_ip().never();

        let err = service(ops).unassign_ip("198.51.100.1").await.unwrap_err();
        assert!(matches!(err, ServiceError::IpNotFound { .. }));
    }

    #[tokio::test]
    async fn unknown_machine_is_a_config_error() {
        let ops = MockReservedIpOperations::new();
        let err = service(ops).create_for_machine("nope").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Config(ConfigError::UnknownMachine { .. })
        ));
    }

    #[tokio::test]
    async fn droplet_info_combines_listing_and_current_ip() {
        let mut ops = MockReservedIpOperations::new();
        ops.expect_droplet_public_ip()
            .returning(|_, _| Ok(Some("192.0.2.1".to_string())));
        ops.expect_list_droplets().returning(|_, _| {
            Ok(vec![Droplet {
                id: 101,
                name: "edge".to_string(),
                public_ips: vec!["192.0.2.1".to_string(), "203.0.113.4".to_string()],
            }])
        });

        let info = service(ops).machine_droplet_info("edge").await.unwrap();
        assert_eq!(info.current_ip.as_deref(), Some("192.0.2.1"));
        assert_eq!(info.ips.len(), 2);
        assert_eq!(info.token_key.as_str(), "do_token2");
    }

    #[tokio::test]
    async fn find_droplet_by_ip_or_id() {
        let mut ops = MockReservedIpOperations::new();
        ops.expect_list_droplets().returning(|_, _| {
            Ok(vec![Droplet {
                id: 101,
                name: "edge".to_string(),
                public_ips: vec!["192.0.2.1".to_string()],
            }])
        });

        let service = service(ops);
        let credential = service.credential("2").unwrap().clone();
        let by_ip = service.find_droplet(&credential, "192.0.2.1").await.unwrap();
        assert_eq!(by_ip.unwrap().id, 101);
        let by_id = service.find_droplet(&credential, "101").await.unwrap();
        assert_eq!(by_id.unwrap().name, "edge");
        assert!(service.find_droplet(&credential, "10.0.0.1").await.unwrap().is_none());
    }
}
