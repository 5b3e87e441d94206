//! Read-only views over configuration and provider listings

use crate::provider::{AccountResult, DeleteOutcome};
use floatip_common::defaults::ESTIMATED_RESERVED_IP_LIMIT;
use floatip_common::{AccountKey, FleetConfig, MachineConfig, ReservedIp};
use serde::Serialize;
use std::collections::BTreeMap;
use strum::Display;

/// A configured machine and whether its account can be used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineSummary {
    pub name: String,
    pub id: u64,
    pub description: String,
    pub token_key: AccountKey,
    pub token_available: bool,
}

impl MachineSummary {
    pub fn from_config(config: &FleetConfig) -> Vec<Self> {
        config
            .machines()
            .map(|(name, machine)| Self {
                name: name.to_string(),
                id: machine.id,
                description: machine.description.clone(),
                token_key: machine.account.clone(),
                token_available: config.has_credential(&machine.account),
            })
            .collect()
    }
}

/// Machine entry listed under the account it uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsingMachine {
    pub name: String,
    pub id: u64,
    pub description: String,
}

impl UsingMachine {
    fn new(name: &str, machine: &MachineConfig) -> Self {
        Self {
            name: name.to_string(),
            id: machine.id,
            description: machine.description.clone(),
        }
    }

    pub fn for_account(config: &FleetConfig, account: &AccountKey) -> Vec<Self> {
        config
            .machines_for_account(account)
            .map(|(name, machine)| Self::new(name, machine))
            .collect()
    }
}

/// Reserved IP tagged with the account that listed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountReservedIp {
    pub source_account: AccountKey,
    /// Public IPv4 of the droplet the IP is bound to
    pub current_ip: Option<String>,
    #[serde(flatten)]
    pub reserved_ip: ReservedIp,
}

impl AccountReservedIp {
    /// Flatten the successful listings, in account-key order
    pub fn flatten<'a>(results: impl IntoIterator<Item = &'a AccountResult>) -> Vec<Self> {
        results
            .into_iter()
            .flat_map(|result| {
                result.reserved_ips().iter().map(|ip| Self {
                    source_account: result.account.clone(),
                    current_ip: ip
                        .droplet
                        .as_ref()
                        .and_then(|d| d.current_ip())
                        .map(str::to_string),
                    reserved_ip: ip.clone(),
                })
            })
            .collect()
    }
}

/// Listing result of one account plus the machines configured to use it
#[derive(Debug, Clone, Serialize)]
pub struct AccountOverview {
    #[serde(flatten)]
    pub result: AccountResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub using_machines: Option<Vec<UsingMachine>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewSummary {
    pub total_accounts: usize,
    pub successful_accounts: usize,
    pub total_reserved_ips: usize,
    pub execution_time_secs: f64,
    pub cache_used: bool,
}

/// All accounts with totals
#[derive(Debug, Clone, Serialize)]
pub struct AccountsOverview {
    pub accounts: BTreeMap<AccountKey, AccountOverview>,
    pub summary: OverviewSummary,
}

impl AccountsOverview {
    pub fn build(
        config: &FleetConfig,
        results: BTreeMap<AccountKey, AccountResult>,
        execution_time_secs: f64,
        cache_used: bool,
    ) -> Self {
        let total_accounts = results.len();
        let successful_accounts = results.values().filter(|r| r.is_success()).count();
        let total_reserved_ips = results
            .values()
            .filter(|r| r.is_success())
            .map(|r| r.reserved_ips_count)
            .sum();

        let accounts = results
            .into_iter()
            .map(|(key, result)| {
                let using_machines = result
                    .is_success()
                    .then(|| UsingMachine::for_account(config, &key));
                (
                    key,
                    AccountOverview {
                        result,
                        using_machines,
                    },
                )
            })
            .collect();

        Self {
            accounts,
            summary: OverviewSummary {
                total_accounts,
                successful_accounts,
                total_reserved_ips,
                execution_time_secs: (execution_time_secs * 100.0).round() / 100.0,
                cache_used,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    Unassigned,
}

impl AssignmentStatus {
    pub fn of(ip: &ReservedIp) -> Self {
        if ip.is_assigned() {
            Self::Assigned
        } else {
            Self::Unassigned
        }
    }
}

/// Droplet a reserved IP is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedMachine {
    pub machine_name: Option<String>,
    pub machine_id: u64,
    pub machine_status: Option<String>,
}

/// Where a reserved IP lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpLocation {
    pub reserved_ip: String,
    pub token_key: AccountKey,
    pub region: String,
    pub status: AssignmentStatus,
    pub using_machines: Vec<UsingMachine>,
    pub assigned_to: Option<AssignedMachine>,
}

impl IpLocation {
    pub fn new(config: &FleetConfig, account: &AccountKey, ip: &ReservedIp) -> Self {
        Self {
            reserved_ip: ip.ip.clone(),
            token_key: account.clone(),
            region: ip.region.name.clone().unwrap_or_else(|| "N/A".to_string()),
            status: AssignmentStatus::of(ip),
            using_machines: UsingMachine::for_account(config, account),
            assigned_to: ip.droplet.as_ref().map(|d| AssignedMachine {
                machine_name: d.name.clone(),
                machine_id: d.id,
                machine_status: d.status.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedIpDetail {
    pub ip: String,
    pub machine_name: Option<String>,
    pub machine_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnassignedIpDetail {
    pub ip: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaDetails {
    pub assigned_ips: Vec<AssignedIpDetail>,
    pub unassigned_ips: Vec<UnassignedIpDetail>,
}

/// Reserved IP usage of one account against an estimated limit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaInfo {
    pub account: AccountKey,
    pub current_count: usize,
    pub assigned_count: usize,
    pub unassigned_count: usize,
    pub estimated_limit: usize,
    pub can_create_more: bool,
    pub usage_percentage: f64,
    pub details: QuotaDetails,
}

impl QuotaInfo {
    pub fn from_reserved_ips(account: AccountKey, ips: &[ReservedIp]) -> Self {
        Self::with_limit(account, ips, ESTIMATED_RESERVED_IP_LIMIT)
    }

    pub fn with_limit(account: AccountKey, ips: &[ReservedIp], limit: usize) -> Self {
        let assigned_ips: Vec<AssignedIpDetail> = ips
            .iter()
            .filter_map(|ip| {
                ip.droplet.as_ref().map(|d| AssignedIpDetail {
                    ip: ip.ip.clone(),
                    machine_name: d.name.clone(),
                    machine_id: d.id,
                })
            })
            .collect();
        let unassigned_ips: Vec<UnassignedIpDetail> = ips
            .iter()
            .filter(|ip| !ip.is_assigned())
            .map(|ip| UnassignedIpDetail {
                ip: ip.ip.clone(),
                region: ip.region.name.clone(),
            })
            .collect();

        let current_count = ips.len();
        let usage_percentage = if limit > 0 {
            ((current_count as f64 / limit as f64) * 1000.0).round() / 10.0
        } else {
            0.0
        };

        Self {
            account,
            current_count,
            assigned_count: assigned_ips.len(),
            unassigned_count: unassigned_ips.len(),
            estimated_limit: limit,
            can_create_more: current_count < limit,
            usage_percentage,
            details: QuotaDetails {
                assigned_ips,
                unassigned_ips,
            },
        }
    }

    pub fn remaining(&self) -> usize {
        self.estimated_limit.saturating_sub(self.current_count)
    }
}

/// Droplet details of a configured machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropletInfo {
    pub name: String,
    pub id: u64,
    pub ips: Vec<String>,
    pub current_ip: Option<String>,
    pub token_key: AccountKey,
}

/// Result of deleting an IP addressed only by its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedIp {
    pub deleted_ip: String,
    pub used_token: AccountKey,
    pub outcome: DeleteOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AccountOutcome;

    fn ip(addr: &str, droplet: Option<(u64, &str)>) -> ReservedIp {
        let mut value = serde_json::json!({
            "ip": addr,
            "region": {"name": "New York 3", "slug": "nyc3"}
        });
        if let Some((id, name)) = droplet {
            value["droplet"] = serde_json::json!({
                "id": id,
                "name": name,
                "status": "active",
                "networks": {"v4": [
                    {"ip_address": "10.0.0.2", "type": "private"},
                    {"ip_address": "192.0.2.9", "type": "public"}
                ]}
            });
        }
        serde_json::from_value(value).unwrap()
    }

    fn config() -> FleetConfig {
        FleetConfig::new()
            .with_credential(AccountKey::from_index(1), "dop_v1_aaaaaaaaaaaa")
            .with_machine(
                "edge-a",
                MachineConfig::new(1, AccountKey::from_index(1)).with_description("primary"),
            )
            .with_machine("edge-b", MachineConfig::new(2, AccountKey::from_index(2)))
    }

    #[test]
    fn quota_counts() {
        let ips = vec![
            ip("203.0.113.1", Some((1, "edge-a"))),
            ip("203.0.113.2", None),
        ];
        let quota = QuotaInfo::from_reserved_ips(AccountKey::from_index(1), &ips);
        assert_eq!(quota.current_count, 2);
        assert_eq!(quota.assigned_count, 1);
        assert_eq!(quota.unassigned_count, 1);
        assert!(quota.can_create_more);
        assert_eq!(quota.usage_percentage, 66.7);
        assert_eq!(quota.remaining(), 1);
        assert_eq!(quota.details.assigned_ips[0].machine_name.as_deref(), Some("edge-a"));

        let full = QuotaInfo::from_reserved_ips(
            AccountKey::from_index(1),
            &[ips[0].clone(), ips[1].clone(), ip("203.0.113.3", None)],
        );
        assert!(!full.can_create_more);
        assert_eq!(full.usage_percentage, 100.0);
    }

    #[test]
    fn machine_summaries_flag_missing_tokens() {
        let summaries = MachineSummary::from_config(&config());
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].token_available);
        assert_eq!(summaries[0].description, "primary");
        assert!(!summaries[1].token_available);
    }

    #[test]
    fn location_of_assigned_ip() {
        let config = config();
        let account = AccountKey::from_index(1);
        let location = IpLocation::new(&config, &account, &ip("203.0.113.1", Some((1, "edge-a"))));
        assert_eq!(location.status, AssignmentStatus::Assigned);
        assert_eq!(location.region, "New York 3");
        assert_eq!(location.using_machines.len(), 1);
        assert_eq!(location.assigned_to.unwrap().machine_id, 1);
    }

    #[test]
    fn overview_totals_only_count_successes() {
        let config = config();
        let mut results = BTreeMap::new();
        results.insert(
            AccountKey::from_index(1),
            AccountResult {
                account: AccountKey::from_index(1),
                reserved_ips_count: 1,
                outcome: AccountOutcome::Success {
                    reserved_ips: vec![ip("203.0.113.1", None)],
                },
            },
        );
        results.insert(
            AccountKey::from_index(2),
            AccountResult {
                account: AccountKey::from_index(2),
                reserved_ips_count: 0,
                outcome: AccountOutcome::Failed {
                    error: "unauthorized".to_string(),
                },
            },
        );

        let flat = AccountReservedIp::flatten(results.values());
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].source_account.as_str(), "do_token1");

        let overview = AccountsOverview::build(&config, results, 1.234, true);
        assert_eq!(overview.summary.total_accounts, 2);
        assert_eq!(overview.summary.successful_accounts, 1);
        assert_eq!(overview.summary.total_reserved_ips, 1);
        assert_eq!(overview.summary.execution_time_secs, 1.23);
        assert!(overview.accounts[&AccountKey::from_index(2)]
            .using_machines
            .is_none());
        assert_eq!(
            overview.accounts[&AccountKey::from_index(1)]
                .using_machines
                .as_ref()
                .unwrap()[0]
                .name,
            "edge-a"
        );
    }

    #[test]
    fn flattened_ip_carries_droplet_public_address() {
        let result = AccountResult {
            account: AccountKey::from_index(1),
            reserved_ips_count: 1,
            outcome: AccountOutcome::Success {
                reserved_ips: vec![ip("203.0.113.1", Some((1, "edge-a")))],
            },
        };
        let flat = AccountReservedIp::flatten([&result]);
        assert_eq!(flat[0].current_ip.as_deref(), Some("192.0.2.9"));
    }
}
