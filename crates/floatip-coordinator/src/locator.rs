//! Resolve machines, accounts and reserved IPs to each other

use crate::provider::{AccountResults, ProviderError, ReservedIpOperations};
use floatip_common::{ConfigError, Credential, FleetConfig, MachineConfig, ReservedIp};
use tracing::warn;

/// A configured machine with its resolved credential
#[derive(Debug, Clone)]
pub struct MachineTarget {
    pub name: String,
    pub droplet_id: u64,
    pub credential: Credential,
    pub machine: MachineConfig,
}

/// Resolve a machine name to its droplet id and account credential
pub fn machine_info(config: &FleetConfig, name: &str) -> Result<MachineTarget, ConfigError> {
    let machine = config.machine(name)?;
    let credential = config.credential(&machine.account)?;
    Ok(MachineTarget {
        name: name.to_string(),
        droplet_id: machine.id,
        credential: credential.clone(),
        machine: machine.clone(),
    })
}

/// Find the account that owns `ip` among successful listings.
///
/// Results are scanned in account-key order; the first match wins.
pub fn find_owning_account<'a>(
    config: &'a FleetConfig,
    ip: &str,
    results: &AccountResults,
) -> Option<&'a Credential> {
    let mut owners = results
        .values()
        .filter(|r| r.reserved_ips().iter().any(|entry| entry.ip == ip))
        .map(|r| &r.account);

    let first = owners.next()?;
    let others: Vec<String> = owners.map(|k| k.to_string()).collect();
    if !others.is_empty() {
        warn!(
            ip,
            owner = %first,
            also_claimed_by = ?others,
            "Reserved IP listed by multiple accounts"
        );
    }
    config.credential(first).ok()
}

/// Reserved IP currently bound to `droplet_id`, if any
pub fn find_reserved_ip_for_resource(ips: &[ReservedIp], droplet_id: u64) -> Option<&ReservedIp> {
    ips.iter().find(|ip| ip.is_bound_to(droplet_id))
}

/// List one account's reserved IPs and find the one bound to `droplet_id`
pub async fn current_reserved_ip<O: ReservedIpOperations>(
    ops: &O,
    credential: &Credential,
    droplet_id: u64,
    use_cache: bool,
) -> Result<Option<ReservedIp>, ProviderError> {
    let ips = ops.list_reserved_ips(credential, use_cache).await?;
    Ok(find_reserved_ip_for_resource(&ips, droplet_id).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AccountOutcome, AccountResult};
    use floatip_common::AccountKey;

    fn config() -> FleetConfig {
        FleetConfig::new()
            .with_credential(AccountKey::from_index(1), "dop_v1_aaaaaaaaaaaa")
            .with_credential(AccountKey::from_index(2), "dop_v1_bbbbbbbbbbbb")
            .with_machine("edge", MachineConfig::new(101, AccountKey::from_index(2)))
            .with_machine("orphan", MachineConfig::new(102, AccountKey::from_index(7)))
    }

    fn ip(addr: &str, droplet: Option<u64>) -> ReservedIp {
        let mut value = serde_json::json!({ "ip": addr });
        if let Some(id) = droplet {
            value["droplet"] = serde_json::json!({ "id": id });
        }
        serde_json::from_value(value).unwrap()
    }

    fn success(index: u32, ips: Vec<ReservedIp>) -> (AccountKey, AccountResult) {
        let account = AccountKey::from_index(index);
        (
            account.clone(),
            AccountResult {
                account,
                reserved_ips_count: ips.len(),
                outcome: AccountOutcome::Success { reserved_ips: ips },
            },
        )
    }

    #[test]
    fn resolves_machine() {
        let target = machine_info(&config(), "edge").unwrap();
        assert_eq!(target.droplet_id, 101);
        assert_eq!(target.credential.key().as_str(), "do_token2");
    }

    #[test]
    fn unknown_machine_and_credential() {
        assert!(matches!(
            machine_info(&config(), "missing"),
            Err(ConfigError::UnknownMachine { .. })
        ));
        assert!(matches!(
            machine_info(&config(), "orphan"),
            Err(ConfigError::UnknownCredential(_))
        ));
    }

    #[test]
    fn first_owner_in_key_order_wins() {
        let config = config();
        let results: AccountResults = [
            success(2, vec![ip("203.0.113.5", None)]),
            success(1, vec![ip("203.0.113.5", None)]),
        ]
        .into_iter()
        .collect();

        let owner = find_owning_account(&config, "203.0.113.5", &results).unwrap();
        assert_eq!(owner.key().as_str(), "do_token1");
        assert!(find_owning_account(&config, "198.51.100.1", &results).is_none());
    }

    #[test]
    fn failed_accounts_are_skipped() {
        let config = config();
        let account = AccountKey::from_index(1);
        let results: AccountResults = [
            (
                account.clone(),
                AccountResult {
                    account,
                    reserved_ips_count: 0,
                    outcome: AccountOutcome::Failed {
                        error: "boom".to_string(),
                    },
                },
            ),
            success(2, vec![ip("203.0.113.5", None)]),
        ]
        .into_iter()
        .collect();

        let owner = find_owning_account(&config, "203.0.113.5", &results).unwrap();
        assert_eq!(owner.key().as_str(), "do_token2");
    }

    #[test]
    fn finds_ip_bound_to_droplet() {
        let ips = vec![ip("203.0.113.1", Some(7)), ip("203.0.113.2", Some(101))];
        assert_eq!(
            find_reserved_ip_for_resource(&ips, 101).unwrap().ip,
            "203.0.113.2"
        );
        assert!(find_reserved_ip_for_resource(&ips, 999).is_none());
    }
}
