//! Concurrent reserved IP listing across every configured account

use super::operations::ReservedIpOperations;
use floatip_common::{AccountKey, Credential, ReservedIp};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

/// Per-account listing outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccountOutcome {
    Success { reserved_ips: Vec<ReservedIp> },
    Failed { error: String },
}

/// Listing result for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountResult {
    pub account: AccountKey,
    pub reserved_ips_count: usize,
    #[serde(flatten)]
    pub outcome: AccountOutcome,
}

impl AccountResult {
    /// Reserved IPs of a successful fetch; empty for a failed one
    pub fn reserved_ips(&self) -> &[ReservedIp] {
        match &self.outcome {
            AccountOutcome::Success { reserved_ips } => reserved_ips,
            AccountOutcome::Failed { .. } => &[],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AccountOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            AccountOutcome::Failed { error } => Some(error),
            AccountOutcome::Success { .. } => None,
        }
    }
}

/// Results keyed (and therefore ordered) by account key
pub type AccountResults = BTreeMap<AccountKey, AccountResult>;

/// Fetch reserved IPs for every credential concurrently.
///
/// A failing account is reported in its own entry and never affects the others.
pub async fn fetch_all_accounts<O: ReservedIpOperations>(
    ops: &O,
    credentials: &[Credential],
    use_cache: bool,
) -> AccountResults {
    if credentials.is_empty() {
        return AccountResults::new();
    }

    let start = Instant::now();
    let fetches = credentials.iter().map(|credential| async move {
        let outcome = match ops.list_reserved_ips(credential, use_cache).await {
            Ok(reserved_ips) => AccountOutcome::Success { reserved_ips },
            Err(e) => {
                warn!(account = %credential.key(), error = %e, "Failed to list reserved IPs");
                AccountOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        let reserved_ips_count = match &outcome {
            AccountOutcome::Success { reserved_ips } => reserved_ips.len(),
            AccountOutcome::Failed { .. } => 0,
        };
        AccountResult {
            account: credential.key().clone(),
            reserved_ips_count,
            outcome,
        }
    });

    let results: AccountResults = join_all(fetches)
        .await
        .into_iter()
        .map(|r| (r.account.clone(), r))
        .collect();

    info!(
        accounts = results.len(),
        failed = results.values().filter(|r| !r.is_success()).count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        use_cache,
        "Fetched reserved IPs for all accounts"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::error::ProviderError;
    use crate::provider::operations::MockReservedIpOperations;

    fn ip(addr: &str) -> ReservedIp {
        serde_json::from_value(serde_json::json!({ "ip": addr })).unwrap()
    }

    #[tokio::test]
    async fn empty_credentials_yield_empty_map() {
        let ops = MockReservedIpOperations::new();
        assert!(fetch_all_accounts(&ops, &[], true).await.is_empty());
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let a = Credential::new(AccountKey::from_index(1), "token-aaaaaaaaaa");
        let b = Credential::new(AccountKey::from_index(2), "token-bbbbbbbbbb");

        let mut ops = MockReservedIpOperations::new();
        ops.expect_list_reserved_ips()
            .times(2)
            .returning(|credential, _| {
                if credential.key().as_str() == "do_token1" {
                    Err(ProviderError::Http {
                        status: 500,
                        message: "internal error".to_string(),
                        attempts: 3,
                    })
                } else {
                    Ok(vec![ip("203.0.113.7")])
                }
            });

        let results = fetch_all_accounts(&ops, &[a, b], false).await;
        assert_eq!(results.len(), 2);

        let failed = &results[&AccountKey::from_index(1)];
        assert!(!failed.is_success());
        assert!(failed.error().unwrap().contains("internal error"));
        assert_eq!(failed.reserved_ips_count, 0);

        let ok = &results[&AccountKey::from_index(2)];
        assert!(ok.is_success());
        assert_eq!(ok.reserved_ips()[0].ip, "203.0.113.7");
        assert_eq!(ok.reserved_ips_count, 1);
    }

    #[test]
    fn serializes_with_status_tag() {
        let result = AccountResult {
            account: AccountKey::from_index(3),
            reserved_ips_count: 0,
            outcome: AccountOutcome::Failed {
                error: "boom".to_string(),
            },
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"], "boom");
        assert_eq!(value["account"], "do_token3");
    }
}
