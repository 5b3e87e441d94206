//! Static fleet configuration: named machines and account credentials
//!
//! The configuration file is a flat JSON object. Keys starting with
//! `do_token` hold account tokens; `machines` maps machine names to their
//! droplet id and the account they belong to.

use crate::credential::{AccountKey, Credential};
use crate::defaults::default_account_key;
use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A named machine from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Provider droplet id
    pub id: u64,
    /// Account the droplet belongs to
    #[serde(
        rename = "usedo",
        default = "default_account",
        deserialize_with = "deserialize_selector"
    )]
    pub account: AccountKey,
    /// Free-form operator note
    #[serde(default)]
    pub description: String,
}

impl MachineConfig {
    pub fn new(id: u64, account: AccountKey) -> Self {
        Self {
            id,
            account,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn default_account() -> AccountKey {
    AccountKey::new(default_account_key())
}

/// Selectors may be written as `"do_token2"`, `"2"` or `2`
fn deserialize_selector<'de, D>(deserializer: D) -> Result<AccountKey, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Selector {
        Index(u32),
        Key(String),
    }

    Ok(match Selector::deserialize(deserializer)? {
        Selector::Index(index) => AccountKey::from_index(index),
        Selector::Key(key) => AccountKey::from_selector(&key),
    })
}

#[derive(Deserialize)]
struct RawFleetConfig {
    #[serde(default)]
    machines: BTreeMap<String, MachineConfig>,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

/// Machines and credentials, read-only after load
#[derive(Debug, Clone, Default)]
pub struct FleetConfig {
    machines: BTreeMap<String, MachineConfig>,
    credentials: BTreeMap<AccountKey, Credential>,
}

impl FleetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawFleetConfig = serde_json::from_str(json)?;

        let mut credentials = BTreeMap::new();
        for (key, value) in raw.rest {
            if !AccountKey::is_token_key(&key) {
                continue;
            }
            let serde_json::Value::String(raw_token) = value else {
                return Err(ConfigError::InvalidToken(key));
            };
            let account = AccountKey::new(key.clone());
            let credential = Credential::new(account.clone(), &raw_token);
            if credential.token().is_empty() {
                return Err(ConfigError::EmptyToken(key));
            }
            credentials.insert(account, credential);
        }

        Ok(Self {
            machines: raw.machines,
            credentials,
        })
    }

    /// Add an account credential
    pub fn with_credential(mut self, key: AccountKey, raw_token: &str) -> Self {
        self.credentials
            .insert(key.clone(), Credential::new(key, raw_token));
        self
    }

    /// Add a machine
    pub fn with_machine(mut self, name: impl Into<String>, machine: MachineConfig) -> Self {
        self.machines.insert(name.into(), machine);
        self
    }

    /// Look up a machine by name
    pub fn machine(&self, name: &str) -> Result<&MachineConfig, ConfigError> {
        self.machines
            .get(name)
            .ok_or_else(|| ConfigError::UnknownMachine {
                name: name.to_string(),
                available: self.machine_names(),
            })
    }

    /// Look up an account credential by key
    pub fn credential(&self, key: &AccountKey) -> Result<&Credential, ConfigError> {
        self.credentials
            .get(key)
            .ok_or_else(|| ConfigError::UnknownCredential(key.to_string()))
    }

    /// Whether the given account has a configured token
    pub fn has_credential(&self, key: &AccountKey) -> bool {
        self.credentials.contains_key(key)
    }

    /// All configured credentials, ordered by account key
    pub fn credentials(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.values()
    }

    /// All configured machines, ordered by name
    pub fn machines(&self) -> impl Iterator<Item = (&str, &MachineConfig)> {
        self.machines.iter().map(|(name, m)| (name.as_str(), m))
    }

    pub fn machine_names(&self) -> Vec<String> {
        self.machines.keys().cloned().collect()
    }

    /// Machines whose droplets belong to `account`
    pub fn machines_for_account<'a>(
        &'a self,
        account: &'a AccountKey,
    ) -> impl Iterator<Item = (&'a str, &'a MachineConfig)> + 'a {
        self.machines().filter(move |(_, m)| &m.account == account)
    }
}
