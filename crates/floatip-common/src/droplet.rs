//! Droplet records

use crate::reserved_ip::Networks;
use serde::{Deserialize, Serialize};

/// Droplet as returned by the provider's droplet endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct RawDroplet {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub networks: Networks,
}

impl RawDroplet {
    /// First IPv4 address regardless of network type
    pub fn first_ipv4(&self) -> Option<&str> {
        self.networks.v4.first().map(|n| n.ip_address.as_str())
    }
}

/// Compute instance with its public IPv4 addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Droplet {
    pub id: u64,
    pub name: String,
    pub public_ips: Vec<String>,
}

impl Droplet {
    /// Reduce a raw droplet to its id, name and public IPv4s.
    ///
    /// Droplets missing an id, a name or any public IPv4 are skipped.
    pub fn from_raw(raw: &RawDroplet) -> Option<Self> {
        let id = raw.id?;
        let name = raw.name.clone().filter(|n| !n.is_empty())?;
        let public_ips: Vec<String> = raw
            .networks
            .v4
            .iter()
            .filter(|n| n.is_public())
            .map(|n| n.ip_address.clone())
            .collect();
        if public_ips.is_empty() {
            return None;
        }
        Some(Self {
            id,
            name,
            public_ips,
        })
    }

    /// Whether `identifier` is one of this droplet's public IPs or its id
    pub fn matches(&self, identifier: &str) -> bool {
        self.public_ips.iter().any(|ip| ip == identifier) || self.id.to_string() == identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawDroplet {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn extracts_public_ips_only() {
        let d = Droplet::from_raw(&raw(
            r#"{"id": 1, "name": "a", "networks": {"v4": [
                {"ip_address": "10.0.0.1", "type": "private"},
                {"ip_address": "1.2.3.4", "type": "public"}
            ]}}"#,
        ))
        .unwrap();
        assert_eq!(d.public_ips, vec!["1.2.3.4".to_string()]);
        assert!(d.matches("1.2.3.4"));
        assert!(d.matches("1"));
        assert!(!d.matches("10.0.0.1"));
    }

    #[test]
    fn skips_incomplete_droplets() {
        assert!(Droplet::from_raw(&raw(r#"{"name": "a"}"#)).is_none());
        assert!(Droplet::from_raw(&raw(r#"{"id": 1, "name": "a"}"#)).is_none());
        assert!(
            Droplet::from_raw(&raw(
                r#"{"id": 1, "networks": {"v4": [{"ip_address": "1.2.3.4", "type": "public"}]}}"#
            ))
            .is_none()
        );
    }
}
