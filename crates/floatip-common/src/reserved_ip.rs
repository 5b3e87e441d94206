//! Reserved IP records as returned by the provider API

use serde::{Deserialize, Serialize};

/// Region a reserved IP lives in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// A single IPv4 network entry on a droplet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkV4 {
    pub ip_address: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl NetworkV4 {
    pub fn is_public(&self) -> bool {
        self.kind.as_deref() == Some("public")
    }
}

/// Droplet networks; only IPv4 is relevant here
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Networks {
    #[serde(default)]
    pub v4: Vec<NetworkV4>,
}

/// Droplet embedded in a reserved IP record (the current owner)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedDroplet {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub networks: Networks,
}

impl AttachedDroplet {
    /// First public IPv4 address of the droplet
    pub fn current_ip(&self) -> Option<&str> {
        self.networks
            .v4
            .iter()
            .find(|n| n.is_public())
            .map(|n| n.ip_address.as_str())
    }
}

/// Reserved IP record. The address is the natural key within an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedIp {
    pub ip: String,
    #[serde(default)]
    pub region: Region,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub droplet: Option<AttachedDroplet>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ReservedIp {
    /// Id of the droplet this IP is currently bound to
    pub fn droplet_id(&self) -> Option<u64> {
        self.droplet.as_ref().map(|d| d.id)
    }

    pub fn is_assigned(&self) -> bool {
        self.droplet.is_some()
    }

    pub fn is_bound_to(&self, droplet_id: u64) -> bool {
        self.droplet_id() == Some(droplet_id)
    }
}

/// Provider action created by assign/unassign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub id: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub resource_id: Option<u64>,
    #[serde(default)]
    pub region_slug: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_record() {
        let json = r#"{
            "ip": "45.55.96.47",
            "region": {"name": "New York 3", "slug": "nyc3", "features": ["backups"]},
            "droplet": {
                "id": 518135617,
                "name": "edge-us1",
                "status": "active",
                "networks": {"v4": [
                    {"ip_address": "10.10.0.2", "type": "private"},
                    {"ip_address": "104.131.186.241", "type": "public"}
                ]}
            },
            "locked": false,
            "project_id": "746c6152-2fa2-11ed-92d3-27aaa54e4988"
        }"#;

        let rip: ReservedIp = serde_json::from_str(json).unwrap();
        assert_eq!(rip.ip, "45.55.96.47");
        assert_eq!(rip.region.slug.as_deref(), Some("nyc3"));
        assert!(rip.is_bound_to(518135617));
        assert_eq!(
            rip.droplet.as_ref().and_then(|d| d.current_ip()),
            Some("104.131.186.241")
        );
    }

    #[test]
    fn unassigned_record_has_no_droplet() {
        let json = r#"{"ip": "45.55.96.48", "region": {"slug": "ams3"}, "droplet": null, "locked": true}"#;
        let rip: ReservedIp = serde_json::from_str(json).unwrap();
        assert!(!rip.is_assigned());
        assert!(rip.locked);
        assert_eq!(rip.droplet_id(), None);
    }
}
