//! Provider API response bodies and records
//!
//! Bodies mirror the provider's JSON envelopes closely enough for the
//! coordinator's decoders, with only the fields it reads.

use floatip_common::ReservedIp;
use serde_json::{Value, json};

/// Region slug used by every fixture
pub const TEST_REGION: &str = "fra1";

/// Unassigned reserved IP record
pub fn reserved_ip(ip: &str) -> ReservedIp {
    record(reserved_ip_json(ip, None))
}

/// Reserved IP record bound to `droplet_id`
pub fn reserved_ip_on(ip: &str, droplet_id: u64) -> ReservedIp {
    record(reserved_ip_json(ip, Some(droplet_id)))
}

fn record(value: Value) -> ReservedIp {
    serde_json::from_value(value).expect("fixture must decode as ReservedIp")
}

/// A single reserved IP object as the provider encodes it
pub fn reserved_ip_json(ip: &str, droplet_id: Option<u64>) -> Value {
    let droplet = droplet_id.map(|id| {
        json!({
            "id": id,
            "name": format!("droplet-{id}"),
            "status": "active",
            "networks": {
                "v4": [
                    { "ip_address": format!("10.0.0.{}", id % 250), "type": "private" },
                    { "ip_address": ip, "type": "public" }
                ]
            }
        })
    });
    json!({
        "ip": ip,
        "region": { "name": "Frankfurt 1", "slug": TEST_REGION },
        "locked": false,
        "droplet": droplet,
        "project_id": "0c4a1e3a-7a52-4d2c-9f6e-2c5f0a0b7d11"
    })
}

/// `GET /reserved_ips` body
pub fn reserved_ips_body(ips: &[(&str, Option<u64>)]) -> Value {
    let records: Vec<Value> = ips
        .iter()
        .map(|(ip, droplet)| reserved_ip_json(ip, *droplet))
        .collect();
    json!({
        "reserved_ips": records,
        "links": {},
        "meta": { "total": ips.len() }
    })
}

/// `POST /reserved_ips` body
pub fn reserved_ip_body(ip: &str, droplet_id: Option<u64>) -> Value {
    json!({
        "reserved_ip": reserved_ip_json(ip, droplet_id),
        "links": {}
    })
}

/// `POST /reserved_ips/{ip}/actions` body
pub fn action_body(id: u64, kind: &str, droplet_id: Option<u64>) -> Value {
    json!({
        "action": {
            "id": id,
            "status": "in-progress",
            "type": kind,
            "started_at": "2024-05-01T12:00:00Z",
            "completed_at": null,
            "resource_id": droplet_id,
            "region_slug": TEST_REGION
        }
    })
}

/// `GET /droplets` body; each entry is `(id, name, public IPv4s)`
pub fn droplets_body(droplets: &[(u64, &str, &[&str])]) -> Value {
    let records: Vec<Value> = droplets
        .iter()
        .map(|(id, name, ips)| droplet_json(*id, name, ips))
        .collect();
    json!({ "droplets": records, "links": {}, "meta": { "total": droplets.len() } })
}

/// `GET /droplets/{id}` body
pub fn droplet_body(id: u64, name: &str, public_ips: &[&str]) -> Value {
    json!({ "droplet": droplet_json(id, name, public_ips) })
}

fn droplet_json(id: u64, name: &str, public_ips: &[&str]) -> Value {
    let v4: Vec<Value> = public_ips
        .iter()
        .map(|ip| json!({ "ip_address": ip, "type": "public" }))
        .collect();
    json!({ "id": id, "name": name, "status": "active", "networks": { "v4": v4 } })
}

/// 422 body returned when the account is at its reserved IP limit
pub fn quota_error_body() -> Value {
    json!({
        "id": "unprocessable_entity",
        "message": "You will exceed your Reserved IP limit. Please contact support to increase it."
    })
}

/// 422 body returned while another action on the IP is in flight
pub fn pending_event_body() -> Value {
    json!({
        "id": "unprocessable_entity",
        "message": "The reserved IP has a pending event."
    })
}

/// Generic error body
pub fn error_body(id: &str, message: &str) -> Value {
    json!({ "id": id, "message": message })
}
