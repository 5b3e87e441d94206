//! Sample fleet configuration
//!
//! Two accounts (`do_token1`, `do_token2`) and one machine, `edge`, living in
//! the second account.

use floatip_common::{AccountKey, FleetConfig, MachineConfig};

/// Machine configured by [`sample_fleet`]
pub const TEST_MACHINE: &str = "edge";

/// Droplet id of [`TEST_MACHINE`]
pub const TEST_DROPLET_ID: u64 = 4242;

/// Deterministic token for account `index`.
///
/// Tokens differ within the first ten characters so each account gets its
/// own cache prefix.
pub fn test_token(index: u32) -> String {
    format!("dop_v1_{index:03}_{}", "f".repeat(24))
}

/// Fleet with two accounts and [`TEST_MACHINE`] in account 2
pub fn sample_fleet() -> FleetConfig {
    FleetConfig::new()
        .with_credential(AccountKey::from_index(1), &test_token(1))
        .with_credential(AccountKey::from_index(2), &test_token(2))
        .with_machine(
            TEST_MACHINE,
            MachineConfig::new(TEST_DROPLET_ID, AccountKey::from_index(2))
                .with_description("edge proxy"),
        )
}

/// Config file contents equivalent to [`sample_fleet`]
pub fn sample_fleet_json() -> String {
    serde_json::json!({
        "do_token1": test_token(1),
        "do_token2": test_token(2),
        "machines": {
            TEST_MACHINE: {
                "id": TEST_DROPLET_ID,
                "usedo": 2,
                "description": "edge proxy"
            }
        }
    })
    .to_string()
}
