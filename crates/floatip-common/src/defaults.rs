//! Default configuration values shared by the coordinator and the CLI
//!
//! These constants describe the provider's API surface and the timing
//! envelope of the replace workflow.

/// Provider REST API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.digitalocean.com/v2";

/// Per-attempt HTTP timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// User-Agent sent with every provider request
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Page size requested for list endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Attempts made by the retrying client for every operation
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Flat delay between attempts for list/create/assign/unassign (seconds)
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

/// Delete retry delay after a generic failure: `base + step * attempt`
pub const DELETE_RETRY_BASE_SECS: u64 = 3;
pub const DELETE_RETRY_STEP_SECS: u64 = 1;

/// Delete retry delay after a pending-event rejection: `base + step * attempt`
pub const PENDING_EVENT_RETRY_BASE_SECS: u64 = 5;
pub const PENDING_EVENT_RETRY_STEP_SECS: u64 = 2;

/// Lifetime of a cached listing (seconds)
pub const CACHE_TTL_SECS: u64 = 30;

/// Number of token characters used to namespace cache keys
pub const CACHE_KEY_PREFIX_LEN: usize = 10;

/// Interval between confirmation polls during replace (seconds)
pub const POLL_INTERVAL_SECS: u64 = 10;

/// Budget for each confirmation phase during replace (seconds)
pub const POLL_BUDGET_SECS: u64 = 120;

/// Pause between confirmed deletion and the first create attempt (seconds)
pub const SETTLE_DELAY_SECS: u64 = 10;

/// Create attempts made by the replace workflow
pub const CREATE_ATTEMPTS: u32 = 3;

/// Create retry delay step during replace: `step * attempt` (15s, 30s, ...)
pub const CREATE_BACKOFF_STEP_SECS: u64 = 15;

/// Account key prefix in the configuration file
pub const TOKEN_KEY_PREFIX: &str = "do_token";

/// Account used by machines that do not name one
pub const DEFAULT_ACCOUNT_KEY: &str = "do_token1";

/// Reserved IPs an account is assumed to be allowed when estimating quota
pub const ESTIMATED_RESERVED_IP_LIMIT: usize = 3;

/// Configuration file location relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

// Serde default functions for struct field defaults

/// Returns the default account key
pub fn default_account_key() -> String {
    DEFAULT_ACCOUNT_KEY.to_string()
}
