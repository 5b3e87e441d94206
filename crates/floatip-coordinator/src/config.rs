//! Configuration types for the coordinator

// Re-export from common for use by service code
pub use floatip_common::{FleetConfig, MachineConfig};

use floatip_common::defaults::{
    CACHE_TTL_SECS, CREATE_ATTEMPTS, CREATE_BACKOFF_STEP_SECS, DEFAULT_API_BASE_URL,
    DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT, POLL_BUDGET_SECS,
    POLL_INTERVAL_SECS, SETTLE_DELAY_SECS,
};
use std::time::Duration;

use crate::provider::RetryPolicies;
use crate::wait::PollConfig;

/// Provider HTTP client configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// REST API base URL, without a trailing slash
    pub base_url: String,
    /// Per-attempt request timeout
    pub request_timeout: Duration,
    pub user_agent: String,
    /// `per_page` sent on list endpoints
    pub page_size: u32,
    /// Lifetime of cached listings
    pub cache_ttl: Duration,
    pub retry: RetryPolicies,
}

impl ProviderConfig {
    /// Point the client at a different API root (used for tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicies) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            retry: RetryPolicies::default(),
        }
    }
}

/// Timing envelope of the replace workflow
#[derive(Debug, Clone)]
pub struct ReplaceConfig {
    /// Deletion confirmation polling
    pub delete_poll: PollConfig,
    /// Creation confirmation polling
    pub create_poll: PollConfig,
    /// Pause between confirmed deletion and the first create attempt
    pub settle_delay: Duration,
    /// Create attempts before giving up
    pub create_attempts: u32,
    /// Delay before create attempt `k + 1` is `step * k`
    pub create_backoff_step: Duration,
}

impl Default for ReplaceConfig {
    fn default() -> Self {
        let poll = PollConfig::new(
            Duration::from_secs(POLL_INTERVAL_SECS),
            Duration::from_secs(POLL_BUDGET_SECS),
        );
        Self {
            delete_poll: poll.clone(),
            create_poll: poll,
            settle_delay: Duration::from_secs(SETTLE_DELAY_SECS),
            create_attempts: CREATE_ATTEMPTS,
            create_backoff_step: Duration::from_secs(CREATE_BACKOFF_STEP_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_defaults() {
        let config = ReplaceConfig::default();
        assert_eq!(config.delete_poll.max_checks(), 12);
        assert_eq!(config.settle_delay, Duration::from_secs(10));
        assert_eq!(config.create_attempts, 3);
    }

    #[test]
    fn base_url_is_normalized() {
        let config = ProviderConfig::default().with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
    }
}
