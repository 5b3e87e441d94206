//! Retrying provider client

use super::context::ProviderContext;
use super::error::ProviderError;
use super::retry::{RetryPolicies, RetryPolicy, run_with_policy};
use crate::cache::ResponseCache;
use crate::config::ProviderConfig;
use floatip_common::Credential;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Successful response of a retried request
#[derive(Debug, Clone)]
pub(crate) struct Response {
    pub status: u16,
    pub body: String,
    pub attempts: u32,
}

impl Response {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        serde_json::from_str(&self.body).map_err(|e| ProviderError::Decode {
            message: e.to_string(),
        })
    }
}

/// DigitalOcean API client with retries and a shared listing cache
#[derive(Debug, Clone)]
pub struct DigitalOceanClient {
    pub(crate) http: ProviderContext,
    pub(crate) cache: Arc<ResponseCache>,
    pub(crate) policies: RetryPolicies,
}

impl DigitalOceanClient {
    /// Create a client with its own cache
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let cache = Arc::new(ResponseCache::new(config.cache_ttl));
        Self::with_cache(config, cache)
    }

    /// Create a client sharing an existing cache
    pub fn with_cache(
        config: &ProviderConfig,
        cache: Arc<ResponseCache>,
    ) -> Result<Self, ProviderError> {
        let http = ProviderContext::new(config).map_err(|e| ProviderError::Configuration {
            message: format!("failed to build HTTP client: {e}"),
        })?;
        Ok(Self {
            http,
            cache,
            policies: config.retry.clone(),
        })
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Send a request under `policy`, returning the 2xx response or the classified error
    pub(crate) async fn call(
        &self,
        method: Method,
        path: &str,
        credential: &Credential,
        body: Option<&serde_json::Value>,
        policy: &RetryPolicy,
    ) -> Result<Response, ProviderError> {
        let operation = format!("{method} {path}");
        let attempted = run_with_policy(policy, &operation, |_| {
            self.http.send_once(method.clone(), path, credential, body)
        })
        .await;

        let (status, body) = attempted.outcome.into_result(attempted.attempts)?;
        Ok(Response {
            status,
            body,
            attempts: attempted.attempts,
        })
    }
}
