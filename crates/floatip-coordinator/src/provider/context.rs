//! Shared HTTP context for provider requests
//!
//! Holds one `reqwest::Client` configured with the provider's headers and
//! per-attempt timeout, and performs single classified attempts.

use super::error::classify_response;
use super::retry::AttemptOutcome;
use crate::config::ProviderConfig;
use floatip_common::Credential;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use tracing::debug;

/// HTTP client bound to one provider API root
#[derive(Clone)]
pub struct ProviderContext {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl ProviderContext {
    /// Build the HTTP client.
    ///
    /// Certificate verification is disabled for provider requests.
    pub fn new(config: &ProviderConfig) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Absolute URL for an API path such as `/reserved_ips`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Perform a single request and classify the response
    pub async fn send_once(
        &self,
        method: Method,
        path: &str,
        credential: &Credential,
        body: Option<&serde_json::Value>,
    ) -> AttemptOutcome {
        let url = self.url(path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(credential.token());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                return AttemptOutcome::Transport {
                    message: e.to_string(),
                };
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                return AttemptOutcome::Transport {
                    message: format!("failed to read response body: {e}"),
                };
            }
        };

        debug!(%method, path, status, account = %credential.key(), "Provider response");
        classify_response(status, &text)
    }
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}
