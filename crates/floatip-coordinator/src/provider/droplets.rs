//! Droplet endpoints

use super::client::DigitalOceanClient;
use super::error::ProviderError;
use floatip_common::Credential;
use floatip_common::Droplet;
use floatip_common::droplet::RawDroplet;
use reqwest::Method;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Deserialize)]
struct DropletList {
    #[serde(default)]
    droplets: Vec<RawDroplet>,
}

#[derive(Deserialize)]
struct DropletEnvelope {
    droplet: RawDroplet,
}

impl DigitalOceanClient {
    /// List droplets that have an id, a name and a public IPv4.
    ///
    /// Only non-empty listings are cached.
    pub async fn list_droplets(
        &self,
        credential: &Credential,
        use_cache: bool,
    ) -> Result<Arc<Vec<Droplet>>, ProviderError> {
        if use_cache {
            if let Some(droplets) = self.cache.droplets(credential) {
                return Ok(droplets);
            }
        }

        let path = format!("/droplets?per_page={}", self.http.page_size());
        let response = self
            .call(Method::GET, &path, credential, None, &self.policies.standard)
            .await?;
        let list: DropletList = response.json()?;
        let droplets: Arc<Vec<Droplet>> =
            Arc::new(list.droplets.iter().filter_map(Droplet::from_raw).collect());

        debug!(
            account = %credential.key(),
            listed = list.droplets.len(),
            kept = droplets.len(),
            "Listed droplets"
        );
        if !droplets.is_empty() {
            self.cache.set_droplets(credential, droplets.clone());
        }
        Ok(droplets)
    }

    /// First IPv4 address of a droplet, whatever its network type
    pub async fn droplet_public_ip(
        &self,
        credential: &Credential,
        droplet_id: u64,
    ) -> Result<Option<String>, ProviderError> {
        let path = format!("/droplets/{droplet_id}");
        let response = self
            .call(Method::GET, &path, credential, None, &self.policies.standard)
            .await?;
        let envelope: DropletEnvelope = response.json()?;
        Ok(envelope.droplet.first_ipv4().map(str::to_string))
    }
}
