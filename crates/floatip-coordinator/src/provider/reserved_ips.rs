//! Reserved IP endpoints

use super::client::DigitalOceanClient;
use super::error::ProviderError;
use super::operations::DeleteOutcome;
use floatip_common::{ActionResult, Credential, ReservedIp};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Deserialize)]
struct ReservedIpList {
    #[serde(default)]
    reserved_ips: Vec<ReservedIp>,
}

#[derive(Deserialize)]
struct ReservedIpEnvelope {
    reserved_ip: ReservedIp,
}

#[derive(Deserialize)]
struct ActionEnvelope {
    action: ActionResult,
}

impl DigitalOceanClient {
    /// List reserved IPs of one account.
    ///
    /// With `use_cache`, a fresh cached listing is returned without a request.
    /// Successful listings are cached even when empty.
    pub async fn list_reserved_ips(
        &self,
        credential: &Credential,
        use_cache: bool,
    ) -> Result<Arc<Vec<ReservedIp>>, ProviderError> {
        if use_cache {
            if let Some(ips) = self.cache.reserved_ips(credential) {
                return Ok(ips);
            }
        }

        let path = format!("/reserved_ips?per_page={}", self.http.page_size());
        let response = self
            .call(Method::GET, &path, credential, None, &self.policies.standard)
            .await?;
        let list: ReservedIpList = response.json()?;
        let ips = Arc::new(list.reserved_ips);

        debug!(account = %credential.key(), count = ips.len(), "Listed reserved IPs");
        self.cache.set_reserved_ips(credential, ips.clone());
        Ok(ips)
    }

    /// Create a reserved IP and bind it to `droplet_id`
    pub async fn create_reserved_ip(
        &self,
        credential: &Credential,
        droplet_id: u64,
    ) -> Result<ReservedIp, ProviderError> {
        let body = json!({ "droplet_id": droplet_id });
        let response = self
            .call(
                Method::POST,
                "/reserved_ips",
                credential,
                Some(&body),
                &self.policies.standard,
            )
            .await?;
        let created: ReservedIpEnvelope = response.json()?;

        info!(
            account = %credential.key(),
            droplet_id,
            ip = %created.reserved_ip.ip,
            attempts = response.attempts,
            "Created reserved IP"
        );
        Ok(created.reserved_ip)
    }

    /// Delete a reserved IP. A 404 is reported as [`DeleteOutcome::AlreadyGone`].
    pub async fn delete_reserved_ip(
        &self,
        credential: &Credential,
        ip: &str,
    ) -> Result<DeleteOutcome, ProviderError> {
        let path = format!("/reserved_ips/{ip}");
        match self
            .call(Method::DELETE, &path, credential, None, &self.policies.delete)
            .await
        {
            Ok(response) => {
                info!(
                    account = %credential.key(),
                    ip,
                    status = response.status,
                    "Deleted reserved IP"
                );
                Ok(DeleteOutcome::Deleted)
            }
            Err(ProviderError::NotFound { message }) => {
                info!(account = %credential.key(), ip, %message, "Reserved IP already gone");
                Ok(DeleteOutcome::AlreadyGone)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn assign_reserved_ip(
        &self,
        credential: &Credential,
        ip: &str,
        droplet_id: u64,
    ) -> Result<ActionResult, ProviderError> {
        let body = json!({ "type": "assign", "resource_id": droplet_id });
        let action = self.action(credential, ip, &body).await?;
        info!(
            account = %credential.key(),
            ip,
            droplet_id,
            action_id = action.id,
            "Assigned reserved IP"
        );
        Ok(action)
    }

    pub async fn unassign_reserved_ip(
        &self,
        credential: &Credential,
        ip: &str,
    ) -> Result<ActionResult, ProviderError> {
        let body = json!({ "type": "unassign" });
        let action = self.action(credential, ip, &body).await?;
        info!(account = %credential.key(), ip, action_id = action.id, "Unassigned reserved IP");
        Ok(action)
    }

    async fn action(
        &self,
        credential: &Credential,
        ip: &str,
        body: &serde_json::Value,
    ) -> Result<ActionResult, ProviderError> {
        let path = format!("/reserved_ips/{ip}/actions");
        let response = self
            .call(
                Method::POST,
                &path,
                credential,
                Some(body),
                &self.policies.standard,
            )
            .await?;
        let envelope: ActionEnvelope = response.json()?;
        Ok(envelope.action)
    }
}
