//! Short-lived response cache for listing endpoints
//!
//! Entries are keyed by account key, token prefix and endpoint name. The
//! account key keeps accounts apart even when their tokens share a prefix.
//! Expired entries are evicted on read.

use floatip_common::{Credential, Droplet, ReservedIp};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use strum::{AsRefStr, Display};
use tokio::time::Instant;
use tracing::debug;

/// Cached listing endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Endpoint {
    Droplets,
    ReservedIps,
}

/// A cached listing
#[derive(Debug, Clone)]
pub enum CachedPayload {
    Droplets(Arc<Vec<Droplet>>),
    ReservedIps(Arc<Vec<ReservedIp>>),
}

/// Cache diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub cache_timeout: u64,
    pub cached_items: usize,
    pub cache_keys: Vec<String>,
}

/// TTL cache shared by all requests of a process
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (CachedPayload, Instant)>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, (CachedPayload, Instant)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cache key for an account and endpoint
    pub fn key(credential: &Credential, endpoint: Endpoint) -> String {
        format!(
            "{}_{}_{}",
            credential.key(),
            credential.cache_prefix(),
            endpoint
        )
    }

    /// Fetch a fresh entry, evicting it if expired
    pub fn get(&self, key: &str) -> Option<CachedPayload> {
        let mut entries = self.lock();
        let (payload, stored_at) = entries.get(key)?;
        if stored_at.elapsed() < self.ttl {
            debug!(key, "Cache hit");
            return Some(payload.clone());
        }
        debug!(key, "Cache entry expired");
        entries.remove(key);
        None
    }

    pub fn set(&self, key: impl Into<String>, payload: CachedPayload) {
        self.lock().insert(key.into(), (payload, Instant::now()));
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn status(&self) -> CacheStatus {
        let entries = self.lock();
        let mut cache_keys: Vec<String> = entries.keys().cloned().collect();
        cache_keys.sort();
        CacheStatus {
            cache_timeout: self.ttl.as_secs(),
            cached_items: entries.len(),
            cache_keys,
        }
    }

    pub fn reserved_ips(&self, credential: &Credential) -> Option<Arc<Vec<ReservedIp>>> {
        match self.get(&Self::key(credential, Endpoint::ReservedIps))? {
            CachedPayload::ReservedIps(ips) => Some(ips),
            CachedPayload::Droplets(_) => None,
        }
    }

    pub fn set_reserved_ips(&self, credential: &Credential, ips: Arc<Vec<ReservedIp>>) {
        self.set(
            Self::key(credential, Endpoint::ReservedIps),
            CachedPayload::ReservedIps(ips),
        );
    }

    pub fn droplets(&self, credential: &Credential) -> Option<Arc<Vec<Droplet>>> {
        match self.get(&Self::key(credential, Endpoint::Droplets))? {
            CachedPayload::Droplets(droplets) => Some(droplets),
            CachedPayload::ReservedIps(_) => None,
        }
    }

    pub fn set_droplets(&self, credential: &Credential, droplets: Arc<Vec<Droplet>>) {
        self.set(
            Self::key(credential, Endpoint::Droplets),
            CachedPayload::Droplets(droplets),
        );
    }
}
