//! Replace workflow errors

use super::types::ReplacePhase;
use crate::provider::ProviderError;
use floatip_common::ConfigError;
use std::time::Duration;
use thiserror::Error;

/// Why a replace did not complete
#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("A replace is already in progress for droplet {droplet_id}")]
    InProgress { droplet_id: u64 },

    #[error("Failed to look up the current reserved IP of machine '{machine}': {source}")]
    LocateFailed {
        machine: String,
        #[source]
        source: ProviderError,
    },

    #[error("Machine '{machine}' has no reserved IP assigned; nothing to replace")]
    NoCurrentIp { machine: String },

    #[error("Failed to delete reserved IP {ip}: {source}")]
    DeleteFailed {
        ip: String,
        #[source]
        source: ProviderError,
    },

    #[error("Reserved IP {ip} still listed after {waited:?} ({checks} checks)")]
    DeleteTimeout {
        ip: String,
        waited: Duration,
        checks: u32,
    },

    #[error("Cannot create a reserved IP for machine '{machine}': account limit reached")]
    QuotaExceeded {
        machine: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to create a reserved IP after {attempts} attempts: {last_error}")]
    CreateFailed {
        attempts: u32,
        #[source]
        last_error: ProviderError,
    },

    #[error("New reserved IP not bound to droplet {droplet_id} after {waited:?} ({checks} checks)")]
    CreateTimeout {
        droplet_id: u64,
        waited: Duration,
        checks: u32,
    },

    #[error("Replace cancelled during {phase}")]
    Cancelled { phase: ReplacePhase },
}

impl ReplaceError {
    /// Stable snake_case kind
    pub fn kind(&self) -> &'static str {
        match self {
            ReplaceError::Configuration(_) => "configuration",
            ReplaceError::InProgress { .. } => "replace_in_progress",
            ReplaceError::LocateFailed { .. } => "locate_failed",
            ReplaceError::NoCurrentIp { .. } => "no_current_ip",
            ReplaceError::DeleteFailed { .. } => "delete_failed",
            ReplaceError::DeleteTimeout { .. } => "delete_timeout",
            ReplaceError::QuotaExceeded { .. } => "quota_exceeded",
            ReplaceError::CreateFailed { .. } => "create_failed_after_retries",
            ReplaceError::CreateTimeout { .. } => "create_timeout",
            ReplaceError::Cancelled { .. } => "cancelled",
        }
    }

    /// Phase the workflow was in when it failed
    pub fn phase(&self) -> ReplacePhase {
        match self {
            ReplaceError::Configuration(_) | ReplaceError::InProgress { .. } => {
                ReplacePhase::Acquire
            }
            ReplaceError::LocateFailed { .. } | ReplaceError::NoCurrentIp { .. } => {
                ReplacePhase::LocateCurrent
            }
            ReplaceError::DeleteFailed { .. } => ReplacePhase::DeleteOld,
            ReplaceError::DeleteTimeout { .. } => ReplacePhase::ConfirmDelete,
            ReplaceError::QuotaExceeded { .. } | ReplaceError::CreateFailed { .. } => {
                ReplacePhase::CreateNew
            }
            ReplaceError::CreateTimeout { .. } => ReplacePhase::ConfirmCreate,
            ReplaceError::Cancelled { phase } => *phase,
        }
    }

    /// Underlying provider error, if any
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            ReplaceError::LocateFailed { source, .. }
            | ReplaceError::DeleteFailed { source, .. }
            | ReplaceError::QuotaExceeded { source, .. } => Some(source),
            ReplaceError::CreateFailed { last_error, .. } => Some(last_error),
            _ => None,
        }
    }

    /// Create attempts made before giving up
    pub fn retries_attempted(&self) -> Option<u32> {
        match self {
            ReplaceError::CreateFailed { attempts, .. } => Some(*attempts),
            ReplaceError::QuotaExceeded { .. } => Some(1),
            _ => None,
        }
    }

    /// Retrying the whole workflow cannot succeed without operator action
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ReplaceError::Configuration(_)
                | ReplaceError::QuotaExceeded { .. }
                | ReplaceError::NoCurrentIp { .. }
        )
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ReplaceError::QuotaExceeded { .. } => Some(
                "Delete reserved IPs that are no longer used, or ask the provider to raise the account limit.",
            ),
            ReplaceError::CreateFailed { .. } => {
                Some("Try again later, or check the provider account status.")
            }
            ReplaceError::DeleteTimeout { .. } => {
                Some("Deletion is slow to settle. Try again shortly.")
            }
            ReplaceError::CreateTimeout { .. } => {
                Some("Check the provider console; the new reserved IP may still be attaching.")
            }
            ReplaceError::NoCurrentIp { .. } => {
                Some("Create a reserved IP for the machine instead of replacing one.")
            }
            ReplaceError::InProgress { .. } => Some("Wait for the running replace to finish."),
            ReplaceError::DeleteFailed { source, .. } => source.suggestion(),
            _ => None,
        }
    }
}
