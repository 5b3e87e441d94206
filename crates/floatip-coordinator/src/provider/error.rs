//! Provider error classification
//!
//! Maps raw HTTP responses from the provider into a typed per-attempt outcome,
//! and exposes the classified error surfaced once the retry budget is spent.

use super::retry::AttemptOutcome;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Marker in a 422 message meaning the account hit its reserved IP quota
const QUOTA_MARKER: &str = "exceed your Reserved IP limit";

/// Marker (case-insensitive) in a 422 message meaning a prior action is still running
const PENDING_EVENT_MARKER: &str = "pending event";

const DEFAULT_UNPROCESSABLE_MESSAGE: &str = "Unprocessable entity";
const DEFAULT_NOT_FOUND_MESSAGE: &str = "Reserved IP not found or already deleted";

/// Classified provider errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Network failure or per-attempt timeout
    #[error("Transport failure after {attempts} attempt(s): {message}")]
    Transport { message: String, attempts: u32 },

    /// Account reserved IP quota reached (never retried)
    #[error("Reserved IP limit exceeded: {message}")]
    QuotaExceeded { message: String },

    /// The resource still has an asynchronous action in flight
    #[error("Pending event after {attempts} attempt(s): {message}")]
    PendingEvent { message: String, attempts: u32 },

    /// The resource does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Unclassified 422 from the provider
    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity { message: String },

    /// Any other non-2xx response
    #[error("HTTP {status} after {attempts} attempt(s): {message}")]
    Http {
        status: u16,
        message: String,
        attempts: u32,
    },

    /// 2xx response whose body could not be decoded
    #[error("Failed to decode provider response: {message}")]
    Decode { message: String },

    /// A polling budget ran out before the provider converged
    #[error("Timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },

    /// Unknown machine or account
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ProviderError {
    /// Stable snake_case tag for this error
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Transport { .. } => "transport_failure",
            ProviderError::QuotaExceeded { .. } => "quota_exceeded",
            ProviderError::PendingEvent { .. } => "pending_event",
            ProviderError::NotFound { .. } => "not_found",
            ProviderError::UnprocessableEntity { .. } => "unprocessable_entity",
            ProviderError::Http { .. } => "http_error",
            ProviderError::Decode { .. } => "decode_error",
            ProviderError::Timeout { .. } => "timeout",
            ProviderError::Configuration { .. } => "configuration_error",
        }
    }

    /// Message reported by the provider, or the local failure
    pub fn message(&self) -> String {
        match self {
            ProviderError::Transport { message, .. }
            | ProviderError::QuotaExceeded { message }
            | ProviderError::PendingEvent { message, .. }
            | ProviderError::NotFound { message }
            | ProviderError::UnprocessableEntity { message }
            | ProviderError::Http { message, .. }
            | ProviderError::Decode { message }
            | ProviderError::Configuration { message } => message.clone(),
            ProviderError::Timeout { what, waited } => {
                format!("timed out after {waited:?} waiting for {what}")
            }
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, ProviderError::QuotaExceeded { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    /// Whether retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Transport { .. }
                | ProviderError::PendingEvent { .. }
                | ProviderError::Http { .. }
                | ProviderError::Timeout { .. }
        )
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ProviderError::QuotaExceeded { .. } => Some(
                "Delete reserved IPs that are no longer used, or ask the provider to raise the account limit.",
            ),
            ProviderError::PendingEvent { .. } => {
                Some("The provider is still processing a previous action. Try again shortly.")
            }
            ProviderError::Http { status: 401, .. } => {
                Some("The account token was rejected. Check the configured token.")
            }
            ProviderError::Http { status: 429, .. } => {
                Some("Provider API rate limit hit. Wait before retrying.")
            }
            _ => None,
        }
    }
}

impl AttemptOutcome {
    /// Split a terminal outcome into the 2xx `(status, body)` or its error
    pub fn into_result(self, attempts: u32) -> Result<(u16, String), ProviderError> {
        Err(match self {
            AttemptOutcome::Success { status, body } => return Ok((status, body)),
            AttemptOutcome::QuotaExceeded { message } => ProviderError::QuotaExceeded { message },
            AttemptOutcome::PendingEvent { message } => {
                ProviderError::PendingEvent { message, attempts }
            }
            AttemptOutcome::NotFound { message } => ProviderError::NotFound { message },
            AttemptOutcome::UnprocessableEntity { message } => {
                ProviderError::UnprocessableEntity { message }
            }
            AttemptOutcome::Failure { status, message } => ProviderError::Http {
                status,
                message,
                attempts,
            },
            AttemptOutcome::Transport { message } => ProviderError::Transport { message, attempts },
        })
    }
}

impl From<floatip_common::ConfigError> for ProviderError {
    fn from(e: floatip_common::ConfigError) -> Self {
        ProviderError::Configuration {
            message: e.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Extract the provider's `message` field from an error body
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
}

/// Classify a provider HTTP response.
pub fn classify_response(status: u16, body: &str) -> AttemptOutcome {
    match status {
        200..=299 => AttemptOutcome::Success {
            status,
            body: body.to_string(),
        },
        422 => {
            let Some(message) = error_message(body) else {
                return AttemptOutcome::UnprocessableEntity {
                    message: DEFAULT_UNPROCESSABLE_MESSAGE.to_string(),
                };
            };
            if message.contains(QUOTA_MARKER) {
                AttemptOutcome::QuotaExceeded { message }
            } else if message.to_lowercase().contains(PENDING_EVENT_MARKER) {
                AttemptOutcome::PendingEvent { message }
            } else {
                AttemptOutcome::UnprocessableEntity { message }
            }
        }
        404 => AttemptOutcome::NotFound {
            message: error_message(body).unwrap_or_else(|| DEFAULT_NOT_FOUND_MESSAGE.to_string()),
        },
        _ => AttemptOutcome::Failure {
            status,
            message: error_message(body).unwrap_or_else(|| body.trim().to_string()),
        },
    }
}
