//! Core types for the replace workflow

use crate::provider::DeleteOutcome;
use chrono::{DateTime, Utc};
use floatip_common::{AccountKey, ReservedIp};
use serde::Serialize;
use strum::{AsRefStr, Display};

/// Workflow phase, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReplacePhase {
    Acquire,
    LocateCurrent,
    DeleteOld,
    ConfirmDelete,
    SettleDelay,
    CreateNew,
    ConfirmCreate,
    Done,
}

/// Result of a completed replace
#[derive(Debug, Clone, Serialize)]
pub struct ReplaceReport {
    pub machine: String,
    pub droplet_id: u64,
    pub account: AccountKey,
    pub old_ip: String,
    pub new_ip: String,
    /// Provider's record from the accepted create request
    pub reserved_ip: ReservedIp,
    pub delete_outcome: DeleteOutcome,
    /// Checks made until the old IP disappeared
    pub delete_polls: u32,
    /// Create requests issued, including the successful one
    pub create_attempts: u32,
    /// Checks made until the new IP was bound
    pub create_polls: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ReplaceReport {
    /// Confirmation polls across both phases
    pub fn total_polls(&self) -> u32 {
        self.delete_polls + self.create_polls
    }
}
