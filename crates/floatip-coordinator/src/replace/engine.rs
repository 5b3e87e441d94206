//! Replace engine: swap the reserved IP bound to one droplet
//!
//! `ReplaceWorkflow` runs the phases strictly in order: locate the current IP,
//! delete it, wait until it disappears, settle, create a new one (with its own
//! retry loop) and wait until it is bound. Every sleep races the cancellation
//! token, and only one workflow per droplet may run at a time.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::error::ReplaceError;
use super::lock::ReplaceLocks;
use super::types::{ReplacePhase, ReplaceReport};
use crate::config::ReplaceConfig;
use crate::locator::{MachineTarget, current_reserved_ip};
use crate::provider::{ProviderError, ReservedIpOperations};
use crate::wait::{PollError, poll_until, sleep_or_cancel};
use floatip_common::ReservedIp;

/// Replace workflow bound to a provider, timings and the lock registry
pub struct ReplaceWorkflow<'a, O> {
    ops: &'a O,
    config: &'a ReplaceConfig,
    locks: &'a ReplaceLocks,
    cancel: CancellationToken,
}

impl<O> std::fmt::Debug for ReplaceWorkflow<'_, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaceWorkflow")
            .field("config", &self.config)
            .field("in_flight", &self.locks.len())
            .finish_non_exhaustive()
    }
}

impl<'a, O: ReservedIpOperations> ReplaceWorkflow<'a, O> {
    pub fn new(
        ops: &'a O,
        config: &'a ReplaceConfig,
        locks: &'a ReplaceLocks,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            ops,
            config,
            locks,
            cancel,
        }
    }

    fn checkpoint(&self, phase: ReplacePhase) -> Result<(), ReplaceError> {
        if self.cancel.is_cancelled() {
            warn!(%phase, "Replace cancelled");
            return Err(ReplaceError::Cancelled { phase });
        }
        Ok(())
    }

    async fn pause(&self, delay: Duration, phase: ReplacePhase) -> Result<(), ReplaceError> {
        if sleep_or_cancel(delay, &self.cancel).await {
            Ok(())
        } else {
            warn!(%phase, "Replace cancelled");
            Err(ReplaceError::Cancelled { phase })
        }
    }

    /// Replace the reserved IP bound to `target`'s droplet.
    pub async fn run(&self, target: &MachineTarget) -> Result<ReplaceReport, ReplaceError> {
        let started_at = Utc::now();
        let droplet_id = target.droplet_id;
        let credential = &target.credential;
        let machine = target.name.as_str();

        let _lease = self
            .locks
            .try_acquire(droplet_id)
            .ok_or(ReplaceError::InProgress { droplet_id })?;

        info!(machine, droplet_id, account = %credential.key(), "Starting reserved IP replace");

        // Locate
        self.checkpoint(ReplacePhase::LocateCurrent)?;
        let old = current_reserved_ip(self.ops, credential, droplet_id, false)
            .await
            .map_err(|source| ReplaceError::LocateFailed {
                machine: machine.to_string(),
                source,
            })?
            .ok_or_else(|| ReplaceError::NoCurrentIp {
                machine: machine.to_string(),
            })?;
        let old_ip = old.ip;
        info!(
            machine,
            phase = %ReplacePhase::LocateCurrent,
            ip = %old_ip,
            "Found current reserved IP"
        );

        // Delete
        self.checkpoint(ReplacePhase::DeleteOld)?;
        let delete_outcome = self
            .ops
            .delete_reserved_ip(credential, &old_ip)
            .await
            .map_err(|source| ReplaceError::DeleteFailed {
                ip: old_ip.clone(),
                source,
            })?;
        info!(
            machine,
            phase = %ReplacePhase::DeleteOld,
            ip = %old_ip,
            outcome = ?delete_outcome,
            "Delete accepted"
        );

        // Confirm delete
        let resource = format!("deletion of {old_ip}");
        let watched = old_ip.as_str();
        let deleted = poll_until(
            &self.config.delete_poll,
            &self.cancel,
            || async move {
                let ips = self.ops.list_reserved_ips(credential, false).await?;
                let gone = !ips.iter().any(|ip| ip.ip == watched);
                Ok::<_, ProviderError>(gone.then_some(()))
            },
            &resource,
        )
        .await
        .map_err(|e| match e {
            PollError::Timeout { waited, checks } => ReplaceError::DeleteTimeout {
                ip: old_ip.clone(),
                waited,
                checks,
            },
            PollError::Cancelled => ReplaceError::Cancelled {
                phase: ReplacePhase::ConfirmDelete,
            },
        })?;
        info!(
            machine,
            phase = %ReplacePhase::ConfirmDelete,
            ip = %old_ip,
            checks = deleted.checks,
            "Deletion confirmed"
        );

        // Settle
        info!(
            machine,
            phase = %ReplacePhase::SettleDelay,
            delay_secs = self.config.settle_delay.as_secs(),
            "Waiting before create"
        );
        self.pause(self.config.settle_delay, ReplacePhase::SettleDelay)
            .await?;

        // Create
        let (reserved_ip, create_attempts) = self.create_with_retries(target).await?;
        info!(
            machine,
            phase = %ReplacePhase::CreateNew,
            ip = %reserved_ip.ip,
            attempts = create_attempts,
            "Create accepted"
        );

        // Confirm create
        let resource = format!("reserved IP bound to droplet {droplet_id}");
        let bound = poll_until(
            &self.config.create_poll,
            &self.cancel,
            || async move {
                current_reserved_ip(self.ops, credential, droplet_id, false)
                    .await
                    .map(|found| found.map(|ip| ip.ip))
            },
            &resource,
        )
        .await
        .map_err(|e| match e {
            PollError::Timeout { waited, checks } => ReplaceError::CreateTimeout {
                droplet_id,
                waited,
                checks,
            },
            PollError::Cancelled => ReplaceError::Cancelled {
                phase: ReplacePhase::ConfirmCreate,
            },
        })?;
        let new_ip = bound.value;

        info!(
            machine,
            phase = %ReplacePhase::Done,
            old_ip = %old_ip,
            new_ip = %new_ip,
            polls = deleted.checks + bound.checks,
            "Reserved IP replaced"
        );

        Ok(ReplaceReport {
            machine: machine.to_string(),
            droplet_id,
            account: credential.key().clone(),
            old_ip,
            new_ip,
            reserved_ip,
            delete_outcome,
            delete_polls: deleted.checks,
            create_attempts,
            create_polls: bound.checks,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Create loop: quota stops immediately, anything else waits `step * k` and retries
    async fn create_with_retries(
        &self,
        target: &MachineTarget,
    ) -> Result<(ReservedIp, u32), ReplaceError> {
        let max_attempts = self.config.create_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            self.checkpoint(ReplacePhase::CreateNew)?;
            attempt += 1;

            let last_error = match self
                .ops
                .create_reserved_ip(&target.credential, target.droplet_id)
                .await
            {
                Ok(reserved_ip) => return Ok((reserved_ip, attempt)),
                Err(e) if e.is_quota_exceeded() => {
                    warn!(machine = %target.name, error = %e, "Reserved IP quota reached");
                    return Err(ReplaceError::QuotaExceeded {
                        machine: target.name.clone(),
                        source: e,
                    });
                }
                Err(e) => e,
            };

            if attempt >= max_attempts {
                return Err(ReplaceError::CreateFailed {
                    attempts: attempt,
                    last_error,
                });
            }

            let delay = self.config.create_backoff_step * attempt;
            warn!(
                machine = %target.name,
                attempt,
                max_attempts,
                delay_secs = delay.as_secs(),
                error = %last_error,
                "Create failed, retrying"
            );
            self.pause(delay, ReplacePhase::CreateNew).await?;
        }
    }
}
