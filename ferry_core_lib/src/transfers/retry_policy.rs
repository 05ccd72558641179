use std::time::{Duration, SystemTime};

use crate::errors::{FerryError, Result};

use super::{FileTransfer, TransferDirection, TransferStatus};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Send the transfer request again; the record is back in `AwaitingResponse`.
    Resend { retry_counter: u32 },
    /// The limit was reached by this request and a lockout started.
    LimitReached {
        retry_limit: u32,
        lockout_expires_at: SystemTime,
    },
    /// A lockout is still running; its expiry is unchanged.
    LockedOut {
        retry_limit: u32,
        lockout_expires_at: SystemTime,
    },
}

/// Decides what the sending side does with a peer's retry request for an
/// outbound transfer.
pub fn apply_retry_policy(
    transfer: &mut FileTransfer,
    retry_limit: u32,
    lockout: Duration,
    now: SystemTime,
) -> Result<RetryDecision> {
    if transfer.direction != TransferDirection::Outbound {
        return Err(FerryError::InvalidTransferState {
            transfer_id: transfer.id,
            from: transfer.status,
            to: TransferStatus::AwaitingResponse,
        });
    }

    if transfer.status == TransferStatus::RetryLimitExceeded {
        let lockout_expires_at = transfer.retry_lockout_expire_time.unwrap_or(now);

        if !transfer.lockout_expired(now) {
            return Ok(RetryDecision::LockedOut {
                retry_limit,
                lockout_expires_at,
            });
        }

        transfer.retry_counter = 0;
        transfer.retry_lockout_expire_time = None;
        transfer.reset_transient_fields();
        transfer.set_status(TransferStatus::AwaitingResponse)?;
        return Ok(RetryDecision::Resend { retry_counter: 0 });
    }

    // A complete but unconfirmed send may still have failed on the receiver.
    if !matches!(
        transfer.status,
        TransferStatus::Cancelled
            | TransferStatus::Stalled
            | TransferStatus::Error
            | TransferStatus::TransferComplete
    ) {
        return Err(FerryError::InvalidTransferState {
            transfer_id: transfer.id,
            from: transfer.status,
            to: TransferStatus::AwaitingResponse,
        });
    }

    if transfer.retry_counter >= retry_limit {
        let lockout_expires_at = now + lockout;
        transfer.set_status(TransferStatus::RetryLimitExceeded)?;
        transfer.retry_lockout_expire_time = Some(lockout_expires_at);
        transfer.error_message = Some(format!(
            "retry limit of {} reached, locked out for {}s",
            retry_limit,
            lockout.as_secs()
        ));
        return Ok(RetryDecision::LimitReached {
            retry_limit,
            lockout_expires_at,
        });
    }

    transfer.retry_counter += 1;
    transfer.reset_transient_fields();
    transfer.set_status(TransferStatus::AwaitingResponse)?;
    Ok(RetryDecision::Resend {
        retry_counter: transfer.retry_counter,
    })
}
