use std::{
    path::PathBuf,
    time::{Duration, SystemTime},
};

use crate::{
    data::{requests::TransferCorrelation, ServerInfo},
    errors::{FerryError, Result},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferDirection {
    Inbound,
    Outbound,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferInitiator {
    LocalServer,
    RemoteServer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferStatus {
    /// Inbound transfer waiting for a local accept or reject.
    Pending,
    AwaitingResponse,
    Accepted,
    Rejected,
    InProgress,
    TransferComplete,
    ConfirmedComplete,
    Stalled,
    Cancelled,
    RetryLimitExceeded,
    Error,
}

impl TransferStatus {
    pub fn can_transition_to(self, next: TransferStatus) -> bool {
        use TransferStatus::*;

        if next == Error {
            return true;
        }

        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (AwaitingResponse, Pending)
                | (AwaitingResponse, Accepted)
                | (AwaitingResponse, Rejected)
                | (AwaitingResponse, RetryLimitExceeded)
                | (Accepted, InProgress)
                | (InProgress, TransferComplete)
                | (InProgress, Stalled)
                | (InProgress, Cancelled)
                | (TransferComplete, ConfirmedComplete)
                | (TransferComplete, Cancelled)
                | (TransferComplete, AwaitingResponse)
                | (TransferComplete, RetryLimitExceeded)
                | (Stalled, AwaitingResponse)
                | (Stalled, RetryLimitExceeded)
                | (Cancelled, AwaitingResponse)
                | (Cancelled, RetryLimitExceeded)
                | (RetryLimitExceeded, AwaitingResponse)
                | (RetryLimitExceeded, RetryLimitExceeded)
                | (Error, Cancelled)
                | (Error, AwaitingResponse)
                | (Error, RetryLimitExceeded)
        )
    }

    pub fn is_active(self) -> bool {
        matches!(self, TransferStatus::Accepted | TransferStatus::InProgress)
    }
}

/// One file moving in one direction, including all of its retries.
#[derive(Clone, Debug)]
pub struct FileTransfer {
    pub id: u32,
    pub remote_server_transfer_id: u32,
    pub transfer_response_code: u64,
    pub direction: TransferDirection,
    pub initiator: TransferInitiator,
    pub status: TransferStatus,
    pub remote_server: ServerInfo,

    pub file_name: String,
    pub file_size: u64,
    pub local_folder: PathBuf,
    pub remote_folder: String,

    pub current_bytes: u64,
    pub chunk_count: u64,

    pub retry_counter: u32,
    pub remote_server_retry_limit: u32,
    pub retry_lockout_expire_time: Option<SystemTime>,

    pub request_initiated_time: SystemTime,
    pub transfer_start_time: Option<SystemTime>,
    pub transfer_complete_time: Option<SystemTime>,
    pub error_message: Option<String>,
}

impl FileTransfer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        transfer_response_code: u64,
        direction: TransferDirection,
        initiator: TransferInitiator,
        remote_server: ServerInfo,
        file_name: String,
        local_folder: PathBuf,
        remote_folder: String,
    ) -> FileTransfer {
        FileTransfer {
            id,
            remote_server_transfer_id: 0,
            transfer_response_code,
            direction,
            initiator,
            status: TransferStatus::AwaitingResponse,
            remote_server,
            file_name,
            file_size: 0,
            local_folder,
            remote_folder,
            current_bytes: 0,
            chunk_count: 0,
            retry_counter: 0,
            remote_server_retry_limit: 0,
            retry_lockout_expire_time: None,
            request_initiated_time: SystemTime::now(),
            transfer_start_time: None,
            transfer_complete_time: None,
            error_message: None,
        }
    }

    pub fn local_file_path(&self) -> PathBuf {
        self.local_folder.join(&self.file_name)
    }

    /// Correlation to put on messages this peer sends about the transfer.
    pub fn correlation(&self) -> TransferCorrelation {
        TransferCorrelation::new(self.transfer_response_code, self.id)
    }

    pub fn set_status(&mut self, next: TransferStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(FerryError::InvalidTransferState {
                transfer_id: self.id,
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        Ok(())
    }

    pub fn fail(&mut self, message: String) {
        self.status = TransferStatus::Error;
        self.error_message = Some(message);
    }

    /// Clears what a single attempt accumulated. Identity (ids, response
    /// code, direction, initiator, peer, file, folders) and retry bookkeeping
    /// are kept.
    pub fn reset_transient_fields(&mut self) {
        self.current_bytes = 0;
        self.chunk_count = 0;
        self.request_initiated_time = SystemTime::now();
        self.transfer_start_time = None;
        self.transfer_complete_time = None;
        self.error_message = None;
    }

    pub fn bytes_remaining(&self) -> u64 {
        self.file_size.saturating_sub(self.current_bytes)
    }

    pub fn percent_complete(&self) -> f32 {
        if self.file_size == 0 {
            return 1.0;
        }
        self.current_bytes as f32 / self.file_size as f32
    }

    pub fn lockout_active(&self, now: SystemTime) -> bool {
        self.retry_lockout_expire_time
            .map_or(false, |expires_at| now < expires_at)
    }

    pub fn lockout_expired(&self, now: SystemTime) -> bool {
        self.retry_lockout_expire_time
            .map_or(true, |expires_at| now >= expires_at)
    }

    pub fn elapsed(&self) -> Option<Duration> {
        let start = self.transfer_start_time?;
        let end = self.transfer_complete_time.unwrap_or_else(SystemTime::now);
        end.duration_since(start).ok()
    }

    /// Average bytes per second of the current attempt.
    pub fn transfer_rate(&self) -> Option<f64> {
        let elapsed = self.elapsed()?.as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }
        Some(self.current_bytes as f64 / elapsed)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn transfer() -> FileTransfer {
        FileTransfer::new(
            3,
            77,
            TransferDirection::Inbound,
            TransferInitiator::LocalServer,
            ServerInfo::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9000),
            "a.bin".to_string(),
            PathBuf::from("/tmp/in"),
            "/srv/out".to_string(),
        )
    }

    #[test]
    fn test_reset_keeps_identity_and_retry_counter() {
        let mut transfer = transfer();
        transfer.remote_server_transfer_id = 12;
        transfer.file_size = 10_000;
        transfer.current_bytes = 4_000;
        transfer.chunk_count = 4;
        transfer.retry_counter = 2;
        transfer.remote_server_retry_limit = 3;
        transfer.transfer_start_time = Some(SystemTime::now());
        transfer.transfer_complete_time = Some(SystemTime::now());
        transfer.error_message = Some("stalled".to_string());

        transfer.reset_transient_fields();

        assert_eq!(transfer.current_bytes, 0);
        assert_eq!(transfer.chunk_count, 0);
        assert!(transfer.transfer_start_time.is_none());
        assert!(transfer.transfer_complete_time.is_none());
        assert!(transfer.error_message.is_none());

        assert_eq!(transfer.id, 3);
        assert_eq!(transfer.remote_server_transfer_id, 12);
        assert_eq!(transfer.transfer_response_code, 77);
        assert_eq!(transfer.direction, TransferDirection::Inbound);
        assert_eq!(transfer.initiator, TransferInitiator::LocalServer);
        assert_eq!(transfer.file_name, "a.bin");
        assert_eq!(transfer.file_size, 10_000);
        assert_eq!(transfer.local_folder, PathBuf::from("/tmp/in"));
        assert_eq!(transfer.remote_folder, "/srv/out");
        assert_eq!(transfer.retry_counter, 2);
        assert_eq!(transfer.remote_server_retry_limit, 3);
    }

    #[test]
    fn test_status_transitions() {
        let mut transfer = transfer();

        assert!(transfer.set_status(TransferStatus::InProgress).is_err());
        transfer.set_status(TransferStatus::Accepted).unwrap();
        transfer.set_status(TransferStatus::InProgress).unwrap();
        transfer.set_status(TransferStatus::Stalled).unwrap();
        assert!(transfer.set_status(TransferStatus::ConfirmedComplete).is_err());
        transfer.set_status(TransferStatus::AwaitingResponse).unwrap();
        assert_eq!(transfer.status, TransferStatus::AwaitingResponse);
    }

    #[test]
    fn test_error_reachable_from_everywhere() {
        use TransferStatus::*;
        for status in [
            Pending,
            AwaitingResponse,
            Accepted,
            Rejected,
            InProgress,
            TransferComplete,
            ConfirmedComplete,
            Stalled,
            Cancelled,
            RetryLimitExceeded,
            Error,
        ] {
            assert!(status.can_transition_to(Error));
        }
    }

    #[test]
    fn test_terminal_states_stay_put() {
        use TransferStatus::*;
        for terminal in [ConfirmedComplete, Rejected] {
            for next in [
                Pending,
                AwaitingResponse,
                Accepted,
                InProgress,
                TransferComplete,
                Stalled,
                Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_lockout_boundaries() {
        let mut transfer = transfer();
        let now = SystemTime::now();

        assert!(!transfer.lockout_active(now));
        assert!(transfer.lockout_expired(now));

        transfer.retry_lockout_expire_time = Some(now + Duration::from_secs(60));
        assert!(transfer.lockout_active(now));
        assert!(!transfer.lockout_expired(now));

        let at_expiry = now + Duration::from_secs(60);
        assert!(!transfer.lockout_active(at_expiry));
        assert!(transfer.lockout_expired(at_expiry));
    }

    #[test]
    fn test_progress_figures() {
        let mut transfer = transfer();
        transfer.file_size = 10_000;
        transfer.current_bytes = 2_500;

        assert_eq!(transfer.bytes_remaining(), 7_500);
        assert!((transfer.percent_complete() - 0.25).abs() < f32::EPSILON);
    }
}
