use std::{io, path::PathBuf, time::SystemTime};

use crate::transfers::TransferStatus;

pub type Result<T> = std::result::Result<T, FerryError>;

#[derive(Debug, thiserror::Error)]
pub enum FerryError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("unknown request type tag {0}")]
    UnknownRequestType(u8),

    #[error("local file does not exist: {}", .0.display())]
    LocalFileMissing(PathBuf),

    #[error("remote file does not exist: {0}")]
    RemoteFileMissing(String),

    #[error("folder does not exist: {0}")]
    FolderMissing(String),

    #[error("folder is empty: {0}")]
    FolderEmpty(String),

    #[error("transfer {transfer_id} stalled after {bytes_received} bytes")]
    TransferStalled { transfer_id: u32, bytes_received: u64 },

    #[error("retry limit of {retry_limit} exceeded, locked out until {lockout_expires_at:?}")]
    RetryLimitExceeded {
        retry_limit: u32,
        lockout_expires_at: SystemTime,
    },

    #[error("socket failure: {0}")]
    SocketFailure(#[from] io::Error),

    #[error("shutdown command did not originate from this server")]
    IdentityMismatch,

    #[error("no transfer with id {0}")]
    TransferNotFound(u32),

    #[error("no transfer with response code {0}")]
    UnknownResponseCode(u64),

    #[error("transfer {transfer_id} cannot move from {from:?} to {to:?}")]
    InvalidTransferState {
        transfer_id: u32,
        from: TransferStatus,
        to: TransferStatus,
    },

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl FerryError {
    /// Protocol errors are confined to the connection they arrived on.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            FerryError::MalformedFrame(_) | FerryError::UnknownRequestType(_)
        )
    }
}
