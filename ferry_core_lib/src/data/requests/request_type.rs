use std::fmt;

use crate::errors::{FerryError, Result};

/// One-byte tag leading every encoded request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestType {
    ServerInfoRequest = 0,
    ServerInfoResponse = 1,
    TextMessage = 2,
    FileListRequest = 3,
    FileListResponse = 4,
    InboundFileTransferRequest = 5,
    OutboundFileTransferRequest = 6,
    FileTransferAccepted = 7,
    FileTransferRejected = 8,
    FileTransferStalled = 9,
    FileTransferComplete = 10,
    RetryOutboundFileTransfer = 11,
    RetryLimitExceeded = 12,
    RequestedFileDoesNotExist = 13,
    RequestedFolderDoesNotExist = 14,
    RequestedFolderIsEmpty = 15,
    ShutdownServerCommand = 16,
}

impl RequestType {
    pub fn from_byte(byte: u8) -> Result<RequestType> {
        let request_type = match byte {
            0 => RequestType::ServerInfoRequest,
            1 => RequestType::ServerInfoResponse,
            2 => RequestType::TextMessage,
            3 => RequestType::FileListRequest,
            4 => RequestType::FileListResponse,
            5 => RequestType::InboundFileTransferRequest,
            6 => RequestType::OutboundFileTransferRequest,
            7 => RequestType::FileTransferAccepted,
            8 => RequestType::FileTransferRejected,
            9 => RequestType::FileTransferStalled,
            10 => RequestType::FileTransferComplete,
            11 => RequestType::RetryOutboundFileTransfer,
            12 => RequestType::RetryLimitExceeded,
            13 => RequestType::RequestedFileDoesNotExist,
            14 => RequestType::RequestedFolderDoesNotExist,
            15 => RequestType::RequestedFolderIsEmpty,
            16 => RequestType::ShutdownServerCommand,
            _ => return Err(FerryError::UnknownRequestType(byte)),
        };

        Ok(request_type)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Requests that move file bytes over the socket they arrive on.
    pub fn is_long_running(self) -> bool {
        matches!(
            self,
            RequestType::FileTransferAccepted | RequestType::InboundFileTransferRequest
        )
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tag_maps_back_to_itself() {
        for byte in 0..=16_u8 {
            let request_type = RequestType::from_byte(byte).unwrap();
            assert_eq!(request_type.as_byte(), byte);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            RequestType::from_byte(17),
            Err(FerryError::UnknownRequestType(17))
        ));
        assert!(matches!(
            RequestType::from_byte(255),
            Err(FerryError::UnknownRequestType(255))
        ));
    }
}
