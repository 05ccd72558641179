use std::time::SystemTime;

use crate::data::ServerInfo;

use super::{RequestBody, RequestType};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestDirection {
    Sent,
    Received,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestStatus {
    NoData,
    Pending,
    InProgress,
    Processed,
    Sent,
    Error,
}

impl RequestStatus {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            RequestStatus::Processed | RequestStatus::Sent | RequestStatus::Error
        )
    }
}

/// A control message that was sent or received, as kept in the request log.
#[derive(Clone, Debug)]
pub struct Request {
    pub id: u32,
    pub direction: RequestDirection,
    pub status: RequestStatus,
    pub timestamp: SystemTime,
    pub remote_server: ServerInfo,
    pub body: RequestBody,
    pub error_message: Option<String>,
}

impl Request {
    pub fn new(
        id: u32,
        direction: RequestDirection,
        remote_server: ServerInfo,
        body: RequestBody,
    ) -> Request {
        Request {
            id,
            direction,
            status: RequestStatus::NoData,
            timestamp: SystemTime::now(),
            remote_server,
            body,
            error_message: None,
        }
    }

    pub fn request_type(&self) -> RequestType {
        self.body.request_type()
    }

    /// Returns false when the request already reached a final status.
    pub fn update_status(&mut self, status: RequestStatus) -> bool {
        if self.status.is_final() {
            return false;
        }
        self.status = status;
        true
    }

    pub fn fail(&mut self, message: String) -> bool {
        if !self.update_status(RequestStatus::Error) {
            return false;
        }
        self.error_message = Some(message);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    #[test]
    fn test_final_status_is_immutable() {
        let remote = ServerInfo::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9000);
        let body = RequestBody::ServerInfoRequest;
        let mut request = Request::new(1, RequestDirection::Received, remote, body);

        assert_eq!(request.status, RequestStatus::NoData);
        assert!(!request.status.is_final());
        assert!(request.update_status(RequestStatus::Pending));
        assert!(request.update_status(RequestStatus::InProgress));
        assert!(request.update_status(RequestStatus::Processed));
        assert!(!request.update_status(RequestStatus::Pending));
        assert!(!request.fail("late failure".to_string()));
        assert_eq!(request.status, RequestStatus::Processed);
        assert!(request.error_message.is_none());
    }
}
