use std::{net::SocketAddr, time::SystemTime};

use ferry_core_lib::data::{
    requests::{FileEntry, RequestType},
    ServerInfo,
};
use tokio::sync::broadcast;

#[derive(Clone, Debug)]
pub enum ServerEvent {
    ListenerStarted { address: SocketAddr },
    ConnectionAccepted { remote_address: SocketAddr },
    RequestSent { request_type: RequestType, remote_server: ServerInfo },
    RequestReceived { request_id: u32, request_type: RequestType, remote_server: ServerInfo },
    RequestQueued { request_id: u32, backlog_length: usize },
    RequestProcessed { request_id: u32 },

    ServerInfoReceived { remote_server: ServerInfo },
    TextMessageReceived { remote_server: ServerInfo, text: String },
    FileListReceived { remote_server: ServerInfo, folder: String, files: Vec<FileEntry> },
    RemoteFolderMissing { remote_server: ServerInfo, folder: String },
    RemoteFolderEmpty { remote_server: ServerInfo, folder: String },

    InboundTransferPending { transfer_id: u32, file_name: String, file_size: u64 },
    TransferAccepted { transfer_id: u32 },
    TransferRejected { transfer_id: u32 },
    TransferStarted { transfer_id: u32 },
    TransferProgress { transfer_id: u32, current_bytes: u64, file_size: u64 },
    TransferComplete { transfer_id: u32 },
    TransferConfirmed { transfer_id: u32 },
    TransferStalled { transfer_id: u32, current_bytes: u64 },
    TransferCancelled { transfer_id: u32 },
    RemoteFileMissing { transfer_id: u32, file_name: String },
    RetryRequested { transfer_id: u32 },
    RetryStarted { transfer_id: u32, retry_counter: u32 },
    RetryLimitExceeded { transfer_id: u32, retry_limit: u32, lockout_expires_at: SystemTime },

    ShutdownStarted,
    Error { message: String },
}

/// Fan-out of server events. Sending never waits for subscribers and never
/// fails when nobody listens.
#[derive(Clone)]
pub struct EventSender {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventSender {
    pub fn new(capacity: usize) -> EventSender {
        let (sender, _) = broadcast::channel(capacity);
        EventSender { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    pub fn send(&self, event: ServerEvent) {
        match &event {
            ServerEvent::TransferProgress { .. } | ServerEvent::RequestQueued { .. } => {
                debug!("{:?}", event)
            }
            ServerEvent::Error { message } => warn!("{}", message),
            _ => info!("{:?}", event),
        }

        let _ = self.sender.send(event);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(ServerEvent::Error {
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_subscribers() {
        let events = EventSender::new(4);
        events.send(ServerEvent::ShutdownStarted);
    }

    #[tokio::test]
    async fn test_subscriber_receives_in_order() {
        let events = EventSender::new(4);
        let mut receiver = events.subscribe();

        events.send(ServerEvent::TransferStarted { transfer_id: 1 });
        events.error("boom");

        assert!(matches!(
            receiver.recv().await.unwrap(),
            ServerEvent::TransferStarted { transfer_id: 1 }
        ));
        assert!(matches!(receiver.recv().await.unwrap(), ServerEvent::Error { .. }));
    }
}
