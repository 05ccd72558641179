use std::{sync::Arc, time::SystemTime};

use ferry_core_lib::{
    data::{requests::Request, Conversation, ServerInfo},
    transfers::{FileTransfer, TransferDirection, TransferStatus},
    Result,
};

use crate::peer::PeerContext;

/// Read-only views over a running peer's transfers, requests and
/// conversations. Every call returns a snapshot.
#[derive(Clone)]
pub struct SessionState {
    context: Arc<PeerContext>,
}

impl SessionState {
    pub fn new(context: Arc<PeerContext>) -> SessionState {
        SessionState { context }
    }

    pub fn transfer(&self, transfer_id: u32) -> Result<FileTransfer> {
        self.context.engine.transfer(transfer_id)
    }

    pub fn transfers(&self) -> Vec<FileTransfer> {
        self.context.engine.transfers()
    }

    /// Inbound transfers offered by a peer and waiting for accept or reject.
    pub fn pending_inbound_transfers(&self) -> Vec<FileTransfer> {
        self.context
            .engine
            .with_status(TransferStatus::Pending)
            .into_iter()
            .filter(|transfer| transfer.direction == TransferDirection::Inbound)
            .collect()
    }

    pub fn stalled_transfers(&self) -> Vec<FileTransfer> {
        self.context.engine.with_status(TransferStatus::Stalled)
    }

    /// Transfers whose retry lockout is still running at `now`.
    pub fn transfers_in_lockout(&self, now: SystemTime) -> Vec<FileTransfer> {
        self.context
            .engine
            .with_status(TransferStatus::RetryLimitExceeded)
            .into_iter()
            .filter(|transfer| transfer.lockout_active(now))
            .collect()
    }

    pub fn queued_requests(&self) -> Vec<Request> {
        self.context.pipeline.queued_requests()
    }

    pub fn request_log(&self) -> Vec<Request> {
        self.context.pipeline.log().snapshot()
    }

    pub fn is_busy(&self) -> bool {
        self.context.pipeline.is_busy()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.context.conversations.lock().all().to_vec()
    }

    pub fn conversation_with(&self, remote_server: &ServerInfo) -> Option<Conversation> {
        self.context
            .conversations
            .lock()
            .with_peer(remote_server)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::{IpAddr, Ipv4Addr},
        time::Duration,
    };

    use ferry_core_lib::data::{
        requests::{RequestDirection, TransferCorrelation},
        Settings,
    };

    use super::*;
    use crate::{events::EventSender, transfers::TransferOffer};

    fn context(folder: &std::path::Path) -> Arc<PeerContext> {
        let settings = Settings {
            transfer_folder: folder.to_path_buf(),
            lan_cidr: String::new(),
            ..Settings::default()
        };
        let local_server = PeerContext::local_server_for(&settings, 7000);
        Arc::new(PeerContext::new(settings, local_server, EventSender::new(16)).unwrap())
    }

    fn remote() -> ServerInfo {
        ServerInfo::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 7100)
    }

    #[tokio::test]
    async fn test_unsolicited_offer_is_pending() {
        let folder = tempfile::tempdir().unwrap();
        let context = context(folder.path());
        let session = SessionState::new(context.clone());

        context
            .engine
            .handle_inbound_offer(
                &remote(),
                TransferOffer {
                    correlation: TransferCorrelation::new(55, 2),
                    retry_counter: 0,
                    retry_limit: 3,
                    file_name: "notes.txt".to_string(),
                    file_size: 120,
                    source_folder: "/remote".to_string(),
                    destination_folder: String::new(),
                },
            )
            .await
            .unwrap();

        let pending = session.pending_inbound_transfers();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].file_name, "notes.txt");
        assert_eq!(pending[0].local_folder, folder.path());
        assert_eq!(pending[0].remote_server_transfer_id, 2);
        assert!(session.stalled_transfers().is_empty());
        assert!(session.transfers_in_lockout(SystemTime::now()).is_empty());
    }

    #[tokio::test]
    async fn test_lockout_view_follows_expiry() {
        let folder = tempfile::tempdir().unwrap();
        let context = context(folder.path());
        let session = SessionState::new(context.clone());

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let unreachable = ServerInfo::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        drop(listener);
        assert!(context.engine.initiate_inbound(&unreachable, "big.iso", "").await.is_err());
        let transfer_id = session.transfers()[0].id;
        assert_eq!(session.transfer(transfer_id).unwrap().status, TransferStatus::Error);

        let expires_at = SystemTime::now() + Duration::from_secs(60);
        let code = session.transfer(transfer_id).unwrap().transfer_response_code;
        context
            .engine
            .handle_retry_limit_exceeded(
                TransferCorrelation::new(code, 9),
                2,
                ferry_core_lib::data::unix_millis(expires_at),
            )
            .unwrap();

        assert_eq!(session.transfers_in_lockout(SystemTime::now()).len(), 1);
        assert!(session
            .transfers_in_lockout(expires_at + Duration::from_secs(1))
            .is_empty());
    }

    #[test]
    fn test_conversations_grouped_by_peer() {
        let folder = tempfile::tempdir().unwrap();
        let context = context(folder.path());
        let session = SessionState::new(context.clone());

        let mut same_peer = remote();
        same_peer.public_ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5));
        {
            let mut conversations = context.conversations.lock();
            conversations.append(&remote(), RequestDirection::Sent, "hi".to_string());
            conversations.append(&same_peer, RequestDirection::Received, "hello".to_string());
        }

        assert_eq!(session.conversations().len(), 1);
        assert_eq!(session.conversation_with(&remote()).unwrap().messages.len(), 2);
    }
}
