use std::{path::Path, sync::Arc};

use ferry_core_lib::{
    data::{
        requests::{RequestBody, RequestDirection},
        ServerInfo, Settings,
    },
    Result,
};
use tokio::{
    fs,
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

use crate::{
    connectivity::{AcceptedConnection, ConnectionListener},
    events::{EventSender, ServerEvent},
    processing::RequestHandler,
    session::SessionState,
};

mod context;
pub use context::PeerContext;

const EVENT_CAPACITY: usize = 1024;
const HANDOFF_CAPACITY: usize = 64;

/// A running peer: listens for requests, processes them one at a time and
/// exposes the operations a user can start.
pub struct Peer {
    context: Arc<PeerContext>,
    tasks: Vec<JoinHandle<()>>,
}

impl Peer {
    pub async fn start(settings: Settings) -> Result<Peer> {
        settings.validate()?;
        fs::create_dir_all(&settings.transfer_folder).await?;

        let events = EventSender::new(EVENT_CAPACITY);
        let listener = ConnectionListener::bind(&settings, events.clone()).await?;
        let port = listener.local_addr()?.port();

        let local_server = PeerContext::local_server_for(&settings, port);
        let context = Arc::new(PeerContext::new(settings, local_server, events)?);
        info!("Peer {} listening on port {}", context.local_server.name, port);

        let (handoff, accepted) = mpsc::channel(HANDOFF_CAPACITY);
        let tasks = vec![
            tokio::spawn(listener.listen_for_connections(handoff, context.shutdown.clone())),
            tokio::spawn(hand_off_connections(context.clone(), accepted)),
            tokio::spawn(process_requests(context.clone())),
        ];

        Ok(Peer { context, tasks })
    }

    pub fn local_server(&self) -> &ServerInfo {
        &self.context.local_server
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.context.events.subscribe()
    }

    pub fn session(&self) -> SessionState {
        SessionState::new(self.context.clone())
    }

    pub async fn request_server_info(&self, remote_server: &ServerInfo) -> Result<()> {
        self.context
            .sender
            .send(remote_server, RequestBody::ServerInfoRequest)
            .await
    }

    pub async fn send_text(&self, remote_server: &ServerInfo, text: &str) -> Result<()> {
        self.context
            .sender
            .send(
                remote_server,
                RequestBody::TextMessage {
                    text: text.to_string(),
                },
            )
            .await?;

        self.context
            .conversations
            .lock()
            .append(remote_server, RequestDirection::Sent, text.to_string());
        Ok(())
    }

    pub async fn request_file_list(&self, remote_server: &ServerInfo, folder: &str) -> Result<()> {
        self.context
            .sender
            .send(
                remote_server,
                RequestBody::FileListRequest {
                    folder: folder.to_string(),
                },
            )
            .await
    }

    /// Offers a local file. Returns the local transfer id.
    pub async fn send_file(
        &self,
        remote_server: &ServerInfo,
        local_path: &Path,
        remote_folder: &str,
    ) -> Result<u32> {
        self.context
            .engine
            .initiate_outbound(remote_server, local_path, remote_folder)
            .await
    }

    /// Asks for a remote file. Returns the local transfer id.
    pub async fn get_file(
        &self,
        remote_server: &ServerInfo,
        file_name: &str,
        remote_folder: &str,
    ) -> Result<u32> {
        self.context
            .engine
            .initiate_inbound(remote_server, file_name, remote_folder)
            .await
    }

    /// Accepts a pending inbound transfer and receives it. Queued requests
    /// wait until the file is in.
    pub async fn accept_transfer(&self, transfer_id: u32) -> Result<()> {
        let _processing = self.context.pipeline.begin_processing().await;
        self.context.engine.accept_inbound(transfer_id).await
    }

    pub async fn reject_transfer(&self, transfer_id: u32) -> Result<()> {
        self.context.engine.reject_inbound(transfer_id).await
    }

    pub async fn retry_transfer(&self, transfer_id: u32) -> Result<()> {
        self.context.engine.retry_transfer(transfer_id).await
    }

    /// Sends the shutdown command to this peer, which stops once it is
    /// processed.
    pub async fn shutdown(&self) -> Result<()> {
        self.context
            .sender
            .send(&self.context.local_server, RequestBody::ShutdownServerCommand)
            .await
    }

    pub fn is_running(&self) -> bool {
        !self.context.shutdown.is_cancelled()
    }

    /// Waits for the listener and the processing loop to stop.
    pub async fn wait(mut self) {
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                error!("Peer task ended abnormally: {}", e);
            }
        }
        info!("Peer {} stopped", self.context.local_server);
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        self.context.shutdown.cancel();
    }
}

async fn hand_off_connections(
    context: Arc<PeerContext>,
    mut accepted: mpsc::Receiver<AcceptedConnection>,
) {
    loop {
        let connection = tokio::select! {
            _ = context.shutdown.cancelled() => break,
            connection = accepted.recv() => match connection {
                Some(connection) => connection,
                None => break,
            },
        };

        let context = context.clone();
        tokio::spawn(async move {
            context.pipeline.receive(connection).await;
        });
    }
}

async fn process_requests(context: Arc<PeerContext>) {
    let handler = RequestHandler {};

    loop {
        tokio::select! {
            _ = context.shutdown.cancelled() => break,
            _ = context.pipeline.wait_for_request() => {}
        }

        let processing = context.pipeline.begin_processing().await;
        let request = match context.pipeline.take_request(&processing) {
            Some(request) => request,
            None => continue,
        };
        let request_id = request.request_id;
        context.pipeline.start(request_id);

        let result = handler.handle(&context, request).await;
        context.pipeline.finish(request_id, &result);
    }

    debug!(
        "Processing stopped with {} requests in the backlog",
        context.pipeline.backlog_length()
    );
}
