use ferry_core_lib::{
    data::{Cidr, ConversationLog, ServerInfo, Settings},
    Result,
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    connectivity::RequestSender,
    events::EventSender,
    processing::{RequestLog, RequestPipeline},
    transfers::FileTransferEngine,
};

/// Everything a running peer shares between its listener, its processing
/// loop and the caller-facing [`super::Peer`].
pub struct PeerContext {
    pub settings: Settings,
    pub lan: Option<Cidr>,
    pub local_server: ServerInfo,
    pub events: EventSender,
    pub sender: RequestSender,
    pub pipeline: RequestPipeline,
    pub engine: FileTransferEngine,
    pub conversations: Mutex<ConversationLog>,
    pub shutdown: CancellationToken,
}

impl PeerContext {
    pub fn new(
        settings: Settings,
        local_server: ServerInfo,
        events: EventSender,
    ) -> Result<PeerContext> {
        settings.validate()?;

        let log = RequestLog::new();
        let sender = RequestSender::new(
            local_server.clone(),
            settings.socket_timeout,
            log.clone(),
            events.clone(),
        );
        let pipeline = RequestPipeline::new(&settings, log, events.clone())?;
        let shutdown = CancellationToken::new();
        let engine = FileTransferEngine::new(
            settings.clone(),
            sender.clone(),
            events.clone(),
            shutdown.child_token(),
        );

        Ok(PeerContext {
            lan: settings.lan()?,
            settings,
            local_server,
            events,
            sender,
            pipeline,
            engine,
            conversations: Mutex::new(ConversationLog::new()),
            shutdown,
        })
    }

    /// The identity other peers see: configured addresses and the port
    /// actually bound.
    pub fn local_server_for(settings: &Settings, port: u16) -> ServerInfo {
        let mut local_server = ServerInfo::new(settings.local_ip, port);
        local_server.name = settings.server_name.clone();
        local_server.public_ip = settings.public_ip;
        local_server.platform = std::env::consts::OS.to_string();
        local_server.transfer_folder = settings.transfer_folder.display().to_string();
        local_server
    }
}
