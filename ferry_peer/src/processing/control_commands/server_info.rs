use async_trait::async_trait;
use ferry_core_lib::{data::requests::RequestBody, Result};

use crate::{events::ServerEvent, peer::PeerContext};

use super::{ControlCommand, RequestOrigin};

pub struct ServerInfoRequestCommand {}

#[async_trait]
impl ControlCommand for ServerInfoRequestCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        let local_server = &context.local_server;
        let response = RequestBody::ServerInfoResponse {
            name: local_server.name.clone(),
            platform: local_server.platform.clone(),
            transfer_folder: local_server.transfer_folder.clone(),
        };

        debug!("Sending server info to {}", origin.remote_server);
        context.sender.send(&origin.remote_server, response).await
    }
}

pub struct ServerInfoResponseCommand {
    pub name: String,
    pub platform: String,
    pub transfer_folder: String,
}

#[async_trait]
impl ControlCommand for ServerInfoResponseCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        let mut remote_server = origin.remote_server;
        remote_server.name = self.name.clone();
        remote_server.platform = self.platform.clone();
        remote_server.transfer_folder = self.transfer_folder.clone();

        context
            .events
            .send(ServerEvent::ServerInfoReceived { remote_server });
        Ok(())
    }
}
