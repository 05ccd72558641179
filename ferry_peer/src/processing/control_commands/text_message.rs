use async_trait::async_trait;
use ferry_core_lib::{data::requests::RequestDirection, Result};

use crate::{events::ServerEvent, peer::PeerContext};

use super::{ControlCommand, RequestOrigin};

pub struct TextMessageCommand {
    pub text: String,
}

#[async_trait]
impl ControlCommand for TextMessageCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        context
            .conversations
            .lock()
            .append(&origin.remote_server, RequestDirection::Received, self.text.clone());

        context.events.send(ServerEvent::TextMessageReceived {
            remote_server: origin.remote_server,
            text: self.text.clone(),
        });
        Ok(())
    }
}
