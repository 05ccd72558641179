use async_trait::async_trait;
use ferry_core_lib::{FerryError, Result};

use crate::{events::ServerEvent, peer::PeerContext};

use super::{ControlCommand, RequestOrigin};

/// Stops the peer, but only when the command claims to come from this very
/// server.
pub struct ShutdownCommand {}

#[async_trait]
impl ControlCommand for ShutdownCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        if !origin.remote_server.is_same_peer(&context.local_server) {
            warn!(
                "Refusing shutdown from {} ({})",
                origin.remote_server, origin.connection.remote_address
            );
            return Err(FerryError::IdentityMismatch);
        }

        context.events.send(ServerEvent::ShutdownStarted);
        context.shutdown.cancel();
        Ok(())
    }
}
