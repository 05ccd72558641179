use async_trait::async_trait;
use ferry_core_lib::{data::requests::TransferCorrelation, Result};

use crate::{peer::PeerContext, transfers::TransferOffer};

use super::{ControlCommand, RequestOrigin};

/// "Please receive this file."
pub struct InboundTransferRequestCommand {
    pub offer: TransferOffer,
}

#[async_trait]
impl ControlCommand for InboundTransferRequestCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        debug!(
            "{} offers {} ({} bytes)",
            origin.remote_server, self.offer.file_name, self.offer.file_size
        );
        context
            .engine
            .handle_inbound_offer(&origin.remote_server, self.offer.clone())
            .await
    }
}

/// "Please send me this file."
pub struct OutboundTransferRequestCommand {
    pub correlation: TransferCorrelation,
    pub file_name: String,
    pub source_folder: String,
    pub destination_folder: String,
}

#[async_trait]
impl ControlCommand for OutboundTransferRequestCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        debug!("{} asks for {}", origin.remote_server, self.file_name);
        context
            .engine
            .handle_outbound_request(
                &origin.remote_server,
                self.correlation,
                &self.file_name,
                &self.source_folder,
                &self.destination_folder,
            )
            .await
    }
}
