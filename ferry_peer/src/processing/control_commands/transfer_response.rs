use async_trait::async_trait;
use ferry_core_lib::{data::requests::TransferCorrelation, Result};

use crate::peer::PeerContext;

use super::{ControlCommand, RequestOrigin};

/// The receiver accepted; the connection it sent this on carries the file.
pub struct TransferAcceptedCommand {
    pub correlation: TransferCorrelation,
}

#[async_trait]
impl ControlCommand for TransferAcceptedCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        context
            .engine
            .handle_transfer_accepted(self.correlation, origin.connection.stream, origin.leftover)
            .await
    }
}

pub enum TransferOutcome {
    Rejected,
    Stalled,
    Complete,
    FileMissing,
    FolderMissing(String),
}

/// Every other answer about a transfer only updates the local record.
pub struct TransferResponseCommand {
    pub correlation: TransferCorrelation,
    pub outcome: TransferOutcome,
}

#[async_trait]
impl ControlCommand for TransferResponseCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        let engine = &context.engine;

        match &self.outcome {
            TransferOutcome::Rejected => engine.handle_transfer_rejected(self.correlation),
            TransferOutcome::Stalled => engine.handle_transfer_stalled(self.correlation),
            TransferOutcome::Complete => engine.handle_transfer_complete(self.correlation),
            TransferOutcome::FileMissing => engine.handle_file_missing(self.correlation),
            TransferOutcome::FolderMissing(folder) => engine.handle_folder_missing(
                &origin.remote_server,
                self.correlation,
                folder.clone(),
            ),
        }
    }
}
