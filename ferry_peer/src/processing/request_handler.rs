use ferry_core_lib::{data::requests::RequestBody, Result};

use crate::{peer::PeerContext, transfers::TransferOffer};

use super::{
    control_commands::{
        ControlCommand, FileListRequestCommand, FileListResponseCommand, FolderIsEmptyCommand,
        InboundTransferRequestCommand, OutboundTransferRequestCommand, RequestOrigin,
        RetryLimitExceededCommand, RetryTransferCommand, ServerInfoRequestCommand,
        ServerInfoResponseCommand, ShutdownCommand, TextMessageCommand, TransferAcceptedCommand,
        TransferOutcome, TransferResponseCommand,
    },
    QueuedRequest,
};

/// Dispatches a queued request to the command for its type.
pub struct RequestHandler {}

impl RequestHandler {
    pub fn command_for(body: RequestBody) -> Box<dyn ControlCommand> {
        match body {
            RequestBody::ServerInfoRequest => Box::new(ServerInfoRequestCommand {}),
            RequestBody::ServerInfoResponse {
                name,
                platform,
                transfer_folder,
            } => Box::new(ServerInfoResponseCommand {
                name,
                platform,
                transfer_folder,
            }),
            RequestBody::TextMessage { text } => Box::new(TextMessageCommand { text }),
            RequestBody::FileListRequest { folder } => Box::new(FileListRequestCommand { folder }),
            RequestBody::FileListResponse { folder, files } => {
                Box::new(FileListResponseCommand { folder, files })
            }
            RequestBody::InboundFileTransferRequest {
                correlation,
                retry_counter,
                retry_limit,
                file_name,
                file_size,
                source_folder,
                destination_folder,
            } => Box::new(InboundTransferRequestCommand {
                offer: TransferOffer {
                    correlation,
                    retry_counter,
                    retry_limit,
                    file_name,
                    file_size,
                    source_folder,
                    destination_folder,
                },
            }),
            RequestBody::OutboundFileTransferRequest {
                correlation,
                file_name,
                source_folder,
                destination_folder,
            } => Box::new(OutboundTransferRequestCommand {
                correlation,
                file_name,
                source_folder,
                destination_folder,
            }),
            RequestBody::FileTransferAccepted(correlation) => {
                Box::new(TransferAcceptedCommand { correlation })
            }
            RequestBody::FileTransferRejected(correlation) => Box::new(TransferResponseCommand {
                correlation,
                outcome: TransferOutcome::Rejected,
            }),
            RequestBody::FileTransferStalled(correlation) => Box::new(TransferResponseCommand {
                correlation,
                outcome: TransferOutcome::Stalled,
            }),
            RequestBody::FileTransferComplete(correlation) => Box::new(TransferResponseCommand {
                correlation,
                outcome: TransferOutcome::Complete,
            }),
            RequestBody::RequestedFileDoesNotExist(correlation) => {
                Box::new(TransferResponseCommand {
                    correlation,
                    outcome: TransferOutcome::FileMissing,
                })
            }
            RequestBody::RequestedFolderDoesNotExist { correlation, folder } => {
                Box::new(TransferResponseCommand {
                    correlation,
                    outcome: TransferOutcome::FolderMissing(folder),
                })
            }
            RequestBody::RequestedFolderIsEmpty { folder } => {
                Box::new(FolderIsEmptyCommand { folder })
            }
            RequestBody::RetryOutboundFileTransfer(correlation) => {
                Box::new(RetryTransferCommand { correlation })
            }
            RequestBody::RetryLimitExceeded {
                correlation,
                retry_limit,
                lockout_expires_at,
            } => Box::new(RetryLimitExceededCommand {
                correlation,
                retry_limit,
                lockout_expires_at,
            }),
            RequestBody::ShutdownServerCommand => Box::new(ShutdownCommand {}),
        }
    }

    pub async fn handle(&self, context: &PeerContext, request: QueuedRequest) -> Result<()> {
        let QueuedRequest {
            request_id,
            remote_server,
            body,
            connection,
            leftover,
        } = request;

        debug!(
            "Processing request {} ({}) from {}",
            request_id,
            body.request_type(),
            remote_server
        );

        let command = RequestHandler::command_for(body);
        command
            .execute(
                context,
                RequestOrigin {
                    remote_server,
                    connection,
                    leftover,
                },
            )
            .await
    }
}
