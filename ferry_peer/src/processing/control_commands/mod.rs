mod control_command;
pub use control_command::{ControlCommand, RequestOrigin};
mod file_list;
pub use file_list::{FileListRequestCommand, FileListResponseCommand, FolderIsEmptyCommand};
mod retry;
pub use retry::{RetryLimitExceededCommand, RetryTransferCommand};
mod server_info;
pub use server_info::{ServerInfoRequestCommand, ServerInfoResponseCommand};
mod shutdown;
pub use shutdown::ShutdownCommand;
mod text_message;
pub use text_message::TextMessageCommand;
mod transfer_request;
pub use transfer_request::{InboundTransferRequestCommand, OutboundTransferRequestCommand};
mod transfer_response;
pub use transfer_response::{TransferAcceptedCommand, TransferOutcome, TransferResponseCommand};
