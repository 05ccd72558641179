mod file_transfer;
pub use file_transfer::{FileTransfer, TransferDirection, TransferInitiator, TransferStatus};
mod progress;
pub use progress::ProgressTracker;
mod retry_policy;
pub use retry_policy::{apply_retry_policy, RetryDecision};
mod transfer_list;
pub use transfer_list::TransferList;
