mod engine;
pub use engine::{FileTransferEngine, TransferOffer};
mod streaming;
pub use streaming::{receive_file_bytes, send_file_bytes, ReceiveOutcome};
