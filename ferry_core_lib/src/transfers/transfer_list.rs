use std::path::PathBuf;

use rand::Rng;

use crate::{
    data::ServerInfo,
    errors::{FerryError, Result},
};

use super::{FileTransfer, TransferDirection, TransferInitiator, TransferStatus};

/// Every transfer known to this peer, keyed by local id and by response code.
#[derive(Default)]
pub struct TransferList {
    transfers: Vec<FileTransfer>,
    next_transfer_id: u32,
}

impl TransferList {
    pub fn new() -> TransferList {
        TransferList::default()
    }

    /// Creates a transfer with a fresh local id. A response code of `None`
    /// means this peer initiates and picks a new random code.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        transfer_response_code: Option<u64>,
        direction: TransferDirection,
        initiator: TransferInitiator,
        remote_server: ServerInfo,
        file_name: String,
        local_folder: PathBuf,
        remote_folder: String,
    ) -> &mut FileTransfer {
        self.next_transfer_id += 1;
        let code = transfer_response_code.unwrap_or_else(|| self.new_response_code());

        self.transfers.push(FileTransfer::new(
            self.next_transfer_id,
            code,
            direction,
            initiator,
            remote_server,
            file_name,
            local_folder,
            remote_folder,
        ));

        let index = self.transfers.len() - 1;
        &mut self.transfers[index]
    }

    fn new_response_code(&self) -> u64 {
        let mut rng = rand::thread_rng();
        loop {
            let code: u64 = rng.gen_range(1..u64::MAX);
            if self.by_response_code(code).is_none() {
                return code;
            }
        }
    }

    pub fn get(&self, transfer_id: u32) -> Result<&FileTransfer> {
        self.transfers
            .iter()
            .find(|transfer| transfer.id == transfer_id)
            .ok_or(FerryError::TransferNotFound(transfer_id))
    }

    pub fn get_mut(&mut self, transfer_id: u32) -> Result<&mut FileTransfer> {
        self.transfers
            .iter_mut()
            .find(|transfer| transfer.id == transfer_id)
            .ok_or(FerryError::TransferNotFound(transfer_id))
    }

    pub fn by_response_code(&self, code: u64) -> Option<&FileTransfer> {
        self.transfers
            .iter()
            .find(|transfer| transfer.transfer_response_code == code)
    }

    pub fn by_response_code_mut(&mut self, code: u64) -> Result<&mut FileTransfer> {
        self.transfers
            .iter_mut()
            .find(|transfer| transfer.transfer_response_code == code)
            .ok_or(FerryError::UnknownResponseCode(code))
    }

    pub fn all(&self) -> &[FileTransfer] {
        &self.transfers
    }

    pub fn with_status(&self, status: TransferStatus) -> Vec<FileTransfer> {
        self.transfers
            .iter()
            .filter(|transfer| transfer.status == status)
            .cloned()
            .collect()
    }

    pub fn has_active_transfer(&self) -> bool {
        self.transfers.iter().any(|transfer| transfer.status.is_active())
    }
}
