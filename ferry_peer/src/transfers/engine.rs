use std::{
    io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use ferry_core_lib::{
    data::{
        from_unix_millis,
        requests::{RequestBody, TransferCorrelation},
        unix_millis, ServerInfo, Settings,
    },
    transfers::{
        apply_retry_policy, FileTransfer, ProgressTracker, RetryDecision, TransferDirection,
        TransferInitiator, TransferList, TransferStatus,
    },
    FerryError, Result,
};
use parking_lot::Mutex;
use tokio::{fs, net::TcpStream};
use tokio_util::sync::CancellationToken;

use crate::{
    connectivity::RequestSender,
    events::{EventSender, ServerEvent},
};

use super::streaming::{receive_file_bytes, send_file_bytes, ReceiveOutcome};

/// Details of a transfer offer received from the file's source.
#[derive(Clone, Debug)]
pub struct TransferOffer {
    pub correlation: TransferCorrelation,
    pub retry_counter: u32,
    pub retry_limit: u32,
    pub file_name: String,
    pub file_size: u64,
    pub source_folder: String,
    pub destination_folder: String,
}

/// Owns every [`FileTransfer`] of this peer and drives them through the
/// protocol. Callers serialize access through the request pipeline, so at most
/// one transfer moves bytes at a time.
pub struct FileTransferEngine {
    settings: Settings,
    transfers: Mutex<TransferList>,
    sender: RequestSender,
    events: EventSender,
    cancel: CancellationToken,
}

impl FileTransferEngine {
    pub fn new(
        settings: Settings,
        sender: RequestSender,
        events: EventSender,
        cancel: CancellationToken,
    ) -> FileTransferEngine {
        FileTransferEngine {
            settings,
            transfers: Mutex::new(TransferList::new()),
            sender,
            events,
            cancel,
        }
    }

    pub fn transfer(&self, transfer_id: u32) -> Result<FileTransfer> {
        self.transfers.lock().get(transfer_id).cloned()
    }

    pub fn transfers(&self) -> Vec<FileTransfer> {
        self.transfers.lock().all().to_vec()
    }

    pub fn with_status(&self, status: TransferStatus) -> Vec<FileTransfer> {
        self.transfers.lock().with_status(status)
    }

    fn update<T>(
        &self,
        transfer_id: u32,
        f: impl FnOnce(&mut FileTransfer) -> Result<T>,
    ) -> Result<T> {
        let mut transfers = self.transfers.lock();
        f(transfers.get_mut(transfer_id)?)
    }

    fn update_by_code<T>(
        &self,
        code: u64,
        f: impl FnOnce(&mut FileTransfer) -> Result<T>,
    ) -> Result<T> {
        let mut transfers = self.transfers.lock();
        f(transfers.by_response_code_mut(code)?)
    }

    fn fail(&self, transfer_id: u32, error: &FerryError) {
        let _ = self.update(transfer_id, |transfer| {
            transfer.fail(error.to_string());
            Ok(())
        });
        self.events
            .error(format!("Transfer {} failed: {}", transfer_id, error));
    }

    async fn send_or_fail(
        &self,
        transfer_id: u32,
        remote_server: &ServerInfo,
        body: RequestBody,
    ) -> Result<()> {
        if let Err(e) = self.sender.send(remote_server, body).await {
            self.fail(transfer_id, &e);
            return Err(e);
        }
        Ok(())
    }

    fn folder_or_default(&self, folder: &str) -> PathBuf {
        if folder.is_empty() {
            self.settings.transfer_folder.clone()
        } else {
            PathBuf::from(folder)
        }
    }

    /// SendFile: offers a local file to `remote_server`.
    pub async fn initiate_outbound(
        &self,
        remote_server: &ServerInfo,
        local_path: &Path,
        remote_folder: &str,
    ) -> Result<u32> {
        let metadata = match fs::metadata(local_path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Err(FerryError::LocalFileMissing(local_path.to_path_buf())),
        };
        let file_name = match local_path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => return Err(FerryError::LocalFileMissing(local_path.to_path_buf())),
        };
        let local_folder = local_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let transfer_id = {
            let mut transfers = self.transfers.lock();
            let transfer = transfers.create(
                None,
                TransferDirection::Outbound,
                TransferInitiator::LocalServer,
                remote_server.clone(),
                file_name,
                local_folder,
                remote_folder.to_string(),
            );
            transfer.file_size = metadata.len();
            transfer.id
        };

        info!(
            "Offering {} ({} bytes) to {} as transfer {}",
            local_path.display(),
            metadata.len(),
            remote_server,
            transfer_id
        );
        self.send_transfer_offer(transfer_id).await?;
        Ok(transfer_id)
    }

    /// GetFile: asks `remote_server` to send one of its files.
    pub async fn initiate_inbound(
        &self,
        remote_server: &ServerInfo,
        file_name: &str,
        remote_folder: &str,
    ) -> Result<u32> {
        let (transfer_id, body) = {
            let mut transfers = self.transfers.lock();
            let transfer = transfers.create(
                None,
                TransferDirection::Inbound,
                TransferInitiator::LocalServer,
                remote_server.clone(),
                file_name.to_string(),
                self.settings.transfer_folder.clone(),
                remote_folder.to_string(),
            );
            (transfer.id, file_request(transfer))
        };

        info!("Requesting {} from {} as transfer {}", file_name, remote_server, transfer_id);
        self.send_or_fail(transfer_id, remote_server, body).await?;
        Ok(transfer_id)
    }

    async fn send_transfer_offer(&self, transfer_id: u32) -> Result<()> {
        let (remote_server, body) = self.update(transfer_id, |transfer| {
            let body = RequestBody::InboundFileTransferRequest {
                correlation: transfer.correlation(),
                retry_counter: transfer.retry_counter,
                retry_limit: self.settings.transfer_retry_limit,
                file_name: transfer.file_name.clone(),
                file_size: transfer.file_size,
                source_folder: transfer.local_folder.display().to_string(),
                destination_folder: transfer.remote_folder.clone(),
            };
            Ok((transfer.remote_server.clone(), body))
        })?;

        self.send_or_fail(transfer_id, &remote_server, body).await
    }

    /// A peer asked for one of our files.
    pub async fn handle_outbound_request(
        &self,
        remote_server: &ServerInfo,
        correlation: TransferCorrelation,
        file_name: &str,
        source_folder: &str,
        destination_folder: &str,
    ) -> Result<()> {
        let local_folder = self.folder_or_default(source_folder);
        let local_path = local_folder.join(file_name);

        let file_size = match fs::metadata(&local_path).await {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            _ => {
                warn!(
                    "{} asked for {} which does not exist",
                    remote_server,
                    local_path.display()
                );
                let correlation = TransferCorrelation::new(correlation.transfer_response_code, 0);
                return self
                    .sender
                    .send(remote_server, RequestBody::RequestedFileDoesNotExist(correlation))
                    .await;
            }
        };

        let transfer_id = {
            let mut transfers = self.transfers.lock();
            let transfer = transfers.create(
                Some(correlation.transfer_response_code),
                TransferDirection::Outbound,
                TransferInitiator::RemoteServer,
                remote_server.clone(),
                file_name.to_string(),
                local_folder,
                destination_folder.to_string(),
            );
            transfer.remote_server_transfer_id = correlation.remote_server_transfer_id;
            transfer.file_size = file_size;
            transfer.id
        };

        self.send_transfer_offer(transfer_id).await
    }

    /// A peer offered to send us a file, either because we asked for it or
    /// unsolicited.
    pub async fn handle_inbound_offer(
        &self,
        remote_server: &ServerInfo,
        offer: TransferOffer,
    ) -> Result<()> {
        let code = offer.correlation.transfer_response_code;

        let (transfer_id, solicited) = {
            let mut transfers = self.transfers.lock();

            let existing = transfers
                .by_response_code(code)
                .filter(|transfer| {
                    transfer.direction == TransferDirection::Inbound
                        && transfer.status == TransferStatus::AwaitingResponse
                })
                .map(|transfer| transfer.id);

            let transfer = match existing {
                Some(transfer_id) => transfers.get_mut(transfer_id)?,
                None => {
                    let local_folder = self.folder_or_default(&offer.destination_folder);
                    transfers.create(
                        Some(code),
                        TransferDirection::Inbound,
                        TransferInitiator::RemoteServer,
                        remote_server.clone(),
                        offer.file_name.clone(),
                        local_folder,
                        offer.source_folder.clone(),
                    )
                }
            };

            transfer.remote_server_transfer_id = offer.correlation.remote_server_transfer_id;
            transfer.file_size = offer.file_size;
            transfer.retry_counter = offer.retry_counter;
            transfer.remote_server_retry_limit = offer.retry_limit;
            transfer.reset_transient_fields();
            transfer.set_status(TransferStatus::Pending)?;

            (transfer.id, existing.is_some())
        };

        let transfer = self.transfer(transfer_id)?;

        if !fs::metadata(&transfer.local_folder)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false)
        {
            let folder = transfer.local_folder.display().to_string();
            self.update(transfer_id, |transfer| {
                transfer.set_status(TransferStatus::Rejected)?;
                transfer.error_message = Some(format!("folder {} does not exist", folder));
                Ok(())
            })?;
            self.events.send(ServerEvent::TransferRejected { transfer_id });
            return self
                .sender
                .send(
                    remote_server,
                    RequestBody::RequestedFolderDoesNotExist {
                        correlation: transfer.correlation(),
                        folder,
                    },
                )
                .await;
        }

        if fs::metadata(transfer.local_file_path()).await.is_ok() {
            self.update(transfer_id, |transfer| {
                transfer.set_status(TransferStatus::Rejected)?;
                transfer.error_message =
                    Some("a file with the same name already exists".to_string());
                Ok(())
            })?;
            self.events.send(ServerEvent::TransferRejected { transfer_id });
            return self
                .sender
                .send(remote_server, RequestBody::FileTransferRejected(transfer.correlation()))
                .await;
        }

        self.events.send(ServerEvent::InboundTransferPending {
            transfer_id,
            file_name: transfer.file_name.clone(),
            file_size: transfer.file_size,
        });

        if solicited || self.settings.auto_accept_inbound {
            return self.accept_inbound(transfer_id).await;
        }

        Ok(())
    }

    /// Accepts a pending inbound transfer and receives the file on the
    /// connection the acceptance was written to.
    pub async fn accept_inbound(&self, transfer_id: u32) -> Result<()> {
        let (remote_server, correlation) = self.update(transfer_id, |transfer| {
            if transfer.direction != TransferDirection::Inbound {
                return Err(FerryError::InvalidTransferState {
                    transfer_id,
                    from: transfer.status,
                    to: TransferStatus::Accepted,
                });
            }
            transfer.set_status(TransferStatus::Accepted)?;
            Ok((transfer.remote_server.clone(), transfer.correlation()))
        })?;
        self.events.send(ServerEvent::TransferAccepted { transfer_id });

        let stream = match self
            .sender
            .send_and_keep(&remote_server, RequestBody::FileTransferAccepted(correlation))
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                self.fail(transfer_id, &e);
                return Err(e);
            }
        };

        self.receive_file(transfer_id, stream).await
    }

    pub async fn reject_inbound(&self, transfer_id: u32) -> Result<()> {
        let (remote_server, correlation) = self.update(transfer_id, |transfer| {
            transfer.set_status(TransferStatus::Rejected)?;
            Ok((transfer.remote_server.clone(), transfer.correlation()))
        })?;
        self.events.send(ServerEvent::TransferRejected { transfer_id });

        self.sender
            .send(&remote_server, RequestBody::FileTransferRejected(correlation))
            .await
    }

    async fn receive_file(&self, transfer_id: u32, mut stream: TcpStream) -> Result<()> {
        let (path, file_size) = self.update(transfer_id, |transfer| {
            transfer.set_status(TransferStatus::InProgress)?;
            transfer.transfer_start_time = Some(SystemTime::now());
            Ok((transfer.local_file_path(), transfer.file_size))
        })?;
        self.events.send(ServerEvent::TransferStarted { transfer_id });

        let mut file = match fs::File::create(&path).await {
            Ok(file) => file,
            Err(e) => return self.abandon_receive(transfer_id, &path, e.into()).await,
        };

        let mut tracker = ProgressTracker::new(file_size, self.settings.progress_interval);
        let outcome = receive_file_bytes(
            &mut stream,
            vec![],
            &mut file,
            file_size,
            self.settings.buffer_size,
            self.settings.stall_timeout,
            &self.cancel,
            |current_bytes| {
                let _ = self.update(transfer_id, |transfer| {
                    transfer.current_bytes = current_bytes;
                    transfer.chunk_count += 1;
                    Ok(())
                });
                if tracker.update(current_bytes) {
                    self.events.send(ServerEvent::TransferProgress {
                        transfer_id,
                        current_bytes,
                        file_size,
                    });
                }
            },
        )
        .await;
        drop(file);
        drop(stream);

        match outcome {
            Ok(ReceiveOutcome::Complete) => {
                let (remote_server, correlation) = self.update(transfer_id, |transfer| {
                    transfer.set_status(TransferStatus::TransferComplete)?;
                    transfer.transfer_complete_time = Some(SystemTime::now());
                    Ok((transfer.remote_server.clone(), transfer.correlation()))
                })?;
                self.events.send(ServerEvent::TransferComplete { transfer_id });

                self.sender
                    .send(&remote_server, RequestBody::FileTransferComplete(correlation))
                    .await
            }
            Ok(ReceiveOutcome::Stalled { received }) => {
                self.notify_stalled(transfer_id, received).await
            }
            Err(e) => self.abandon_receive(transfer_id, &path, e).await,
        }
    }

    /// A receive failed on this side. The sender hears about it as a stall so
    /// its record is released for a retry.
    async fn abandon_receive(
        &self,
        transfer_id: u32,
        path: &Path,
        error: FerryError,
    ) -> Result<()> {
        remove_partial_file(path).await;
        self.fail(transfer_id, &error);

        let (remote_server, correlation) = self.update(transfer_id, |transfer| {
            Ok((transfer.remote_server.clone(), transfer.correlation()))
        })?;
        if let Err(e) = self
            .sender
            .send(&remote_server, RequestBody::FileTransferStalled(correlation))
            .await
        {
            warn!("Could not tell {} about transfer {}: {}", remote_server, transfer_id, e);
        }

        Err(error)
    }

    /// Marks an in-flight receive as stalled, throws away what arrived and
    /// tells the sender to stop.
    pub async fn notify_stalled(&self, transfer_id: u32, received: u64) -> Result<()> {
        let (path, remote_server, correlation) = self.update(transfer_id, |transfer| {
            transfer.set_status(TransferStatus::Stalled)?;
            transfer.current_bytes = received;
            transfer.error_message = Some(format!(
                "stalled after {} of {} bytes",
                received, transfer.file_size
            ));
            Ok((
                transfer.local_file_path(),
                transfer.remote_server.clone(),
                transfer.correlation(),
            ))
        })?;
        remove_partial_file(&path).await;
        self.events.send(ServerEvent::TransferStalled {
            transfer_id,
            current_bytes: received,
        });

        self.sender
            .send(&remote_server, RequestBody::FileTransferStalled(correlation))
            .await?;

        Err(FerryError::TransferStalled {
            transfer_id,
            bytes_received: received,
        })
    }

    /// The receiver accepted our offer; stream the file over its connection.
    pub async fn handle_transfer_accepted(
        &self,
        correlation: TransferCorrelation,
        mut stream: TcpStream,
        leftover: Vec<u8>,
    ) -> Result<()> {
        if !leftover.is_empty() {
            debug!("Ignoring {} bytes after the acceptance frame", leftover.len());
        }

        let code = correlation.transfer_response_code;
        let (transfer_id, path, file_size) = self.update_by_code(code, |transfer| {
            if transfer.direction != TransferDirection::Outbound {
                return Err(FerryError::InvalidTransferState {
                    transfer_id: transfer.id,
                    from: transfer.status,
                    to: TransferStatus::Accepted,
                });
            }
            transfer.remote_server_transfer_id = correlation.remote_server_transfer_id;
            transfer.set_status(TransferStatus::Accepted)?;
            transfer.set_status(TransferStatus::InProgress)?;
            transfer.transfer_start_time = Some(SystemTime::now());
            Ok((transfer.id, transfer.local_file_path(), transfer.file_size))
        })?;
        self.events.send(ServerEvent::TransferAccepted { transfer_id });
        self.events.send(ServerEvent::TransferStarted { transfer_id });

        let mut tracker = ProgressTracker::new(file_size, self.settings.progress_interval);
        let sent = send_file_bytes(
            &mut stream,
            &path,
            file_size,
            self.settings.buffer_size,
            self.settings.socket_timeout.max(self.settings.stall_timeout),
            &self.cancel,
            |current_bytes, chunk_count| {
                let _ = self.update(transfer_id, |transfer| {
                    transfer.current_bytes = current_bytes;
                    transfer.chunk_count = chunk_count;
                    Ok(())
                });
                if tracker.update(current_bytes) {
                    self.events.send(ServerEvent::TransferProgress {
                        transfer_id,
                        current_bytes,
                        file_size,
                    });
                }
            },
        )
        .await;

        match sent {
            Ok(sent) => {
                debug!("Transfer {}: sent {} bytes, waiting for confirmation", transfer_id, sent);
                self.update(transfer_id, |transfer| {
                    transfer.set_status(TransferStatus::TransferComplete)?;
                    transfer.transfer_complete_time = Some(SystemTime::now());
                    Ok(())
                })?;
                self.events.send(ServerEvent::TransferComplete { transfer_id });
                Ok(())
            }
            Err(e) => {
                self.fail(transfer_id, &e);
                Err(e)
            }
        }
    }

    pub fn handle_transfer_rejected(&self, correlation: TransferCorrelation) -> Result<()> {
        let transfer_id = self.update_by_code(correlation.transfer_response_code, |transfer| {
            transfer.set_status(TransferStatus::Rejected)?;
            Ok(transfer.id)
        })?;
        self.events.send(ServerEvent::TransferRejected { transfer_id });
        Ok(())
    }

    pub fn handle_transfer_complete(&self, correlation: TransferCorrelation) -> Result<()> {
        let transfer_id = self.update_by_code(correlation.transfer_response_code, |transfer| {
            transfer.set_status(TransferStatus::ConfirmedComplete)?;
            Ok(transfer.id)
        })?;
        self.events.send(ServerEvent::TransferConfirmed { transfer_id });
        Ok(())
    }

    /// The receiver gave up on our bytes.
    pub fn handle_transfer_stalled(&self, correlation: TransferCorrelation) -> Result<()> {
        let transfer_id = self.update_by_code(correlation.transfer_response_code, |transfer| {
            transfer.set_status(TransferStatus::Cancelled)?;
            transfer.error_message = Some("receiver reported a stall".to_string());
            Ok(transfer.id)
        })?;
        self.events.send(ServerEvent::TransferCancelled { transfer_id });
        Ok(())
    }

    pub fn handle_file_missing(&self, correlation: TransferCorrelation) -> Result<()> {
        let code = correlation.transfer_response_code;
        let (transfer_id, file_name) = self.update_by_code(code, |transfer| {
            let missing = FerryError::RemoteFileMissing(transfer.file_name.clone());
            transfer.fail(missing.to_string());
            Ok((transfer.id, transfer.file_name.clone()))
        })?;
        self.events
            .send(ServerEvent::RemoteFileMissing { transfer_id, file_name });
        Ok(())
    }

    pub fn handle_folder_missing(
        &self,
        remote_server: &ServerInfo,
        correlation: TransferCorrelation,
        folder: String,
    ) -> Result<()> {
        if !correlation.is_none() {
            let code = correlation.transfer_response_code;
            let transfer_id = self.update_by_code(code, |transfer| {
                transfer.set_status(TransferStatus::Rejected)?;
                transfer.error_message =
                    Some(FerryError::FolderMissing(folder.clone()).to_string());
                Ok(transfer.id)
            })?;
            self.events.send(ServerEvent::TransferRejected { transfer_id });
        }

        self.events.send(ServerEvent::RemoteFolderMissing {
            remote_server: remote_server.clone(),
            folder,
        });
        Ok(())
    }

    /// Receiver side: asks the sender to start a failed inbound transfer over.
    /// A file this peer asked for that the sender never offered is simply
    /// requested again, since the sender keeps no record of it.
    pub async fn retry_transfer(&self, transfer_id: u32) -> Result<()> {
        let (path, remote_server, body) = self.update(transfer_id, |transfer| {
            let eligible = transfer.direction == TransferDirection::Inbound
                && matches!(
                    transfer.status,
                    TransferStatus::Stalled
                        | TransferStatus::Error
                        | TransferStatus::RetryLimitExceeded
                );
            if !eligible {
                return Err(FerryError::InvalidTransferState {
                    transfer_id,
                    from: transfer.status,
                    to: TransferStatus::AwaitingResponse,
                });
            }

            transfer.reset_transient_fields();
            transfer.set_status(TransferStatus::AwaitingResponse)?;

            let never_offered = transfer.initiator == TransferInitiator::LocalServer
                && transfer.remote_server_transfer_id == 0;
            let body = if never_offered {
                file_request(transfer)
            } else {
                RequestBody::RetryOutboundFileTransfer(transfer.correlation())
            };
            Ok((transfer.local_file_path(), transfer.remote_server.clone(), body))
        })?;
        remove_partial_file(&path).await;
        self.events.send(ServerEvent::RetryRequested { transfer_id });

        self.send_or_fail(transfer_id, &remote_server, body).await
    }

    /// Sender side: applies the retry limit and lockout to a peer's retry
    /// request. A retry that cannot be honored is answered with a rejection.
    pub async fn handle_retry_request(
        &self,
        remote_server: &ServerInfo,
        correlation: TransferCorrelation,
    ) -> Result<()> {
        let now = SystemTime::now();
        let code = correlation.transfer_response_code;
        let decided = self.update_by_code(code, |transfer| {
            let decision = apply_retry_policy(
                transfer,
                self.settings.transfer_retry_limit,
                self.settings.retry_lockout,
                now,
            )?;
            Ok((
                transfer.id,
                transfer.remote_server.clone(),
                transfer.correlation(),
                decision,
            ))
        });

        let (transfer_id, remote_server, transfer_correlation, decision) = match decided {
            Ok(decided) => decided,
            Err(e) => {
                warn!("Refusing retry from {}: {}", remote_server, e);
                let refused = TransferCorrelation::new(code, 0);
                self.sender
                    .send(remote_server, RequestBody::FileTransferRejected(refused))
                    .await?;
                return Err(e);
            }
        };

        match decision {
            RetryDecision::Resend { retry_counter } => {
                self.events.send(ServerEvent::RetryStarted {
                    transfer_id,
                    retry_counter,
                });
                self.send_transfer_offer(transfer_id).await
            }
            RetryDecision::LimitReached {
                retry_limit,
                lockout_expires_at,
            }
            | RetryDecision::LockedOut {
                retry_limit,
                lockout_expires_at,
            } => {
                self.events.send(ServerEvent::RetryLimitExceeded {
                    transfer_id,
                    retry_limit,
                    lockout_expires_at,
                });
                self.sender
                    .send(
                        &remote_server,
                        RequestBody::RetryLimitExceeded {
                            correlation: transfer_correlation,
                            retry_limit,
                            lockout_expires_at: unix_millis(lockout_expires_at),
                        },
                    )
                    .await
            }
        }
    }

    /// Receiver side: the sender refused a retry.
    pub fn handle_retry_limit_exceeded(
        &self,
        correlation: TransferCorrelation,
        retry_limit: u32,
        lockout_expires_at: u64,
    ) -> Result<()> {
        let lockout_expires_at = from_unix_millis(lockout_expires_at);
        let transfer_id = self.update_by_code(correlation.transfer_response_code, |transfer| {
            transfer.set_status(TransferStatus::RetryLimitExceeded)?;
            if correlation.remote_server_transfer_id != 0 {
                transfer.remote_server_transfer_id = correlation.remote_server_transfer_id;
            }
            transfer.remote_server_retry_limit = retry_limit;
            transfer.retry_lockout_expire_time = Some(lockout_expires_at);
            transfer.error_message = Some(
                FerryError::RetryLimitExceeded {
                    retry_limit,
                    lockout_expires_at,
                }
                .to_string(),
            );
            Ok(transfer.id)
        })?;

        self.events.send(ServerEvent::RetryLimitExceeded {
            transfer_id,
            retry_limit,
            lockout_expires_at,
        });
        Ok(())
    }
}

/// GetFile request for an inbound transfer this peer initiated.
fn file_request(transfer: &FileTransfer) -> RequestBody {
    RequestBody::OutboundFileTransferRequest {
        correlation: transfer.correlation(),
        file_name: transfer.file_name.clone(),
        source_folder: transfer.remote_folder.clone(),
        destination_folder: transfer.local_folder.display().to_string(),
    }
}

async fn remove_partial_file(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial file {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial file {}: {}", path.display(), e),
    }
}
