use std::net::IpAddr;

use crate::{
    data::ServerInfo,
    errors::{FerryError, Result},
};

use super::{FieldReader, FieldWriter, RequestType};

/// Identifies one logical transfer across both peers. `remote_server_transfer_id`
/// is the id the *sending* peer uses for the transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransferCorrelation {
    pub transfer_response_code: u64,
    pub remote_server_transfer_id: u32,
}

impl TransferCorrelation {
    pub fn new(transfer_response_code: u64, remote_server_transfer_id: u32) -> Self {
        Self {
            transfer_response_code,
            remote_server_transfer_id,
        }
    }

    /// Used by folder notifications that are not about a transfer.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn is_none(&self) -> bool {
        self.transfer_response_code == 0
    }

    fn write(&self, writer: &mut FieldWriter) {
        writer
            .write_u64(self.transfer_response_code)
            .write_u32(self.remote_server_transfer_id);
    }

    fn read(reader: &mut FieldReader) -> Result<Self> {
        Ok(Self::new(reader.read_u64()?, reader.read_u32()?))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub folder: String,
    pub size: u64,
}

/// Who sent a request, as claimed in the request header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SenderEndpoint {
    pub local_ip: IpAddr,
    pub public_ip: IpAddr,
    pub port: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    ServerInfoRequest,
    ServerInfoResponse {
        name: String,
        platform: String,
        transfer_folder: String,
    },
    TextMessage {
        text: String,
    },
    FileListRequest {
        folder: String,
    },
    FileListResponse {
        folder: String,
        files: Vec<FileEntry>,
    },
    /// "Please receive this file", sent by the file's source.
    InboundFileTransferRequest {
        correlation: TransferCorrelation,
        retry_counter: u32,
        retry_limit: u32,
        file_name: String,
        file_size: u64,
        source_folder: String,
        destination_folder: String,
    },
    /// "Please send me this file", sent by the file's destination.
    OutboundFileTransferRequest {
        correlation: TransferCorrelation,
        file_name: String,
        source_folder: String,
        destination_folder: String,
    },
    FileTransferAccepted(TransferCorrelation),
    FileTransferRejected(TransferCorrelation),
    FileTransferStalled(TransferCorrelation),
    FileTransferComplete(TransferCorrelation),
    RetryOutboundFileTransfer(TransferCorrelation),
    RetryLimitExceeded {
        correlation: TransferCorrelation,
        retry_limit: u32,
        /// Milliseconds since the Unix epoch.
        lockout_expires_at: u64,
    },
    RequestedFileDoesNotExist(TransferCorrelation),
    RequestedFolderDoesNotExist {
        correlation: TransferCorrelation,
        folder: String,
    },
    RequestedFolderIsEmpty {
        folder: String,
    },
    ShutdownServerCommand,
}

impl RequestBody {
    pub fn request_type(&self) -> RequestType {
        match self {
            RequestBody::ServerInfoRequest => RequestType::ServerInfoRequest,
            RequestBody::ServerInfoResponse { .. } => RequestType::ServerInfoResponse,
            RequestBody::TextMessage { .. } => RequestType::TextMessage,
            RequestBody::FileListRequest { .. } => RequestType::FileListRequest,
            RequestBody::FileListResponse { .. } => RequestType::FileListResponse,
            RequestBody::InboundFileTransferRequest { .. } => {
                RequestType::InboundFileTransferRequest
            }
            RequestBody::OutboundFileTransferRequest { .. } => {
                RequestType::OutboundFileTransferRequest
            }
            RequestBody::FileTransferAccepted(_) => RequestType::FileTransferAccepted,
            RequestBody::FileTransferRejected(_) => RequestType::FileTransferRejected,
            RequestBody::FileTransferStalled(_) => RequestType::FileTransferStalled,
            RequestBody::FileTransferComplete(_) => RequestType::FileTransferComplete,
            RequestBody::RetryOutboundFileTransfer(_) => RequestType::RetryOutboundFileTransfer,
            RequestBody::RetryLimitExceeded { .. } => RequestType::RetryLimitExceeded,
            RequestBody::RequestedFileDoesNotExist(_) => RequestType::RequestedFileDoesNotExist,
            RequestBody::RequestedFolderDoesNotExist { .. } => {
                RequestType::RequestedFolderDoesNotExist
            }
            RequestBody::RequestedFolderIsEmpty { .. } => RequestType::RequestedFolderIsEmpty,
            RequestBody::ShutdownServerCommand => RequestType::ShutdownServerCommand,
        }
    }

    /// The transfer this request refers to, if any.
    pub fn correlation(&self) -> Option<TransferCorrelation> {
        match self {
            RequestBody::InboundFileTransferRequest { correlation, .. }
            | RequestBody::OutboundFileTransferRequest { correlation, .. }
            | RequestBody::RetryLimitExceeded { correlation, .. }
            | RequestBody::FileTransferAccepted(correlation)
            | RequestBody::FileTransferRejected(correlation)
            | RequestBody::FileTransferStalled(correlation)
            | RequestBody::FileTransferComplete(correlation)
            | RequestBody::RetryOutboundFileTransfer(correlation)
            | RequestBody::RequestedFileDoesNotExist(correlation) => Some(*correlation),
            RequestBody::RequestedFolderDoesNotExist { correlation, .. }
                if !correlation.is_none() =>
            {
                Some(*correlation)
            }
            _ => None,
        }
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        match self {
            RequestBody::ServerInfoRequest | RequestBody::ShutdownServerCommand => {}
            RequestBody::ServerInfoResponse {
                name,
                platform,
                transfer_folder,
            } => {
                writer
                    .write_string(name)
                    .write_string(platform)
                    .write_string(transfer_folder);
            }
            RequestBody::TextMessage { text } => {
                writer.write_string(text);
            }
            RequestBody::FileListRequest { folder }
            | RequestBody::RequestedFolderIsEmpty { folder } => {
                writer.write_string(folder);
            }
            RequestBody::FileListResponse { folder, files } => {
                writer.write_string(folder).write_u32(files.len() as u32);
                for file in files {
                    writer
                        .write_string(&file.name)
                        .write_string(&file.folder)
                        .write_u64(file.size);
                }
            }
            RequestBody::InboundFileTransferRequest {
                correlation,
                retry_counter,
                retry_limit,
                file_name,
                file_size,
                source_folder,
                destination_folder,
            } => {
                correlation.write(writer);
                writer
                    .write_u32(*retry_counter)
                    .write_u32(*retry_limit)
                    .write_string(file_name)
                    .write_u64(*file_size)
                    .write_string(source_folder)
                    .write_string(destination_folder);
            }
            RequestBody::OutboundFileTransferRequest {
                correlation,
                file_name,
                source_folder,
                destination_folder,
            } => {
                correlation.write(writer);
                writer
                    .write_string(file_name)
                    .write_string(source_folder)
                    .write_string(destination_folder);
            }
            RequestBody::FileTransferAccepted(correlation)
            | RequestBody::FileTransferRejected(correlation)
            | RequestBody::FileTransferStalled(correlation)
            | RequestBody::FileTransferComplete(correlation)
            | RequestBody::RetryOutboundFileTransfer(correlation)
            | RequestBody::RequestedFileDoesNotExist(correlation) => correlation.write(writer),
            RequestBody::RetryLimitExceeded {
                correlation,
                retry_limit,
                lockout_expires_at,
            } => {
                correlation.write(writer);
                writer.write_u32(*retry_limit).write_u64(*lockout_expires_at);
            }
            RequestBody::RequestedFolderDoesNotExist { correlation, folder } => {
                correlation.write(writer);
                writer.write_string(folder);
            }
        }
    }

    fn read_fields(request_type: RequestType, reader: &mut FieldReader) -> Result<RequestBody> {
        let body = match request_type {
            RequestType::ServerInfoRequest => RequestBody::ServerInfoRequest,
            RequestType::ShutdownServerCommand => RequestBody::ShutdownServerCommand,
            RequestType::ServerInfoResponse => RequestBody::ServerInfoResponse {
                name: reader.read_string()?,
                platform: reader.read_string()?,
                transfer_folder: reader.read_string()?,
            },
            RequestType::TextMessage => RequestBody::TextMessage {
                text: reader.read_string()?,
            },
            RequestType::FileListRequest => RequestBody::FileListRequest {
                folder: reader.read_string()?,
            },
            RequestType::RequestedFolderIsEmpty => RequestBody::RequestedFolderIsEmpty {
                folder: reader.read_string()?,
            },
            RequestType::FileListResponse => {
                let folder = reader.read_string()?;
                let count = reader.read_u32()? as usize;
                // Each entry needs at least three length headers.
                if count > reader.remaining() / 12 {
                    return Err(FerryError::MalformedFrame(format!(
                        "file list declares {} entries in {} bytes",
                        count,
                        reader.remaining()
                    )));
                }
                let mut files = Vec::with_capacity(count);
                for _ in 0..count {
                    files.push(FileEntry {
                        name: reader.read_string()?,
                        folder: reader.read_string()?,
                        size: reader.read_u64()?,
                    });
                }
                RequestBody::FileListResponse { folder, files }
            }
            RequestType::InboundFileTransferRequest => RequestBody::InboundFileTransferRequest {
                correlation: TransferCorrelation::read(reader)?,
                retry_counter: reader.read_u32()?,
                retry_limit: reader.read_u32()?,
                file_name: reader.read_string()?,
                file_size: reader.read_u64()?,
                source_folder: reader.read_string()?,
                destination_folder: reader.read_string()?,
            },
            RequestType::OutboundFileTransferRequest => RequestBody::OutboundFileTransferRequest {
                correlation: TransferCorrelation::read(reader)?,
                file_name: reader.read_string()?,
                source_folder: reader.read_string()?,
                destination_folder: reader.read_string()?,
            },
            RequestType::FileTransferAccepted => {
                RequestBody::FileTransferAccepted(TransferCorrelation::read(reader)?)
            }
            RequestType::FileTransferRejected => {
                RequestBody::FileTransferRejected(TransferCorrelation::read(reader)?)
            }
            RequestType::FileTransferStalled => {
                RequestBody::FileTransferStalled(TransferCorrelation::read(reader)?)
            }
            RequestType::FileTransferComplete => {
                RequestBody::FileTransferComplete(TransferCorrelation::read(reader)?)
            }
            RequestType::RetryOutboundFileTransfer => {
                RequestBody::RetryOutboundFileTransfer(TransferCorrelation::read(reader)?)
            }
            RequestType::RequestedFileDoesNotExist => {
                RequestBody::RequestedFileDoesNotExist(TransferCorrelation::read(reader)?)
            }
            RequestType::RetryLimitExceeded => RequestBody::RetryLimitExceeded {
                correlation: TransferCorrelation::read(reader)?,
                retry_limit: reader.read_u32()?,
                lockout_expires_at: reader.read_u64()?,
            },
            RequestType::RequestedFolderDoesNotExist => RequestBody::RequestedFolderDoesNotExist {
                correlation: TransferCorrelation::read(reader)?,
                folder: reader.read_string()?,
            },
        };

        Ok(body)
    }
}

/// Encodes the tag, the sender header and the body fields. No frame length.
pub fn encode_request(body: &RequestBody, local_server: &ServerInfo) -> Vec<u8> {
    let mut writer = FieldWriter::new(body.request_type().as_byte());
    writer
        .write_string(&local_server.local_ip.to_string())
        .write_string(&local_server.public_ip.to_string())
        .write_u32(local_server.port as u32);
    body.write_fields(&mut writer);
    writer.into_bytes()
}

/// Encodes a complete wire frame: `[u32 LE length][encoded request]`.
pub fn encode_frame(body: &RequestBody, local_server: &ServerInfo) -> Vec<u8> {
    let request = encode_request(body, local_server);
    let mut frame = Vec::with_capacity(request.len() + 4);
    frame.extend((request.len() as u32).to_le_bytes());
    frame.extend(request);
    frame
}

/// Decodes one encoded request (the frame payload, without its length prefix).
pub fn decode_request(buffer: &[u8]) -> Result<(SenderEndpoint, RequestBody)> {
    let tag = *buffer
        .first()
        .ok_or_else(|| FerryError::MalformedFrame("empty request".to_string()))?;
    let request_type = RequestType::from_byte(tag)?;

    let mut reader = FieldReader::new(buffer);
    let sender = SenderEndpoint {
        local_ip: read_ip(&mut reader)?,
        public_ip: read_ip(&mut reader)?,
        port: read_port(&mut reader)?,
    };
    let body = RequestBody::read_fields(request_type, &mut reader)?;

    if reader.remaining() != 0 {
        debug!(
            "{} request carries {} trailing bytes, ignoring",
            request_type,
            reader.remaining()
        );
    }

    Ok((sender, body))
}

fn read_ip(reader: &mut FieldReader) -> Result<IpAddr> {
    let text = reader.read_string()?;
    text.parse()
        .map_err(|_| FerryError::MalformedFrame(format!("invalid ip address '{}'", text)))
}

fn read_port(reader: &mut FieldReader) -> Result<u16> {
    let port = reader.read_u32()?;
    u16::try_from(port).map_err(|_| FerryError::MalformedFrame(format!("invalid port {}", port)))
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn local_server() -> ServerInfo {
        let mut server = ServerInfo::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)), 47_000);
        server.public_ip = IpAddr::V4(Ipv4Addr::new(84, 12, 3, 9));
        server
    }

    fn correlation() -> TransferCorrelation {
        TransferCorrelation::new(0x1122_3344_5566_7788, 7)
    }

    fn catalog() -> Vec<RequestBody> {
        vec![
            RequestBody::ServerInfoRequest,
            RequestBody::ServerInfoResponse {
                name: "workstation".to_string(),
                platform: "linux".to_string(),
                transfer_folder: "/srv/ferry".to_string(),
            },
            RequestBody::TextMessage {
                text: "héllo, peer".to_string(),
            },
            RequestBody::FileListRequest {
                folder: "/srv/ferry/shared".to_string(),
            },
            RequestBody::FileListResponse {
                folder: "/srv/ferry/shared".to_string(),
                files: vec![
                    FileEntry {
                        name: "a.bin".to_string(),
                        folder: "/srv/ferry/shared".to_string(),
                        size: 10_000,
                    },
                    FileEntry {
                        name: "empty.txt".to_string(),
                        folder: "/srv/ferry/shared".to_string(),
                        size: 0,
                    },
                ],
            },
            RequestBody::FileListResponse {
                folder: "/nothing".to_string(),
                files: vec![],
            },
            RequestBody::InboundFileTransferRequest {
                correlation: correlation(),
                retry_counter: 1,
                retry_limit: 3,
                file_name: "a.bin".to_string(),
                file_size: u64::MAX,
                source_folder: "/srv/ferry".to_string(),
                destination_folder: "C:\\Users\\peer\\Downloads".to_string(),
            },
            RequestBody::OutboundFileTransferRequest {
                correlation: correlation(),
                file_name: "a.bin".to_string(),
                source_folder: "/srv/ferry".to_string(),
                destination_folder: "/home/peer/in".to_string(),
            },
            RequestBody::FileTransferAccepted(correlation()),
            RequestBody::FileTransferRejected(correlation()),
            RequestBody::FileTransferStalled(correlation()),
            RequestBody::FileTransferComplete(correlation()),
            RequestBody::RetryOutboundFileTransfer(correlation()),
            RequestBody::RetryLimitExceeded {
                correlation: correlation(),
                retry_limit: 2,
                lockout_expires_at: 1_700_000_000_000,
            },
            RequestBody::RequestedFileDoesNotExist(correlation()),
            RequestBody::RequestedFolderDoesNotExist {
                correlation: TransferCorrelation::none(),
                folder: "/missing".to_string(),
            },
            RequestBody::RequestedFolderIsEmpty {
                folder: "/empty".to_string(),
            },
            RequestBody::ShutdownServerCommand,
        ]
    }

    #[test]
    fn test_catalog_survives_encoding() {
        let local = local_server();

        for body in catalog() {
            let encoded = encode_request(&body, &local);
            assert_eq!(encoded[0], body.request_type().as_byte());

            let (sender, decoded) = decode_request(&encoded).unwrap();
            assert_eq!(decoded, body);
            assert_eq!(sender.local_ip, local.local_ip);
            assert_eq!(sender.public_ip, local.public_ip);
            assert_eq!(sender.port, local.port);
        }
    }

    #[test]
    fn test_frame_length_prefix_counts_request_bytes() {
        let body = RequestBody::TextMessage {
            text: "ping".to_string(),
        };
        let frame = encode_frame(&body, &local_server());
        let declared = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;

        assert_eq!(declared, frame.len() - 4);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let mut encoded = encode_request(&RequestBody::ServerInfoRequest, &local_server());
        encoded[0] = 42;

        assert!(matches!(
            decode_request(&encoded),
            Err(FerryError::UnknownRequestType(42))
        ));
    }

    #[test]
    fn test_truncated_request_is_malformed() {
        let encoded = encode_request(
            &RequestBody::FileTransferComplete(correlation()),
            &local_server(),
        );

        for cut in [1, encoded.len() / 2, encoded.len() - 1] {
            assert!(matches!(
                decode_request(&encoded[..cut]),
                Err(FerryError::MalformedFrame(_))
            ));
        }
        assert!(matches!(decode_request(&[]), Err(FerryError::MalformedFrame(_))));
    }

    #[test]
    fn test_oversized_file_list_count_is_malformed() {
        let mut writer = FieldWriter::new(RequestType::FileListResponse.as_byte());
        writer
            .write_string("127.0.0.1")
            .write_string("127.0.0.1")
            .write_u32(9000)
            .write_string("/x")
            .write_u32(u32::MAX);

        assert!(matches!(
            decode_request(&writer.into_bytes()),
            Err(FerryError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_folder_notice_without_transfer_has_no_correlation() {
        let body = RequestBody::RequestedFolderDoesNotExist {
            correlation: TransferCorrelation::none(),
            folder: "/x".to_string(),
        };
        assert!(body.correlation().is_none());
        assert_eq!(
            RequestBody::FileTransferStalled(correlation()).correlation(),
            Some(correlation())
        );
    }
}
