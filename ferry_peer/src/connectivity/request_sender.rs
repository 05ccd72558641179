use std::{io, time::Duration};

use ferry_core_lib::{
    data::{
        requests::{encode_frame, RequestBody, RequestDirection, RequestStatus},
        ServerInfo,
    },
    FerryError, Result,
};
use tokio::{io::AsyncWriteExt, net::TcpStream, time::timeout};

use crate::{
    events::{EventSender, ServerEvent},
    processing::RequestLog,
};

/// Opens a connection per request, writes one frame and records it in the
/// request log.
#[derive(Clone)]
pub struct RequestSender {
    local_server: ServerInfo,
    socket_timeout: Duration,
    log: RequestLog,
    events: EventSender,
}

impl RequestSender {
    pub fn new(
        local_server: ServerInfo,
        socket_timeout: Duration,
        log: RequestLog,
        events: EventSender,
    ) -> Self {
        RequestSender {
            local_server,
            socket_timeout,
            log,
            events,
        }
    }

    pub fn local_server(&self) -> &ServerInfo {
        &self.local_server
    }

    /// Sends and closes the connection.
    pub async fn send(&self, remote_server: &ServerInfo, body: RequestBody) -> Result<()> {
        let mut stream = self.send_and_keep(remote_server, body).await?;
        stream.shutdown().await.ok();
        Ok(())
    }

    /// Sends and returns the still-open connection to the caller.
    pub async fn send_and_keep(
        &self,
        remote_server: &ServerInfo,
        body: RequestBody,
    ) -> Result<TcpStream> {
        let request_type = body.request_type();
        let frame = encode_frame(&body, &self.local_server);
        let request_id = self.log.record(
            RequestDirection::Sent,
            remote_server.clone(),
            body,
            RequestStatus::Pending,
        );

        match self.write_frame(remote_server, &frame).await {
            Ok(stream) => {
                self.log.update_status(request_id, RequestStatus::Sent);
                self.events.send(ServerEvent::RequestSent {
                    request_type,
                    remote_server: remote_server.clone(),
                });
                Ok(stream)
            }
            Err(e) => {
                self.log.fail(request_id, e.to_string());
                self.events.error(format!(
                    "Failed to send {} to {}: {}",
                    request_type, remote_server, e
                ));
                Err(e)
            }
        }
    }

    async fn write_frame(&self, remote_server: &ServerInfo, frame: &[u8]) -> Result<TcpStream> {
        let address = remote_server.session_address();
        let mut stream = timeout(self.socket_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| timed_out(format!("connecting to {}", address)))??;

        timeout(self.socket_timeout, stream.write_all(frame))
            .await
            .map_err(|_| timed_out(format!("writing to {}", address)))??;
        stream.flush().await?;

        debug!("Wrote {} byte frame to {}", frame.len(), address);
        Ok(stream)
    }
}

fn timed_out(what: String) -> FerryError {
    FerryError::SocketFailure(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("timed out {}", what),
    ))
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use ferry_core_lib::data::requests::{decode_request, FrameReader};
    use tokio::net::TcpListener;

    use super::*;

    fn localhost(port: u16) -> ServerInfo {
        ServerInfo::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    #[tokio::test]
    async fn test_send_writes_one_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote = localhost(listener.local_addr().unwrap().port());
        let log = RequestLog::new();
        let sender = RequestSender::new(
            localhost(4000),
            Duration::from_secs(2),
            log.clone(),
            EventSender::new(8),
        );

        let body = RequestBody::TextMessage {
            text: "hello".to_string(),
        };
        sender.send(&remote, body.clone()).await.unwrap();

        let (mut stream, _) = listener.accept().await.unwrap();
        let mut reader = FrameReader::new(64);
        let frame = reader.read_frame(&mut stream).await.unwrap().unwrap();
        let (sender_endpoint, decoded) = decode_request(&frame).unwrap();

        assert_eq!(decoded, body);
        assert_eq!(sender_endpoint.port, 4000);
        assert_eq!(log.snapshot()[0].status, RequestStatus::Sent);
    }

    #[tokio::test]
    async fn test_unreachable_peer_fails_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let log = RequestLog::new();
        let sender = RequestSender::new(
            localhost(4000),
            Duration::from_secs(2),
            log.clone(),
            EventSender::new(8),
        );

        let result = sender.send(&localhost(port), RequestBody::ServerInfoRequest).await;

        assert!(matches!(result, Err(FerryError::SocketFailure(_))));
        assert_eq!(log.snapshot()[0].status, RequestStatus::Error);
    }
}
