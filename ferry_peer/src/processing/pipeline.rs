use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use ferry_core_lib::{
    data::{
        requests::{
            decode_request, FrameReader, Request, RequestBody, RequestDirection, RequestStatus,
        },
        Cidr, ServerInfo, Settings,
    },
    FerryError, Result,
};
use tokio::{
    sync::{Mutex, MutexGuard},
    time::timeout,
};

use crate::{
    connectivity::AcceptedConnection,
    events::{EventSender, ServerEvent},
};

use super::{QueuedRequest, RequestBacklog, RequestLog};

/// Turns accepted connections into typed requests and makes sure only one of
/// them is processed at a time. Everything else waits in the backlog.
pub struct RequestPipeline {
    lan: Option<Cidr>,
    socket_timeout: Duration,
    buffer_size: usize,
    log: RequestLog,
    backlog: RequestBacklog,
    processing: Mutex<()>,
    busy: AtomicBool,
    events: EventSender,
}

/// Held for as long as one request or transfer is being actively processed.
pub struct ProcessingGuard<'a> {
    _guard: MutexGuard<'a, ()>,
    busy: &'a AtomicBool,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

impl RequestPipeline {
    pub fn new(
        settings: &Settings,
        log: RequestLog,
        events: EventSender,
    ) -> Result<RequestPipeline> {
        Ok(RequestPipeline {
            lan: settings.lan()?,
            socket_timeout: settings.socket_timeout,
            buffer_size: settings.buffer_size,
            log,
            backlog: RequestBacklog::new(),
            processing: Mutex::new(()),
            busy: AtomicBool::new(false),
            events,
        })
    }

    pub fn log(&self) -> &RequestLog {
        &self.log
    }

    /// Reads one frame off the connection and queues the decoded request.
    /// Failures only affect this connection, which is dropped.
    pub async fn receive(&self, mut connection: AcceptedConnection) {
        let uuid = connection.uuid;

        match self.read_request(&mut connection).await {
            Ok(Some((remote_server, body, leftover))) => {
                let request_type = body.request_type();
                let request_id = self.log.record(
                    RequestDirection::Received,
                    remote_server.clone(),
                    body.clone(),
                    RequestStatus::Pending,
                );
                self.events.send(ServerEvent::RequestReceived {
                    request_id,
                    request_type,
                    remote_server: remote_server.clone(),
                });

                let backlog_length = self.backlog.push(QueuedRequest {
                    request_id,
                    remote_server,
                    body,
                    connection,
                    leftover,
                });

                if self.is_busy() {
                    self.events.send(ServerEvent::RequestQueued {
                        request_id,
                        backlog_length,
                    });
                }
            }
            Ok(None) => {
                debug!("Connection {} closed without sending a request", uuid);
            }
            Err(e) => {
                self.events.error(format!(
                    "Dropping connection {} from {}: {}",
                    uuid, connection.remote_address, e
                ));
            }
        }
    }

    async fn read_request(
        &self,
        connection: &mut AcceptedConnection,
    ) -> Result<Option<(ServerInfo, RequestBody, Vec<u8>)>> {
        let mut reader = FrameReader::new(self.buffer_size);

        let frame = timeout(self.socket_timeout, reader.read_frame(&mut connection.stream))
            .await
            .map_err(|_| {
                FerryError::SocketFailure(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "timed out waiting for a complete frame",
                ))
            })??;

        let frame = match frame {
            Some(frame) => frame,
            None => return Ok(None),
        };

        let (sender, body) = decode_request(&frame)?;
        let remote_server = ServerInfo::from_sender(&sender, self.lan.as_ref());
        debug!(
            "Connection {}: {} from {}",
            connection.uuid,
            body.request_type(),
            remote_server
        );

        Ok(Some((remote_server, body, reader.take_leftover())))
    }

    /// Waits until a request is queued. It stays in the backlog, and visible
    /// to [`RequestPipeline::queued_requests`], until taken.
    pub async fn wait_for_request(&self) {
        self.backlog.wait_for_request().await
    }

    /// Takes the oldest queued request. Callers hold the processing guard.
    pub fn take_request(&self, _processing: &ProcessingGuard<'_>) -> Option<QueuedRequest> {
        self.backlog.try_pop()
    }

    /// Waits until nothing else is being processed, then claims the pipeline.
    pub async fn begin_processing(&self) -> ProcessingGuard<'_> {
        let guard = self.processing.lock().await;
        self.busy.store(true, Ordering::SeqCst);
        ProcessingGuard {
            _guard: guard,
            busy: &self.busy,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn start(&self, request_id: u32) {
        self.log.update_status(request_id, RequestStatus::InProgress);
    }

    pub fn finish(&self, request_id: u32, result: &Result<()>) {
        match result {
            Ok(()) => {
                self.log.update_status(request_id, RequestStatus::Processed);
                self.events.send(ServerEvent::RequestProcessed { request_id });
            }
            Err(e) => {
                self.log.fail(request_id, e.to_string());
                self.events
                    .error(format!("Processing request {} failed: {}", request_id, e));
            }
        }
    }

    pub fn backlog_length(&self) -> usize {
        self.backlog.len()
    }

    /// Requests received but not yet processed, oldest first.
    pub fn queued_requests(&self) -> Vec<Request> {
        self.backlog
            .queued_ids()
            .into_iter()
            .filter_map(|request_id| self.log.get(request_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use ferry_core_lib::data::requests::encode_frame;
    use tokio::{
        io::AsyncWriteExt,
        net::{TcpListener, TcpStream},
    };

    use super::*;

    fn pipeline() -> RequestPipeline {
        let settings = Settings {
            socket_timeout: Duration::from_millis(500),
            lan_cidr: String::new(),
            ..Settings::default()
        };
        RequestPipeline::new(&settings, RequestLog::new(), EventSender::new(64)).unwrap()
    }

    async fn connection_with(bytes: Vec<u8>) -> AcceptedConnection {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut client = TcpStream::connect(address).await.unwrap();
            client.write_all(&bytes).await.unwrap();
            client.shutdown().await.unwrap();
        });
        let (stream, remote_address) = listener.accept().await.unwrap();
        AcceptedConnection::new(stream, remote_address)
    }

    fn sender() -> ServerInfo {
        ServerInfo::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 6100)
    }

    #[tokio::test]
    async fn test_receive_queues_decoded_request() {
        let pipeline = pipeline();
        let body = RequestBody::TextMessage {
            text: "queued".to_string(),
        };
        let mut bytes = encode_frame(&body, &sender());
        bytes.extend([9, 9]);

        pipeline.receive(connection_with(bytes).await).await;

        pipeline.wait_for_request().await;
        let guard = pipeline.begin_processing().await;
        let queued = pipeline.take_request(&guard).unwrap();
        assert_eq!(queued.body, body);
        assert_eq!(queued.remote_server.port, 6100);
        assert_eq!(queued.leftover, vec![9, 9]);
        assert_eq!(pipeline.log().get(queued.request_id).unwrap().status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_malformed_frame_is_dropped() {
        let pipeline = pipeline();
        let mut bytes = encode_frame(&RequestBody::ServerInfoRequest, &sender());
        bytes[4] = 200;

        pipeline.receive(connection_with(bytes).await).await;

        assert_eq!(pipeline.backlog_length(), 0);
        assert!(pipeline.log().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_processing_guard_marks_busy() {
        let pipeline = pipeline();
        assert!(!pipeline.is_busy());

        let guard = pipeline.begin_processing().await;
        assert!(pipeline.is_busy());
        drop(guard);

        assert!(!pipeline.is_busy());
    }

    #[tokio::test]
    async fn test_request_stays_queued_while_pipeline_is_busy() {
        let pipeline = pipeline();
        let guard = pipeline.begin_processing().await;

        let frame = encode_frame(&RequestBody::ServerInfoRequest, &sender());
        pipeline.receive(connection_with(frame).await).await;
        pipeline.wait_for_request().await;

        assert_eq!(pipeline.queued_requests().len(), 1);
        assert!(pipeline.take_request(&guard).is_some());
        assert!(pipeline.queued_requests().is_empty());
    }

    #[tokio::test]
    async fn test_queued_requests_in_arrival_order() {
        let pipeline = pipeline();
        for text in ["first", "second", "third"] {
            let frame = encode_frame(
                &RequestBody::TextMessage {
                    text: text.to_string(),
                },
                &sender(),
            );
            pipeline.receive(connection_with(frame).await).await;
        }

        let texts: Vec<RequestBody> = pipeline
            .queued_requests()
            .into_iter()
            .map(|request| request.body)
            .collect();
        assert_eq!(
            texts,
            ["first", "second", "third"]
                .iter()
                .map(|text| RequestBody::TextMessage {
                    text: text.to_string()
                })
                .collect::<Vec<_>>()
        );
    }
}
