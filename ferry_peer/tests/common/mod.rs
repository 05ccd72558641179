#![allow(dead_code)]

use std::{
    net::{IpAddr, Ipv4Addr},
    path::Path,
    time::Duration,
};

use ferry_core_lib::data::{
    requests::{decode_request, encode_frame, FrameReader, RequestBody},
    ServerInfo, Settings,
};
use ferry_peer::{Peer, ServerEvent};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    sync::broadcast::{error::RecvError, Receiver},
    time::timeout,
};

pub const WAIT: Duration = Duration::from_secs(10);

pub fn settings(folder: &Path) -> Settings {
    Settings {
        server_name: "test".to_string(),
        listen_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        listen_port: 0,
        local_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
        socket_timeout: Duration::from_secs(2),
        stall_timeout: Duration::from_millis(300),
        transfer_folder: folder.to_path_buf(),
        lan_cidr: String::new(),
        ..Settings::default()
    }
}

pub async fn start_peer(folder: &Path) -> Peer {
    Peer::start(settings(folder)).await.unwrap()
}

pub fn contents(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 253) as u8).collect()
}

/// Waits for the first event matching `predicate`, skipping everything else.
pub async fn next_event<F>(events: &mut Receiver<ServerEvent>, mut predicate: F) -> ServerEvent
where
    F: FnMut(&ServerEvent) -> bool,
{
    timeout(WAIT, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => panic!("event stream closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Polls `condition` until it holds.
pub async fn eventually<F: FnMut() -> bool>(mut condition: F) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition never held")
}

/// A hand-driven peer speaking the wire protocol directly, used to produce
/// traffic a real peer never would.
pub struct FakePeer {
    pub listener: TcpListener,
    pub identity: ServerInfo,
}

impl FakePeer {
    pub async fn bind() -> FakePeer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        FakePeer {
            listener,
            identity: ServerInfo::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
        }
    }

    /// Accepts the next connection and reads one request off it. The
    /// connection stays open for the caller.
    pub async fn receive(&self) -> (TcpStream, RequestBody) {
        timeout(WAIT, async {
            let (mut stream, _) = self.listener.accept().await.unwrap();
            let mut reader = FrameReader::new(1024);
            let frame = reader.read_frame(&mut stream).await.unwrap().unwrap();
            let (_, body) = decode_request(&frame).unwrap();
            (stream, body)
        })
        .await
        .expect("fake peer received nothing")
    }

    pub async fn send(&self, to: &ServerInfo, body: RequestBody) {
        send_as(&self.identity, to, body).await;
    }
}

/// Writes one frame to `to`, claiming to be `from`.
pub async fn send_as(from: &ServerInfo, to: &ServerInfo, body: RequestBody) {
    let mut stream = TcpStream::connect(to.session_address()).await.unwrap();
    stream.write_all(&encode_frame(&body, from)).await.unwrap();
    stream.shutdown().await.unwrap();
}
