use std::net::SocketAddr;

use tokio::net::TcpStream;
use uuid::Uuid;

/// A socket handed over by the listener. The uuid tags log lines for the
/// lifetime of the connection.
pub struct AcceptedConnection {
    pub uuid: Uuid,
    pub stream: TcpStream,
    pub remote_address: SocketAddr,
}

impl AcceptedConnection {
    pub fn new(stream: TcpStream, remote_address: SocketAddr) -> AcceptedConnection {
        AcceptedConnection {
            uuid: Uuid::new_v4(),
            stream,
            remote_address,
        }
    }
}
