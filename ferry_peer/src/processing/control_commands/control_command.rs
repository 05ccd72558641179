use async_trait::async_trait;
use ferry_core_lib::{data::ServerInfo, Result};

use crate::{connectivity::AcceptedConnection, peer::PeerContext};

/// Where a request came from: the claimed sender and the connection it was
/// read off, including bytes read past its frame.
pub struct RequestOrigin {
    pub remote_server: ServerInfo,
    pub connection: AcceptedConnection,
    pub leftover: Vec<u8>,
}

#[async_trait]
pub trait ControlCommand: Send + Sync {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()>;
}
