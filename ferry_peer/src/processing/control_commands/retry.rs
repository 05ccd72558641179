use async_trait::async_trait;
use ferry_core_lib::{data::requests::TransferCorrelation, Result};

use crate::peer::PeerContext;

use super::{ControlCommand, RequestOrigin};

pub struct RetryTransferCommand {
    pub correlation: TransferCorrelation,
}

#[async_trait]
impl ControlCommand for RetryTransferCommand {
    async fn execute(&self, context: &PeerContext, origin: RequestOrigin) -> Result<()> {
        debug!("{} asks to retry {:?}", origin.remote_server, self.correlation);
        context
            .engine
            .handle_retry_request(&origin.remote_server, self.correlation)
            .await
    }
}

pub struct RetryLimitExceededCommand {
    pub correlation: TransferCorrelation,
    pub retry_limit: u32,
    pub lockout_expires_at: u64,
}

#[async_trait]
impl ControlCommand for RetryLimitExceededCommand {
    async fn execute(&self, context: &PeerContext, _origin: RequestOrigin) -> Result<()> {
        context.engine.handle_retry_limit_exceeded(
            self.correlation,
            self.retry_limit,
            self.lockout_expires_at,
        )
    }
}
