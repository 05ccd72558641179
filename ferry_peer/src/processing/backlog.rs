use std::collections::VecDeque;

use ferry_core_lib::data::{
    requests::{RequestBody, RequestType},
    ServerInfo,
};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::connectivity::AcceptedConnection;

/// A decoded request waiting for its turn, together with the connection it
/// arrived on and any bytes read past its frame.
pub struct QueuedRequest {
    pub request_id: u32,
    pub remote_server: ServerInfo,
    pub body: RequestBody,
    pub connection: AcceptedConnection,
    pub leftover: Vec<u8>,
}

impl QueuedRequest {
    pub fn request_type(&self) -> RequestType {
        self.body.request_type()
    }
}

/// FIFO of received requests. Arrival order is kept across all peers.
#[derive(Default)]
pub struct RequestBacklog {
    queue: Mutex<VecDeque<QueuedRequest>>,
    notify: Notify,
}

impl RequestBacklog {
    pub fn new() -> RequestBacklog {
        RequestBacklog::default()
    }

    /// Returns the number of requests waiting, this one included.
    pub fn push(&self, request: QueuedRequest) -> usize {
        let length = {
            let mut queue = self.queue.lock();
            queue.push_back(request);
            queue.len()
        };
        self.notify.notify_one();
        length
    }

    /// Resolves once at least one request is waiting. The request stays
    /// queued until [`RequestBacklog::try_pop`] takes it.
    pub async fn wait_for_request(&self) {
        while self.is_empty() {
            self.notify.notified().await;
        }
    }

    pub fn try_pop(&self) -> Option<QueuedRequest> {
        self.queue.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn queued_ids(&self) -> Vec<u32> {
        self.queue
            .lock()
            .iter()
            .map(|request| request.request_id)
            .collect()
    }
}
