use std::sync::Arc;

use ferry_core_lib::data::{
    requests::{Request, RequestBody, RequestDirection, RequestStatus},
    ServerInfo,
};
use parking_lot::Mutex;

#[derive(Default)]
struct RequestLogData {
    requests: Vec<Request>,
    next_request_id: u32,
}

/// Every request sent or received during the session, in creation order.
#[derive(Clone, Default)]
pub struct RequestLog {
    data: Arc<Mutex<RequestLogData>>,
}

impl RequestLog {
    pub fn new() -> RequestLog {
        RequestLog::default()
    }

    pub fn record(
        &self,
        direction: RequestDirection,
        remote_server: ServerInfo,
        body: RequestBody,
        status: RequestStatus,
    ) -> u32 {
        let mut data = self.data.lock();
        data.next_request_id += 1;
        let mut request = Request::new(data.next_request_id, direction, remote_server, body);
        request.update_status(status);
        data.requests.push(request);
        data.next_request_id
    }

    pub fn update_status(&self, request_id: u32, status: RequestStatus) {
        let mut data = self.data.lock();
        if let Some(request) = data.requests.iter_mut().find(|request| request.id == request_id) {
            if !request.update_status(status) {
                debug!("Request {} already final, ignoring {:?}", request_id, status);
            }
        }
    }

    pub fn fail(&self, request_id: u32, message: String) {
        let mut data = self.data.lock();
        if let Some(request) = data.requests.iter_mut().find(|request| request.id == request_id) {
            request.fail(message);
        }
    }

    pub fn get(&self, request_id: u32) -> Option<Request> {
        self.data
            .lock()
            .requests
            .iter()
            .find(|request| request.id == request_id)
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<Request> {
        self.data.lock().requests.clone()
    }
}
