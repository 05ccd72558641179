mod backlog;
pub use backlog::{QueuedRequest, RequestBacklog};
pub mod control_commands;
mod pipeline;
pub use pipeline::{ProcessingGuard, RequestPipeline};
mod request_handler;
pub use request_handler::RequestHandler;
mod request_log;
pub use request_log::RequestLog;
