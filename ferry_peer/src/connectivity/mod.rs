mod connection;
pub use connection::AcceptedConnection;
mod listener;
pub use listener::ConnectionListener;
mod request_sender;
pub use request_sender::RequestSender;
