#[macro_use]
extern crate log;

pub mod configuration;
pub mod connectivity;
pub mod events;
pub mod peer;
pub mod processing;
pub mod session;
pub mod transfers;

pub use events::{EventSender, ServerEvent};
pub use peer::{Peer, PeerContext};
pub use session::SessionState;
