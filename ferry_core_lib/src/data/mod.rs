pub mod requests;

mod cidr;
pub use cidr::Cidr;
mod conversation;
pub use conversation::{Conversation, ConversationLog, TextMessage};
mod server_info;
pub use server_info::ServerInfo;
mod settings;
pub use settings::Settings;
mod timestamps;
pub use timestamps::{from_unix_millis, unix_millis};
