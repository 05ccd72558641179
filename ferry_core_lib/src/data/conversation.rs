use std::time::SystemTime;

use super::{requests::RequestDirection, ServerInfo};

#[derive(Clone, Debug)]
pub struct TextMessage {
    pub timestamp: SystemTime,
    pub direction: RequestDirection,
    pub text: String,
}

/// Append-only message history with one remote peer.
#[derive(Clone, Debug)]
pub struct Conversation {
    pub remote_server: ServerInfo,
    pub messages: Vec<TextMessage>,
}

#[derive(Default)]
pub struct ConversationLog {
    conversations: Vec<Conversation>,
}

impl ConversationLog {
    pub fn new() -> ConversationLog {
        ConversationLog::default()
    }

    pub fn append(
        &mut self,
        remote_server: &ServerInfo,
        direction: RequestDirection,
        text: String,
    ) {
        let message = TextMessage {
            timestamp: SystemTime::now(),
            direction,
            text,
        };

        match self
            .conversations
            .iter_mut()
            .find(|conversation| conversation.remote_server.is_same_peer(remote_server))
        {
            Some(conversation) => conversation.messages.push(message),
            None => self.conversations.push(Conversation {
                remote_server: remote_server.clone(),
                messages: vec![message],
            }),
        }
    }

    pub fn with_peer(&self, remote_server: &ServerInfo) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|conversation| conversation.remote_server.is_same_peer(remote_server))
    }

    pub fn all(&self) -> &[Conversation] {
        &self.conversations
    }
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;

    use super::*;

    #[test]
    fn test_groups_messages_by_peer() {
        let ip: IpAddr = "10.0.0.2".parse().unwrap();
        let alice = ServerInfo::new(ip, 7000);
        let alice_again = ServerInfo::new(ip, 7000);
        let bob = ServerInfo::new(ip, 7001);

        let mut log = ConversationLog::new();
        log.append(&alice, RequestDirection::Received, "hi".to_string());
        log.append(&bob, RequestDirection::Sent, "hello bob".to_string());
        log.append(&alice_again, RequestDirection::Sent, "hi back".to_string());

        assert_eq!(log.all().len(), 2);
        let texts: Vec<&str> = log
            .with_peer(&alice)
            .unwrap()
            .messages
            .iter()
            .map(|message| message.text.as_str())
            .collect();
        assert_eq!(texts, vec!["hi", "hi back"]);
    }
}
