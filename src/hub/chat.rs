use super::{DrawHub, PendingWrite};
use crate::models::ServerEvent;

impl DrawHub {
    /// Relay a chat message to the other connections and record it.
    /// Messages are never kept in the diagram.
    pub fn send_message(&self, from: &str, name: String, message: String) -> PendingWrite {
        self.dispatcher.to_all_except(
            from,
            ServerEvent::NewMessage {
                name: name.clone(),
                message: message.clone(),
            },
        );

        let writer = self.writer.clone();
        self.record(format!("chat message from {name}"), async move {
            writer.append_chat_message(&name, &message).await
        })
    }
}
