use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::models::ServerEvent;

/// Identifier the transport assigns to one client connection
pub type ConnectionId = String;

/// Sending half of a connection's outgoing queue. The websocket writer task
/// owns the receiving half and forwards whatever arrives to the socket.
pub type Outbox = UnboundedSender<Arc<ServerEvent>>;

/// Addresses server events to one connection, all connections, or all but the sender.
///
/// Every send only enqueues onto the recipient's outbox, so a call returns as
/// soon as the event is handed to the transport. A closed outbox only affects
/// its own recipient.
#[derive(Default)]
pub struct Dispatcher {
    connections: DashMap<ConnectionId, Outbox>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start addressing events to `id`. Returns false if `id` is already registered.
    pub fn register(&self, id: &str, outbox: Outbox) -> bool {
        match self.connections.entry(id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(outbox);
                true
            }
        }
    }

    /// Stop addressing events to `id`. Returns whether it was registered.
    pub fn unregister(&self, id: &str) -> bool {
        self.connections.remove(id).is_some()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Send to a single connection; returns whether it was handed off
    pub fn to_connection(&self, id: &str, event: ServerEvent) -> bool {
        let Some(outbox) = self.connections.get(id).map(|o| o.value().clone()) else {
            debug!("Dropping event for unknown connection {}", id);
            return false;
        };
        deliver(id, &outbox, Arc::new(event))
    }

    /// Send to every connection except `sender`; returns the number handed off
    pub fn to_all_except(&self, sender: &str, event: ServerEvent) -> usize {
        self.fan_out(Some(sender), Arc::new(event))
    }

    /// Send to every connection; returns the number handed off
    pub fn to_all(&self, event: ServerEvent) -> usize {
        self.fan_out(None, Arc::new(event))
    }

    fn fan_out(&self, without: Option<&str>, event: Arc<ServerEvent>) -> usize {
        // Clone the outboxes first so no shard lock is held while sending
        let recipients: Vec<(ConnectionId, Outbox)> = self
            .connections
            .iter()
            .filter(|entry| without != Some(entry.key().as_str()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        recipients
            .iter()
            .filter(|(id, outbox)| deliver(id, outbox, event.clone()))
            .count()
    }
}

fn deliver(id: &str, outbox: &Outbox, event: Arc<ServerEvent>) -> bool {
    match outbox.send(event) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to deliver {:?} to connection {}: outbox closed", e.0, id);
            false
        }
    }
}
