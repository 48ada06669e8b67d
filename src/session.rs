use std::sync::Arc;
use tracing::{info, warn};

use crate::broadcast::{Dispatcher, Outbox};
use crate::diagram::Diagram;
use crate::models::ServerEvent;

/// Runs the join/leave protocol for connections to one diagram
#[derive(Clone)]
pub struct SessionCoordinator {
    diagram: Arc<Diagram>,
    dispatcher: Arc<Dispatcher>,
}

impl SessionCoordinator {
    pub fn new(diagram: Arc<Diagram>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            diagram,
            dispatcher,
        }
    }

    /// Replay the diagram to a joining connection and announce the new user count.
    ///
    /// Registration, replay and the count announcement all happen while the
    /// diagram holds off mutations. Every change is therefore seen by the
    /// joiner exactly once: already folded into the replay, or as a broadcast
    /// queued after it. Returns the user count after the join, or `None` if
    /// `connection_id` was already connected.
    pub fn on_connect(&self, connection_id: &str, outbox: Outbox) -> Option<usize> {
        let joined = self.diagram.replay(|snapshot| {
            if !self.dispatcher.register(connection_id, outbox) {
                return None;
            }

            let replayed = snapshot.shapes.len();
            for (id, shape) in snapshot.shapes {
                self.dispatcher
                    .to_connection(connection_id, ServerEvent::ShapeUpdated { id, shape });
            }
            if let Some(background) = snapshot.background {
                self.dispatcher.to_connection(
                    connection_id,
                    ServerEvent::BackgroundUpdated {
                        id: background.id.clone(),
                    },
                );
            }

            let count = self.diagram.increment_users(|count| {
                self.dispatcher.to_all(ServerEvent::UserUpdated { count });
            });
            Some((replayed, count))
        });

        let Some((replayed, count)) = joined else {
            warn!("Connection {} is already connected, ignoring", connection_id);
            return None;
        };
        info!(
            "Connection {} joined: replayed {} shapes, {} users online",
            connection_id, replayed, count
        );
        Some(count)
    }

    /// Announce a leaving connection. A disconnect without a matching connect
    /// is ignored and returns `None`.
    pub fn on_disconnect(&self, connection_id: &str, reason: Option<&str>) -> Option<usize> {
        if !self.dispatcher.unregister(connection_id) {
            warn!(
                "Disconnect for unknown connection {} ({}), ignoring",
                connection_id,
                reason.unwrap_or("no reason")
            );
            return None;
        }

        let count = self.diagram.decrement_users(|count| {
            self.dispatcher.to_all(ServerEvent::UserUpdated { count });
        });
        info!(
            "Connection {} left ({}): {} users online",
            connection_id,
            reason.unwrap_or("closed"),
            count
        );
        Some(count)
    }
}
