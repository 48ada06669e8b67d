//! Handlers for client-initiated operations on the shared diagram.
//!
//! Every handler applies its mutation to the [`Diagram`], broadcasts the delta
//! to the other connections, and only then records it durably. Recording runs
//! on its own task: it never delays the broadcast, a disconnect never cancels
//! it, and its failure never rolls back the in-memory state.

mod background;
mod chat;
mod error;
mod shapes;

pub use error::HubError;

use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::broadcast::Dispatcher;
use crate::diagram::Diagram;
use crate::models::ClientInvocation;
use crate::persistence::{PersistError, PersistenceWriter};

/// Handle to a durable write running in the background; resolves to the rows written
pub type PendingWrite = JoinHandle<Result<usize, PersistError>>;

#[derive(Clone)]
pub struct DrawHub {
    diagram: Arc<Diagram>,
    dispatcher: Arc<Dispatcher>,
    writer: PersistenceWriter,
}

impl DrawHub {
    pub fn new(diagram: Arc<Diagram>, dispatcher: Arc<Dispatcher>, writer: PersistenceWriter) -> Self {
        Self {
            diagram,
            dispatcher,
            writer,
        }
    }

    pub fn diagram(&self) -> &Arc<Diagram> {
        &self.diagram
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn writer(&self) -> &PersistenceWriter {
        &self.writer
    }

    /// Route an invocation from connection `from` to its handler
    pub fn invoke(
        &self,
        from: &str,
        invocation: ClientInvocation,
    ) -> Result<Option<PendingWrite>, HubError> {
        debug!("{} invoked by {}", invocation.method(), from);
        match invocation {
            ClientInvocation::PatchShape { id, data } => self.patch_shape(from, id, data),
            ClientInvocation::UpdateShape { id, shape } => self.update_shape(from, id, shape),
            ClientInvocation::RemoveShape { id } => self.remove_shape(from, id).map(|_| None),
            ClientInvocation::Clear => {
                self.clear(from);
                Ok(None)
            }
            ClientInvocation::SendMessage { name, message } => {
                Ok(Some(self.send_message(from, name, message)))
            }
        }
    }

    /// Run a durable write detached from the calling connection
    fn record<Fut>(&self, what: String, write: Fut) -> PendingWrite
    where
        Fut: Future<Output = Result<usize, PersistError>> + Send + 'static,
    {
        tokio::spawn(async move {
            let result = write.await;
            if let Err(e) = &result {
                error!("Failed to record {}: {}", what, e);
            }
            result
        })
    }
}

fn require_id(method: &'static str, id: &str) -> Result<(), HubError> {
    if id.is_empty() {
        return Err(HubError::EmptyShapeId { method });
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::{connect, drain, unreachable_hub};
    use super::*;
    use crate::models::{ServerEvent, Shape};
    use crate::persistence::Table;

    #[tokio::test]
    async fn failed_writes_keep_applied_state_and_broadcasts() {
        let hub = unreachable_hub();
        hub.diagram()
            .upsert("s1", Shape::new("polyline", vec![1, 2]), || {});
        let mut peer = connect(&hub, "c2");

        let patch = hub
            .invoke("c1", ClientInvocation::PatchShape { id: "s1".into(), data: vec![3, 4] })
            .unwrap()
            .unwrap();
        let chat = hub
            .invoke(
                "c1",
                ClientInvocation::SendMessage { name: "ann".into(), message: "hi".into() },
            )
            .unwrap()
            .unwrap();

        assert!(matches!(
            patch.await.unwrap(),
            Err(PersistError::RetriesExhausted { table: Table::ShapesInfo, attempts: 2, .. })
        ));
        assert!(matches!(
            chat.await.unwrap(),
            Err(PersistError::RetriesExhausted { table: Table::Chat, attempts: 2, .. })
        ));

        assert_eq!(hub.diagram().get("s1").unwrap().data, vec![1, 2, 3, 4]);
        assert_eq!(
            drain(&mut peer),
            vec![
                ServerEvent::ShapePatched { id: "s1".into(), data: vec![3, 4] },
                ServerEvent::NewMessage { name: "ann".into(), message: "hi".into() },
            ]
        );
    }
}
