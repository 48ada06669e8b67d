use std::sync::Arc;

use crate::broadcast::Dispatcher;
use crate::diagram::Diagram;
use crate::hub::DrawHub;
use crate::persistence::PersistenceWriter;
use crate::session::SessionCoordinator;

/// Everything request handlers share: one whiteboard room and its collaborators
#[derive(Clone)]
pub struct AppState {
    pub hub: DrawHub,
    pub sessions: SessionCoordinator,
}

impl AppState {
    pub fn new(writer: PersistenceWriter) -> Arc<Self> {
        let diagram = Arc::new(Diagram::new());
        let dispatcher = Arc::new(Dispatcher::new());
        Arc::new(Self {
            sessions: SessionCoordinator::new(diagram.clone(), dispatcher.clone()),
            hub: DrawHub::new(diagram, dispatcher, writer),
        })
    }
}
