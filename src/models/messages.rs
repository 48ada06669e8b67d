use serde::{Deserialize, Serialize};
use crate::models::{Shape, ShapeId};

/// Invocations a client sends over its websocket
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ClientInvocation {
    PatchShape { id: ShapeId, data: Vec<i64> },
    UpdateShape { id: ShapeId, shape: Shape },
    RemoveShape { id: ShapeId },
    Clear,
    SendMessage { name: String, message: String },
}

impl ClientInvocation {
    /// Method name as exposed to clients, used for logging
    pub fn method(&self) -> &'static str {
        match self {
            ClientInvocation::PatchShape { .. } => "PatchShape",
            ClientInvocation::UpdateShape { .. } => "UpdateShape",
            ClientInvocation::RemoveShape { .. } => "RemoveShape",
            ClientInvocation::Clear => "Clear",
            ClientInvocation::SendMessage { .. } => "SendMessage",
        }
    }
}

/// Events the server pushes to connected clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerEvent {
    ShapeUpdated { id: ShapeId, shape: Shape },
    ShapePatched { id: ShapeId, data: Vec<i64> },
    ShapeRemoved { id: ShapeId },
    BackgroundUpdated { id: String },
    Clear,
    UserUpdated { count: usize },
    NewMessage { name: String, message: String },
}
