use thiserror::Error;

/// An invocation rejected before it touched the diagram
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("{method} requires a non-empty shape id")]
    EmptyShapeId { method: &'static str },
}
