use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier of a shape, chosen by the client that draws it
pub type ShapeId = String;

/// A drawable object: its kind (e.g. "polyline") and its flattened point coordinates
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub kind: String,
    #[serde(default)]
    pub data: Vec<i64>,
}

impl Shape {
    pub fn new(kind: impl Into<String>, data: Vec<i64>) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

/// The uploaded background image of a diagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Background {
    pub id: String,
    pub content_type: String,
    pub content: Vec<u8>,
}
