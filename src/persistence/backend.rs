use async_trait::async_trait;
use std::fmt;

use super::StorageError;

/// Durable tables written by the sync core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// `ShapesInfo(Id, ShapeInfoId, ShapeKind, ShapePlotPoint)`, one row per point
    ShapesInfo,
    /// `Chat(Id, Username, Messages, MessageTime)`, one row per message
    Chat,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::ShapesInfo => "ShapesInfo",
            Table::Chat => "Chat",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row to insert. `id` is the surrogate row id derived by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    ShapePoint {
        id: i64,
        shape_id: String,
        kind: String,
        point: i64,
    },
    Chat {
        id: i64,
        username: String,
        message: String,
        time: String,
    },
}

impl Row {
    pub fn id(&self) -> i64 {
        match self {
            Row::ShapePoint { id, .. } | Row::Chat { id, .. } => *id,
        }
    }

    pub fn table(&self) -> Table {
        match self {
            Row::ShapePoint { .. } => Table::ShapesInfo,
            Row::Chat { .. } => Table::Chat,
        }
    }
}

/// Storage the persistence writer appends to.
///
/// `insert_rows` is a single transaction attempt: either every row lands or
/// none does. Retrying is the caller's job.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Short backend name for logs and health output
    fn kind(&self) -> &'static str;

    async fn count_rows(&self, table: Table) -> Result<i64, StorageError>;

    async fn insert_rows(&self, table: Table, rows: &[Row]) -> Result<(), StorageError>;
}
