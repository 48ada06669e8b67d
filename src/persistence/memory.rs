use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::{Row, StorageBackend, StorageError, Table};

/// Storage kept in process memory. Used when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Table, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every row stored in `table`, in insertion order
    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.tables.lock().get(&table).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn count_rows(&self, table: Table) -> Result<i64, StorageError> {
        Ok(self.tables.lock().get(&table).map_or(0, |rows| rows.len() as i64))
    }

    async fn insert_rows(&self, table: Table, rows: &[Row]) -> Result<(), StorageError> {
        if let Some(row) = rows.iter().find(|row| row.table() != table) {
            return Err(StorageError::Permanent(format!(
                "row {} does not belong to table {}",
                row.id(),
                table
            )));
        }
        self.tables
            .lock()
            .entry(table)
            .or_default()
            .extend_from_slice(rows);
        Ok(())
    }
}
