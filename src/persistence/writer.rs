use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::{PersistError, RetryPolicy, Row, StorageBackend, Table};

/// Appends shape points and chat messages to durable storage.
///
/// Row ids continue from the table's current row count. The count is read
/// once per operation, before the retried transaction starts, so a retry
/// re-inserts exactly the same rows. Count-then-insert is not atomic: two
/// concurrent writers can read the same count and hand out colliding ids.
/// Moving id generation into the database (a sequence or identity column)
/// only needs to change [`PersistenceWriter::next_row_id`].
#[derive(Clone)]
pub struct PersistenceWriter {
    backend: Arc<dyn StorageBackend>,
    retry: RetryPolicy,
}

impl PersistenceWriter {
    pub fn new(backend: Arc<dyn StorageBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Record one row per point of a shape. Returns the number of rows written.
    pub async fn append_shape_points(
        &self,
        shape_id: &str,
        kind: &str,
        points: &[i64],
    ) -> Result<usize, PersistError> {
        if points.is_empty() {
            debug!("No points to record for shape {}", shape_id);
            return Ok(0);
        }

        let base = self.next_row_id(Table::ShapesInfo).await?;
        let rows: Vec<Row> = points
            .iter()
            .zip(base..)
            .map(|(&point, id)| Row::ShapePoint {
                id,
                shape_id: shape_id.to_string(),
                kind: kind.to_string(),
                point,
            })
            .collect();

        self.run_durably(Table::ShapesInfo, rows).await
    }

    /// Record one chat message stamped with the current time
    pub async fn append_chat_message(
        &self,
        username: &str,
        message: &str,
    ) -> Result<usize, PersistError> {
        let id = self.next_row_id(Table::Chat).await?;
        let row = Row::Chat {
            id,
            username: username.to_string(),
            message: message.to_string(),
            time: Utc::now().to_rfc3339(),
        };

        self.run_durably(Table::Chat, vec![row]).await
    }

    /// First free surrogate id of `table`
    async fn next_row_id(&self, table: Table) -> Result<i64, PersistError> {
        let backend = &self.backend;
        let count = self
            .retry
            .run(table, move || backend.count_rows(table))
            .await?;
        Ok(count + 1)
    }

    async fn run_durably(&self, table: Table, rows: Vec<Row>) -> Result<usize, PersistError> {
        let backend = &self.backend;
        let batch = rows.as_slice();
        self.retry
            .run(table, move || backend.insert_rows(table, batch))
            .await?;
        info!("Recorded {} rows in {}", rows.len(), table);
        Ok(rows.len())
    }
}
