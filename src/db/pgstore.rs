use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Error as SqlxError, Row as _};
use std::time::Duration;
use tracing::{error, info};

use crate::persistence::{Row, StorageBackend, StorageError, Table};

/// Postgres storage for shape points and chat history
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new database connection pool
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    /// * `max_connections` - Upper bound of pooled connections
    ///
    /// # Returns
    /// * `Result<Self, SqlxError>` - Connected store or error
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600)) // Close idle connections after 10 minutes
            .max_lifetime(Duration::from_secs(1800)) // Recycle connections after 30 minutes
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    /// Create the `ShapesInfo` and `Chat` tables if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), SqlxError> {
        let shapes_sql = r#"
            CREATE TABLE IF NOT EXISTS "ShapesInfo" (
                "Id" BIGINT NOT NULL,
                "ShapeInfoId" TEXT NOT NULL,
                "ShapeKind" TEXT NOT NULL,
                "ShapePlotPoint" BIGINT NOT NULL
            )
        "#;
        let chat_sql = r#"
            CREATE TABLE IF NOT EXISTS "Chat" (
                "Id" BIGINT NOT NULL,
                "Username" TEXT NOT NULL,
                "Messages" TEXT NOT NULL,
                "MessageTime" TEXT NOT NULL
            )
        "#;

        sqlx::query(shapes_sql).execute(&self.pool).await?;
        sqlx::query(chat_sql).execute(&self.pool).await?;
        info!("Database schema ready");
        Ok(())
    }

    fn log_pool_state(&self, action: &str, table: Table) {
        let pool_idle = self.pool.num_idle();
        let pool_size = self.pool.size() as usize;
        info!(
            "{} {}. Pool connections: {} idle, {} in use",
            action,
            table,
            pool_idle,
            pool_size.saturating_sub(pool_idle)
        );
    }
}

#[async_trait]
impl StorageBackend for PgStore {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    async fn count_rows(&self, table: Table) -> Result<i64, StorageError> {
        let query_sql = format!(r#"SELECT COUNT(*) AS n FROM "{}""#, table.name());
        let row = sqlx::query(&query_sql)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        row.try_get::<i64, _>("n").map_err(classify)
    }

    async fn insert_rows(&self, table: Table, rows: &[Row]) -> Result<(), StorageError> {
        self.log_pool_state("Inserting into", table);

        // Begin a transaction
        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                error!(
                    "Failed to acquire connection from pool for {}: {}. Pool state: {} idle, {} total",
                    table,
                    e,
                    self.pool.num_idle(),
                    self.pool.size()
                );
                return Err(classify(e));
            }
        };

        for row in rows {
            let query = match row {
                Row::ShapePoint { id, shape_id, kind, point } => sqlx::query(
                    r#"
                    INSERT INTO "ShapesInfo"("Id", "ShapeInfoId", "ShapeKind", "ShapePlotPoint")
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(*id)
                .bind(shape_id.as_str())
                .bind(kind.as_str())
                .bind(*point),
                Row::Chat { id, username, message, time } => sqlx::query(
                    r#"
                    INSERT INTO "Chat"("Id", "Username", "Messages", "MessageTime")
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(*id)
                .bind(username.as_str())
                .bind(message.as_str())
                .bind(time.as_str()),
            };
            query.execute(&mut *tx).await.map_err(classify)?;
        }

        // Commit the transaction; dropping it on an early return rolls back
        tx.commit().await.map_err(classify)?;
        Ok(())
    }
}

/// Sort a sqlx error into retryable and final failures
fn classify(e: SqlxError) -> StorageError {
    let transient = match &e {
        SqlxError::Io(_) | SqlxError::PoolTimedOut | SqlxError::WorkerCrashed => true,
        SqlxError::Database(db) => db
            .code()
            .map(|code| is_transient_sqlstate(&code))
            .unwrap_or(false),
        _ => false,
    };
    if transient {
        StorageError::Transient(e.to_string())
    } else {
        StorageError::Permanent(e.to_string())
    }
}

/// Serialization failures, deadlocks and connection exceptions
fn is_transient_sqlstate(code: &str) -> bool {
    code == "40001" || code == "40P01" || code.starts_with("08")
}
