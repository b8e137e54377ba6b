use async_trait::async_trait;
use tokio_postgres::NoTls;
use tracing::{debug, error, info, warn};

use crate::{
    clients::AuditStore,
    errors::WriterError,
    models::{audit::AuditRecord, validation::validate_table_name},
};

/// PostgreSQL audit store. Every insert runs on its own scoped connection,
/// which is torn down before `insert` returns or when its future is dropped.
pub struct DatabaseClient {
    database_url: String,
    table: String,
}

impl DatabaseClient {
    pub fn new(database_url: &str, table: &str) -> Result<Self, WriterError> {
        validate_table_name(table)?;

        Ok(Self {
            database_url: database_url.to_string(),
            table: table.to_string(),
        })
    }

    /// Always quoted, so reserved words like `user` work as table names.
    /// `validate_table_name` guarantees the name holds no `"`.
    fn quoted_table(&self) -> String {
        format!("\"{}\"", self.table)
    }

    fn create_table_sql(&self) -> String {
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                message TEXT NOT NULL,
                timestamp TIMESTAMPTZ NOT NULL,
                status TEXT NOT NULL,
                router_key TEXT NOT NULL
            )
            "#,
            self.quoted_table()
        )
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (message, timestamp, status, router_key) VALUES ($1, $2, $3, $4)",
            self.quoted_table()
        )
    }
}

#[async_trait]
impl AuditStore for DatabaseClient {
    async fn insert(&self, record: &AuditRecord) -> Result<(), WriterError> {
        info!("Connecting to PostgreSQL audit store");

        let (client, connection) = tokio_postgres::connect(&self.database_url, NoTls)
            .await
            .map_err(|e| WriterError::Audit(format!("Failed to connect to database: {}", e)))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "PostgreSQL connection closed with error");
            }
        });

        debug!("PostgreSQL connection established");

        let status = record.status.to_string();

        let result = async {
            client.batch_execute(&self.create_table_sql()).await?;
            client
                .execute(
                    &self.insert_sql(),
                    &[&record.message, &record.timestamp, &status, &record.router_key],
                )
                .await
        }
        .await;

        drop(client);
        if let Err(e) = driver.await {
            warn!(error = %e, "PostgreSQL connection task failed");
        }

        result.map_err(|e| {
            error!(
                error = %e,
                router_key = %record.router_key,
                "Failed to write audit record to database"
            );
            WriterError::Audit(format!("Database write failed: {}", e))
        })?;

        debug!(
            router_key = %record.router_key,
            status = %status,
            "Audit record written to database"
        );

        Ok(())
    }
}
