use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{debug, error, info};

use crate::{
    activities::{MetadataStore, SnapshotStore},
    models::notification::SendingSnapshot,
};

pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        info!("Connecting to PostgreSQL database");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

        info!("PostgreSQL connection established");

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), Error> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| anyhow!("Migration failed: {}", e))?;

        info!("Database migrations applied");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow!("Database health check failed: {}", e))?;

        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for DatabaseClient {
    async fn upsert(&self, snapshot: &SendingSnapshot) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO sending_notifications (
                partition_key,
                row_key,
                notification_id,
                content
            )
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (partition_key, row_key)
            DO UPDATE SET
                notification_id = EXCLUDED.notification_id,
                content = EXCLUDED.content,
                updated_at = now()
            "#,
        )
        .bind(&snapshot.partition_key)
        .bind(&snapshot.row_key)
        .bind(&snapshot.notification_id)
        .bind(&snapshot.content)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                notification_id = %snapshot.notification_id,
                "Failed to upsert sending snapshot"
            );
            anyhow!("Snapshot upsert failed: {}", e)
        })?;

        debug!(
            notification_id = %snapshot.notification_id,
            "Sending snapshot upserted"
        );

        Ok(())
    }
}

#[async_trait]
impl MetadataStore for DatabaseClient {
    async fn append_failure(&self, notification_id: &str, message: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO notifications (notification_id, error_message)
            VALUES ($1, $2)
            ON CONFLICT (notification_id)
            DO UPDATE SET
                error_message = CASE
                    WHEN notifications.error_message IS NULL
                        OR notifications.error_message = ''
                    THEN EXCLUDED.error_message
                    ELSE notifications.error_message || '; ' || EXCLUDED.error_message
                END
            "#,
        )
        .bind(notification_id)
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                notification_id = %notification_id,
                "Failed to record failure annotation"
            );
            anyhow!("Failure annotation write failed: {}", e)
        })?;

        debug!(
            notification_id = %notification_id,
            "Failure annotation recorded"
        );

        Ok(())
    }
}
