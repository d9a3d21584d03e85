//! PostgreSQL implementation of the audit sink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::AuditRecord;
use crate::audit::{AuditEntry, AuditSink};
use crate::error::BookingError;

/// Durable audit sink backed by `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresAuditSink {
    pool: PgPool,
}

impl PostgresAuditSink {
    /// Creates a new sink with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `audit_log` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`BookingError::PersistenceError`] on database failure.
    pub async fn ensure_schema(&self) -> Result<(), BookingError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS audit_log (\
                id BIGSERIAL PRIMARY KEY, \
                action TEXT NOT NULL, \
                entity_type TEXT NOT NULL, \
                entity_id UUID NOT NULL, \
                user_id UUID NOT NULL, \
                details JSONB NOT NULL, \
                recorded_at TIMESTAMPTZ NOT NULL DEFAULT now()\
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| BookingError::PersistenceError(e.to_string()))?;
        Ok(())
    }

    /// Loads the most recent audit entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`BookingError::PersistenceError`] on database failure.
    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditRecord>, BookingError> {
        let rows = sqlx::query_as::<_, (i64, String, String, Uuid, Uuid, serde_json::Value, DateTime<Utc>)>(
            "SELECT id, action, entity_type, entity_id, user_id, details, recorded_at \
             FROM audit_log ORDER BY recorded_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BookingError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, action, entity_type, entity_id, user_id, details, recorded_at)| AuditRecord {
                    id,
                    action,
                    entity_type,
                    entity_id,
                    user_id,
                    details,
                    recorded_at,
                },
            )
            .collect())
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), BookingError> {
        sqlx::query(
            "INSERT INTO audit_log (action, entity_type, entity_id, user_id, details, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.action.as_str())
        .bind(entry.entity_type.as_str())
        .bind(entry.entity_id)
        .bind(*entry.user_id.as_uuid())
        .bind(&entry.details)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| BookingError::PersistenceError(e.to_string()))?;
        Ok(())
    }
}
