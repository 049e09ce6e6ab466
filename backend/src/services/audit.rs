//! Audit log service
//!
//! Append-only transaction log. Written by every mutating operation and by
//! searches; never read back by the ledger, only by operators.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Operation, TransactionLog, TransactionStatus};

/// Audit service
#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

type LogTuple = (
    Uuid,
    Uuid,
    String,
    Option<Uuid>,
    Option<serde_json::Value>,
    String,
    DateTime<Utc>,
);

fn log_from(r: LogTuple) -> TransactionLog {
    TransactionLog {
        id: r.0,
        inventory_id: r.1,
        operation: r.2,
        item_id: r.3,
        data: r.4,
        status: r.5,
        timestamp: r.6,
    }
}

impl AuditService {
    /// Create a new AuditService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append one entry to the inventory's transaction log
    pub async fn log_transaction(
        &self,
        inventory_id: Uuid,
        operation: Operation,
        item_id: Option<Uuid>,
        data: Option<serde_json::Value>,
        status: TransactionStatus,
    ) -> AppResult<TransactionLog> {
        let row = sqlx::query_as::<_, LogTuple>(
            r#"
            INSERT INTO transaction_log (inventory_id, operation, item_id, data, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, inventory_id, operation, item_id, data, status, timestamp
            "#,
        )
        .bind(inventory_id)
        .bind(operation.as_str())
        .bind(item_id)
        .bind(data)
        .bind(status.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::debug!("Logged transaction: {} ({})", row.2, row.0);
        Ok(log_from(row))
    }

    /// Read back one inventory's log entries, newest first, optionally
    /// filtered by status
    pub async fn get_transaction_logs(
        &self,
        inventory_id: Uuid,
        limit: i64,
        status: Option<TransactionStatus>,
    ) -> AppResult<Vec<TransactionLog>> {
        let rows = sqlx::query_as::<_, LogTuple>(
            r#"
            SELECT id, inventory_id, operation, item_id, data, status, timestamp
            FROM transaction_log
            WHERE inventory_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY timestamp DESC
            LIMIT $3
            "#,
        )
        .bind(inventory_id)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(log_from).collect())
    }
}
