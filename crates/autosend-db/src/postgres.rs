//! PostgreSQL message store.
//!
//! Claims run in one transaction: rows are selected `FOR UPDATE SKIP LOCKED`
//! and flipped to `pending` before commit, so two dispatchers sharing the
//! table never claim the same message.

use async_trait::async_trait;
use autosend_core::config::DatabaseConfig;
use autosend_core::error::{AutosendError, Result};
use autosend_core::{MessageStatus, MessageStore, PendingMessage};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};

/// Shared SELECT column list for message queries.
const MESSAGE_COLUMNS: &str =
    "message_id, phone_number, message_content, sending_status, created_at, updated_at";

/// Message store backed by the `messages` table.
#[derive(Clone)]
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    /// Connect a pool using the database config.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| AutosendError::Store(format!("Failed to connect to database: {e}")))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AutosendError::Store(format!("Database ping failed: {e}")))?;
        Ok(())
    }

    /// Create the `messages` table and its claim index if missing.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                message_id TEXT PRIMARY KEY,
                phone_number TEXT NOT NULL,
                message_content TEXT NOT NULL,
                sending_status TEXT NOT NULL DEFAULT 'waiting'
                    CHECK (sending_status IN ('waiting', 'pending', 'sent')),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AutosendError::Store(format!("Failed to create messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_waiting ON messages(created_at) WHERE sending_status = 'waiting';",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AutosendError::Store(format!("Failed to create messages index: {e}")))?;

        tracing::info!("💾 Messages table migrations completed");
        Ok(())
    }

    /// Insert a new `waiting` message. Used by seeding tools and tests.
    pub async fn insert_waiting(&self, id: &str, recipient: &str, content: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (message_id, phone_number, message_content, sending_status) VALUES ($1, $2, $3, 'waiting')",
        )
        .bind(id)
        .bind(recipient)
        .bind(content)
        .execute(&self.pool)
        .await
        .map_err(|e| AutosendError::Store(format!("Failed to insert message {id}: {e}")))?;
        Ok(())
    }

    /// Load one message by ID.
    pub async fn get(&self, id: &str) -> Result<Option<PendingMessage>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AutosendError::Store(format!("Failed to load message {id}: {e}")))?;
        row.as_ref().map(row_to_message).transpose()
    }
}

/// Map a database row to a PendingMessage.
fn row_to_message(row: &PgRow) -> Result<PendingMessage> {
    let decode =
        |e: sqlx::Error| AutosendError::Store(format!("Failed to decode message row: {e}"));
    let status: String = row.try_get("sending_status").map_err(decode)?;
    Ok(PendingMessage {
        id: row.try_get("message_id").map_err(decode)?,
        recipient: row.try_get("phone_number").map_err(decode)?,
        content: row.try_get("message_content").map_err(decode)?,
        status: status.parse()?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(decode)?,
    })
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn claim_pending(&self, limit: usize) -> Result<Vec<PendingMessage>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AutosendError::Store(format!("Failed to begin claim transaction: {e}")))?;

        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE sending_status = 'waiting' \
             ORDER BY created_at ASC, message_id ASC \
             LIMIT $1 \
             FOR UPDATE SKIP LOCKED"
        ))
        .bind(limit as i64)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AutosendError::Store(format!("Failed to select waiting messages: {e}")))?;

        let mut messages = rows.iter().map(row_to_message).collect::<Result<Vec<_>>>()?;
        if messages.is_empty() {
            // Dropping the transaction rolls it back; nothing was locked.
            return Ok(messages);
        }

        let ids: Vec<String> = messages.iter().map(|m| m.id.clone()).collect();
        sqlx::query(
            "UPDATE messages SET sending_status = 'pending', updated_at = NOW() WHERE message_id = ANY($1)",
        )
        .bind(&ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| AutosendError::Store(format!("Failed to mark messages pending: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AutosendError::Store(format!("Failed to commit claim: {e}")))?;

        let claimed_at = Utc::now();
        for message in &mut messages {
            message.status = MessageStatus::Pending;
            message.updated_at = claimed_at;
        }
        Ok(messages)
    }

    async fn set_status(&self, id: &str, status: MessageStatus) -> Result<()> {
        let result = sqlx::query(
            "UPDATE messages SET sending_status = $1, updated_at = NOW() WHERE message_id = $2",
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AutosendError::Store(format!("Failed to update message {id}: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AutosendError::Store(format!("Message {id} not found")));
        }
        Ok(())
    }
}
