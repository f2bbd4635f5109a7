//! SQLite-backed conversation store.
//!
//! One unindexed `history` table, one row per turn. The timestamp column has
//! second resolution, so reads break ties on `rowid` to keep insertion order.
//! A `conversations` table records first contacts.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::info;

use super::{ConversationStore, Role, Turn};
use crate::errors::{BotError, Result};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `database_url` and
    /// initialize the schema
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!(database_url = %database_url, "Opening history database");

        let options = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Initialize the database schema
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS history (
                user_id INTEGER,
                role TEXT,
                content TEXT,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS conversations (
                user_id INTEGER PRIMARY KEY,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;

        info!("History schema initialized successfully");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn append(&self, turn: Turn) -> Result<()> {
        sqlx::query("INSERT INTO history (user_id, role, content) VALUES (?, ?, ?)")
            .bind(turn.user_id)
            .bind(turn.role.as_str())
            .bind(&turn.content)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch(&self, user_id: i64, limit: usize) -> Result<Vec<Turn>> {
        let rows = sqlx::query(
            "SELECT role, content, timestamp FROM history
             WHERE user_id = ?
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut turns = Vec::with_capacity(rows.len());
        for row in rows.iter().rev() {
            let role: String = row.try_get("role")?;
            let timestamp: NaiveDateTime = row.try_get("timestamp")?;
            turns.push(Turn {
                user_id,
                role: role
                    .parse::<Role>()
                    .map_err(|e| BotError::Storage(sqlx::Error::Decode(e.into())))?,
                content: row.try_get("content")?,
                timestamp: timestamp.and_utc(),
            });
        }
        Ok(turns)
    }

    async fn ensure(&self, user_id: i64) -> Result<bool> {
        // Users with turns from before the conversations table count as known.
        let result = sqlx::query(
            "INSERT OR IGNORE INTO conversations (user_id)
             SELECT ? WHERE NOT EXISTS (SELECT 1 FROM history WHERE user_id = ?)",
        )
        .bind(user_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
