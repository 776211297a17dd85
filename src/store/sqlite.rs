//! SQLite implementation of [`PremiumStore`].
//!
//! Reads and plain issuance touch exactly one row. Event-keyed issuance is
//! the one multi-statement path: the token insert and the event claim share
//! a transaction so concurrent deliveries of the same event cannot both
//! commit a token.

use crate::error::StorageError;
use crate::store::{generate_token, PremiumStore, PremiumToken, SubscriptionType};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::{debug, info};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file at `path`.
    pub async fn connect(path: &Path) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        info!("premium-token store opened at {}", path.display());
        Ok(Self { pool })
    }

    /// In-memory store for tests. A single connection is pinned open so the
    /// database survives for the lifetime of the pool.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    /// Direct pool access, used by tests to rewrite timestamps.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Point lookup of a full token row.
    pub async fn get(&self, token: &str) -> Result<Option<PremiumToken>, StorageError> {
        let row = sqlx::query_as::<_, PremiumToken>(
            "SELECT token, created_at, expires_at, subscription_type, is_active \
             FROM premium_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl PremiumStore for SqliteStore {
    async fn initialize(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS premium_tokens (
                token             TEXT PRIMARY KEY,
                created_at        TEXT NOT NULL,
                expires_at        TEXT NOT NULL,
                subscription_type TEXT NOT NULL,
                is_active         INTEGER NOT NULL DEFAULT 1
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS processed_events (
                event_id     TEXT PRIMARY KEY,
                token        TEXT NOT NULL,
                processed_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn issue(&self, plan: SubscriptionType) -> Result<String, StorageError> {
        let token = generate_token();
        let now = Utc::now();
        let expires_at = now + plan.duration();

        sqlx::query(
            "INSERT INTO premium_tokens (token, created_at, expires_at, subscription_type, is_active) \
             VALUES (?, ?, ?, ?, 1)",
        )
        .bind(&token)
        .bind(now)
        .bind(expires_at)
        .bind(plan.as_str())
        .execute(&self.pool)
        .await?;

        info!(plan = plan.as_str(), %expires_at, "premium token issued");
        Ok(token)
    }

    async fn issue_for_event(
        &self,
        event_id: &str,
        plan: SubscriptionType,
    ) -> Result<String, StorageError> {
        // Token insert and event claim commit atomically: a delivery either
        // owns the event row and its token, or sees the winner's and issues
        // nothing.
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, String>(
            "SELECT token FROM processed_events WHERE event_id = ?",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(token) = existing {
            debug!(event_id, "duplicate checkout event, reusing issued token");
            return Ok(token);
        }

        let token = generate_token();
        let now = Utc::now();
        let expires_at = now + plan.duration();

        sqlx::query(
            "INSERT INTO premium_tokens (token, created_at, expires_at, subscription_type, is_active) \
             VALUES (?, ?, ?, ?, 1)",
        )
        .bind(&token)
        .bind(now)
        .bind(expires_at)
        .bind(plan.as_str())
        .execute(&mut *tx)
        .await?;

        let claimed = sqlx::query(
            "INSERT OR IGNORE INTO processed_events (event_id, token, processed_at) \
             VALUES (?, ?, ?)",
        )
        .bind(event_id)
        .bind(&token)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            // A concurrent delivery claimed the event first. Discard our
            // token row and hand back the winner's.
            tx.rollback().await?;
            debug!(event_id, "lost issuance race, reusing winner's token");
            let winner = sqlx::query_scalar::<_, String>(
                "SELECT token FROM processed_events WHERE event_id = ?",
            )
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;
            return Ok(winner);
        }

        tx.commit().await?;
        info!(plan = plan.as_str(), %expires_at, "premium token issued");
        Ok(token)
    }

    async fn verify(&self, token: Option<&str>) -> Result<bool, StorageError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(false),
        };

        let row = self.get(token).await?;

        Ok(match row {
            Some(row) => row.is_active && Utc::now() < row.expires_at,
            None => false,
        })
    }
}
