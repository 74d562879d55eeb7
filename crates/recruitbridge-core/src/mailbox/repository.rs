//! Mailbox storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::warn;

use super::model::{Mailbox, MailboxId};
use crate::Result;
use crate::identity::{ChannelType, UserId};

/// Repository for mailbox registration and lookup.
pub struct MailboxRepository {
    pool: SqlitePool,
}

impl MailboxRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS mailboxes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                mailbox_type TEXT NOT NULL,
                provider TEXT NOT NULL DEFAULT '',
                address TEXT NOT NULL,
                reply_to TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, mailbox_type)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Register a mailbox for a user.
    ///
    /// Addresses are normalized to lowercase. At most one mailbox per
    /// `(user, channel)` exists; registering a second one on the same
    /// channel fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the uniqueness constraint rejects the row or
    /// the database query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        mailbox_type: ChannelType,
        provider: &str,
        address: &str,
        reply_to: Option<&str>,
    ) -> Result<Mailbox> {
        let address = address.trim().to_lowercase();
        let reply_to = reply_to.map(|r| r.trim().to_lowercase());
        let created_at = Utc::now();

        let result = sqlx::query(
            r"
            INSERT INTO mailboxes (user_id, mailbox_type, provider, address, reply_to, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(user_id.0)
        .bind(mailbox_type.as_str())
        .bind(provider)
        .bind(&address)
        .bind(&reply_to)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Mailbox {
            id: MailboxId::new(result.last_insert_rowid()),
            user_id,
            mailbox_type,
            provider: provider.to_string(),
            address,
            reply_to,
            created_at,
        })
    }

    /// Get a mailbox by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: MailboxId) -> Result<Option<Mailbox>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, mailbox_type, provider, address, reply_to, created_at
            FROM mailboxes
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_mailbox))
    }

    /// Get all of a user's mailboxes in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Mailbox>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, mailbox_type, provider, address, reply_to, created_at
            FROM mailboxes
            WHERE user_id = ?
            ORDER BY id ASC
            ",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_mailbox).collect())
    }

    /// Find the mailbox anchoring `channel` for a user.
    ///
    /// A mailbox of the matching type wins. For the alias channel only,
    /// a mailbox whose reply-to routes through the native domain is
    /// accepted as a fallback; with several such candidates the oldest
    /// wins and the ambiguity is logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_for_channel(
        &self,
        user_id: UserId,
        channel: ChannelType,
    ) -> Result<Option<Mailbox>> {
        let mailboxes = self.list_for_user(user_id).await?;

        if let Some(found) = mailboxes.iter().find(|m| m.mailbox_type == channel) {
            return Ok(Some(found.clone()));
        }

        if channel == ChannelType::AppAlias {
            let routed: Vec<&Mailbox> = mailboxes
                .iter()
                .filter(|m| m.routes_through_native_domain())
                .collect();
            if routed.len() > 1 {
                warn!(
                    user = %user_id,
                    candidates = routed.len(),
                    "multiple mailboxes route through the native domain; using the oldest"
                );
            }
            return Ok(routed.first().map(|m| (*m).clone()));
        }

        Ok(None)
    }

    /// Find a user's mailbox by its address.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_address(&self, user_id: UserId, address: &str) -> Result<Option<Mailbox>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, mailbox_type, provider, address, reply_to, created_at
            FROM mailboxes
            WHERE user_id = ? AND address = ?
            ",
        )
        .bind(user_id.0)
        .bind(address.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_mailbox))
    }
}

fn row_to_mailbox(row: &SqliteRow) -> Mailbox {
    Mailbox {
        id: MailboxId::new(row.get("id")),
        user_id: UserId::new(row.get("user_id")),
        mailbox_type: ChannelType::parse(&row.get::<String, _>("mailbox_type")),
        provider: row.get("provider"),
        address: row.get("address"),
        reply_to: row.get("reply_to"),
        // Corrupted timestamps degrade to the epoch instead of failing the read
        created_at: row
            .get::<String, _>("created_at")
            .parse()
            .unwrap_or(DateTime::UNIX_EPOCH),
    }
}
