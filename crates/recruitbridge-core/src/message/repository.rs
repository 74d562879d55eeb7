//! Message log storage.

use chrono::DateTime;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use super::model::{Direction, Message, MessageId, MessageStatus, NewMessage};
use crate::Result;
use crate::mailbox::MailboxId;
use crate::thread::ThreadId;

/// Repository for the append-only message log.
///
/// Rows are only ever inserted; edit and delete have no place in a
/// delivery record.
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
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
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id INTEGER NOT NULL,
                mailbox_id INTEGER NOT NULL,
                direction TEXT NOT NULL,
                to_address TEXT NOT NULL,
                from_address TEXT NOT NULL,
                subject TEXT NOT NULL,
                body TEXT NOT NULL,
                provider_id TEXT,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_messages_thread
            ON messages(thread_id, created_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append one message event to the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn append(&self, message: &NewMessage) -> Result<Message> {
        let result = sqlx::query(
            r"
            INSERT INTO messages (thread_id, mailbox_id, direction, to_address, from_address,
                                  subject, body, provider_id, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(message.thread_id.0)
        .bind(message.mailbox_id.0)
        .bind(message.direction.as_str())
        .bind(&message.to)
        .bind(&message.from)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(&message.provider_id)
        .bind(message.status.as_str())
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Message {
            id: MessageId::new(result.last_insert_rowid()),
            thread_id: message.thread_id,
            mailbox_id: message.mailbox_id,
            direction: message.direction,
            to: message.to.clone(),
            from: message.from.clone(),
            subject: message.subject.clone(),
            body: message.body.clone(),
            provider_id: message.provider_id.clone(),
            status: message.status,
            created_at: message.created_at,
        })
    }

    /// Get a message by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: MessageId) -> Result<Option<Message>> {
        let row = sqlx::query(
            r"
            SELECT id, thread_id, mailbox_id, direction, to_address, from_address,
                   subject, body, provider_id, status, created_at
            FROM messages
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_message))
    }

    /// Get a thread's messages in the order they happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_thread(&self, thread_id: ThreadId) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r"
            SELECT id, thread_id, mailbox_id, direction, to_address, from_address,
                   subject, body, provider_id, status, created_at
            FROM messages
            WHERE thread_id = ?
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(thread_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_message).collect())
    }

    /// Count a thread's messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_for_thread(&self, thread_id: ThreadId) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM messages WHERE thread_id = ?")
            .bind(thread_id.0)
            .fetch_one(&self.pool)
            .await?;

        #[allow(clippy::cast_sign_loss)]
        Ok(row.get::<i64, _>("n") as u64)
    }
}

fn row_to_message(row: &SqliteRow) -> Message {
    Message {
        id: MessageId::new(row.get("id")),
        thread_id: ThreadId::new(row.get("thread_id")),
        mailbox_id: MailboxId::new(row.get("mailbox_id")),
        direction: Direction::parse(&row.get::<String, _>("direction")),
        to: row.get("to_address"),
        from: row.get("from_address"),
        subject: row.get("subject"),
        body: row.get("body"),
        provider_id: row.get("provider_id"),
        status: MessageStatus::parse(&row.get::<String, _>("status")),
        created_at: row
            .get::<String, _>("created_at")
            .parse()
            .unwrap_or(DateTime::UNIX_EPOCH),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn outbound(thread: i64, to: &str, at: chrono::DateTime<Utc>) -> NewMessage {
        NewMessage {
            thread_id: ThreadId::new(thread),
            mailbox_id: MailboxId::new(1),
            direction: Direction::Outbound,
            to: to.to_string(),
            from: "jsmith@recruitbridge.net".to_string(),
            subject: "Hello".to_string(),
            body: "Hi coach".to_string(),
            provider_id: Some("msg_1".to_string()),
            status: MessageStatus::Sent,
            created_at: at,
        }
    }

    #[tokio::test]
    async fn test_append_assigns_ids_and_round_trips() {
        let repo = MessageRepository::in_memory().await.unwrap();
        let now = Utc::now();

        let stored = repo
            .append(&outbound(1, "coach@university.edu", now))
            .await
            .unwrap();

        let fetched = repo.get(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.direction, Direction::Outbound);
        assert_eq!(fetched.status, MessageStatus::Sent);
        assert_eq!(fetched.provider_id.as_deref(), Some("msg_1"));
    }

    #[tokio::test]
    async fn test_thread_listing_is_chronological() {
        let repo = MessageRepository::in_memory().await.unwrap();
        let start = Utc::now();

        repo.append(&outbound(1, "late@university.edu", start + Duration::minutes(2)))
            .await
            .unwrap();
        repo.append(&outbound(1, "early@university.edu", start))
            .await
            .unwrap();
        repo.append(&outbound(2, "other@university.edu", start))
            .await
            .unwrap();

        let listed = repo.list_for_thread(ThreadId::new(1)).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].to, "early@university.edu");
        assert_eq!(listed[1].to, "late@university.edu");

        assert_eq!(repo.count_for_thread(ThreadId::new(1)).await.unwrap(), 2);
        assert_eq!(repo.count_for_thread(ThreadId::new(3)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_inbound_messages_store_received_status() {
        let repo = MessageRepository::in_memory().await.unwrap();

        let inbound = NewMessage {
            direction: Direction::Inbound,
            status: MessageStatus::Received,
            provider_id: None,
            ..outbound(1, "jsmith@recruitbridge.net", Utc::now())
        };
        let stored = repo.append(&inbound).await.unwrap();

        let fetched = repo.get(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.direction, Direction::Inbound);
        assert_eq!(fetched.status, MessageStatus::Received);
        assert!(fetched.provider_id.is_none());
    }
}
