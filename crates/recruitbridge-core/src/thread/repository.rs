//! Thread storage and reconciliation.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

use super::model::{Thread, ThreadId};
use crate::identity::UserId;
use crate::{Error, Result};

/// Repository for conversation threads.
///
/// The conversation key `(user_id, subject, participants)` is enforced
/// by a storage uniqueness constraint, so reconciliation can treat "the
/// thread for this key" as a single row even under concurrent creation.
pub struct ThreadRepository {
    pool: SqlitePool,
}

impl ThreadRepository {
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
            CREATE TABLE IF NOT EXISTS threads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                subject TEXT NOT NULL,
                participants TEXT NOT NULL,
                last_message_at TEXT NOT NULL,
                last_snippet TEXT NOT NULL DEFAULT '',
                unread INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_threads_conversation_key
            ON threads(user_id, subject, participants)
            ",
        )
        .execute(&self.pool)
        .await?;

        // Covers the inbox listing (newest conversation first)
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_threads_recency
            ON threads(user_id, last_message_at DESC)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find or create the single thread for a conversation key.
    ///
    /// `participants` must already be canonical (see
    /// [`super::canonical_participants`]). A concurrent creator losing
    /// the insert race falls back to fetching the winner's row, so two
    /// calls can never produce two threads for one key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadKeyConflict`] when storage already holds
    /// more than one row for the key, or an error if the database query
    /// fails.
    pub async fn reconcile(
        &self,
        user_id: UserId,
        subject: &str,
        participants: &str,
        at: DateTime<Utc>,
    ) -> Result<Thread> {
        if let Some(existing) = self.find_by_key(user_id, subject, participants).await? {
            return Ok(existing);
        }

        let inserted = sqlx::query(
            r"
            INSERT INTO threads (user_id, subject, participants, last_message_at, last_snippet, unread, created_at)
            VALUES (?, ?, ?, ?, '', 0, ?)
            ",
        )
        .bind(user_id.0)
        .bind(subject)
        .bind(participants)
        .bind(at.to_rfc3339())
        .bind(at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(result) => {
                debug!(user = %user_id, thread = result.last_insert_rowid(), "created thread");
                Ok(Thread {
                    id: ThreadId::new(result.last_insert_rowid()),
                    user_id,
                    subject: subject.to_string(),
                    participants: participants.to_string(),
                    last_message_at: at,
                    last_snippet: String::new(),
                    unread: false,
                    created_at: at,
                })
            }
            // Lost the creation race: the winner's row is the thread
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => self
                .find_by_key(user_id, subject, participants)
                .await?
                .ok_or(Error::Database(sqlx::Error::RowNotFound)),
            Err(e) => Err(e.into()),
        }
    }

    /// Find the thread for a conversation key, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadKeyConflict`] when storage holds more than
    /// one row for the key; the violation is surfaced, never resolved by
    /// silently picking a row.
    pub async fn find_by_key(
        &self,
        user_id: UserId,
        subject: &str,
        participants: &str,
    ) -> Result<Option<Thread>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, subject, participants, last_message_at, last_snippet, unread, created_at
            FROM threads
            WHERE user_id = ? AND subject = ? AND participants = ?
            ",
        )
        .bind(user_id.0)
        .bind(subject)
        .bind(participants)
        .fetch_all(&self.pool)
        .await?;

        match rows.as_slice() {
            [] => Ok(None),
            [row] => Ok(Some(row_to_thread(row))),
            _ => Err(Error::ThreadKeyConflict {
                user_id,
                count: rows.len(),
            }),
        }
    }

    /// Get a thread by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: ThreadId) -> Result<Option<Thread>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, subject, participants, last_message_at, last_snippet, unread, created_at
            FROM threads
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_thread))
    }

    /// Get all of a user's threads, most recent conversation first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Thread>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, subject, participants, last_message_at, last_snippet, unread, created_at
            FROM threads
            WHERE user_id = ?
            ORDER BY last_message_at DESC
            ",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_thread).collect())
    }

    /// Advance a thread's recency bookkeeping after a message lands.
    ///
    /// Recency and snippet only move forward; a message older than the
    /// thread's latest leaves them untouched. `mark_unread` is set by
    /// inbound traffic and never cleared here (see [`Self::mark_read`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn advance(
        &self,
        id: ThreadId,
        at: DateTime<Utc>,
        snippet: &str,
        mark_unread: bool,
    ) -> Result<()> {
        // RFC 3339 UTC strings sort chronologically, so string comparison
        // is the monotonic guard
        sqlx::query(
            r"
            UPDATE threads
            SET last_snippet = CASE WHEN last_message_at <= ?1 THEN ?2 ELSE last_snippet END,
                unread = CASE WHEN ?3 THEN 1 ELSE unread END,
                last_message_at = CASE WHEN last_message_at <= ?1 THEN ?1 ELSE last_message_at END
            WHERE id = ?4
            ",
        )
        .bind(at.to_rfc3339())
        .bind(snippet)
        .bind(mark_unread)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Clear a thread's unread flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn mark_read(&self, id: ThreadId) -> Result<()> {
        sqlx::query("UPDATE threads SET unread = 0 WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn row_to_thread(row: &SqliteRow) -> Thread {
    Thread {
        id: ThreadId::new(row.get("id")),
        user_id: UserId::new(row.get("user_id")),
        subject: row.get("subject"),
        participants: row.get("participants"),
        last_message_at: row
            .get::<String, _>("last_message_at")
            .parse()
            .unwrap_or(DateTime::UNIX_EPOCH),
        last_snippet: row.get("last_snippet"),
        unread: row.get::<i64, _>("unread") != 0,
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
    use crate::thread::model::canonical_participants;
    use chrono::Duration;

    const USER: UserId = UserId::new(7);

    fn key() -> String {
        canonical_participants(["coach@university.edu", "jsmith@recruitbridge.net"])
    }

    #[tokio::test]
    async fn test_reconcile_creates_then_reuses() {
        let repo = ThreadRepository::in_memory().await.unwrap();
        let now = Utc::now();

        let first = repo.reconcile(USER, "Hello", &key(), now).await.unwrap();
        let second = repo.reconcile(USER, "Hello", &key(), now).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.list_for_user(USER).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_different_subject_gets_a_new_thread() {
        let repo = ThreadRepository::in_memory().await.unwrap();
        let now = Utc::now();

        let hello = repo.reconcile(USER, "Hello", &key(), now).await.unwrap();
        let follow_up = repo.reconcile(USER, "Follow up", &key(), now).await.unwrap();

        assert_ne!(hello.id, follow_up.id);
    }

    #[tokio::test]
    async fn test_same_key_for_another_user_is_a_separate_thread() {
        let repo = ThreadRepository::in_memory().await.unwrap();
        let now = Utc::now();

        let mine = repo.reconcile(USER, "Hello", &key(), now).await.unwrap();
        let theirs = repo
            .reconcile(UserId::new(8), "Hello", &key(), now)
            .await
            .unwrap();

        assert_ne!(mine.id, theirs.id);
    }

    #[tokio::test]
    async fn test_duplicate_key_rows_surface_as_conflict() {
        let repo = ThreadRepository::in_memory().await.unwrap();
        let now = Utc::now();
        repo.reconcile(USER, "Hello", &key(), now).await.unwrap();

        // Simulate pre-constraint data that slipped in a duplicate
        sqlx::query("DROP INDEX idx_threads_conversation_key")
            .execute(&repo.pool)
            .await
            .unwrap();
        sqlx::query(
            r"
            INSERT INTO threads (user_id, subject, participants, last_message_at, last_snippet, unread, created_at)
            VALUES (?, 'Hello', ?, ?, '', 0, ?)
            ",
        )
        .bind(USER.0)
        .bind(key())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&repo.pool)
        .await
        .unwrap();

        let result = repo.reconcile(USER, "Hello", &key(), now).await;
        assert!(matches!(
            result,
            Err(Error::ThreadKeyConflict { count: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_advance_moves_recency_forward() {
        let repo = ThreadRepository::in_memory().await.unwrap();
        let start = Utc::now();
        let thread = repo.reconcile(USER, "Hello", &key(), start).await.unwrap();

        let later = start + Duration::minutes(5);
        repo.advance(thread.id, later, "See you at the meet", false)
            .await
            .unwrap();

        let fetched = repo.get(thread.id).await.unwrap().unwrap();
        assert_eq!(fetched.last_snippet, "See you at the meet");
        assert!(fetched.last_message_at > start);
        assert!(!fetched.unread);
    }

    #[tokio::test]
    async fn test_advance_ignores_older_messages() {
        let repo = ThreadRepository::in_memory().await.unwrap();
        let start = Utc::now();
        let thread = repo.reconcile(USER, "Hello", &key(), start).await.unwrap();

        let later = start + Duration::minutes(5);
        repo.advance(thread.id, later, "newest", false).await.unwrap();
        repo.advance(thread.id, start - Duration::minutes(5), "stale", false)
            .await
            .unwrap();

        let fetched = repo.get(thread.id).await.unwrap().unwrap();
        assert_eq!(fetched.last_snippet, "newest");
    }

    #[tokio::test]
    async fn test_late_inbound_still_marks_unread() {
        let repo = ThreadRepository::in_memory().await.unwrap();
        let start = Utc::now();
        let thread = repo.reconcile(USER, "Hello", &key(), start).await.unwrap();

        repo.advance(thread.id, start + Duration::minutes(5), "newest", false)
            .await
            .unwrap();
        // Reply delivered out of order: recency stays put, unread still flips
        repo.advance(thread.id, start - Duration::minutes(5), "stale", true)
            .await
            .unwrap();

        let fetched = repo.get(thread.id).await.unwrap().unwrap();
        assert_eq!(fetched.last_snippet, "newest");
        assert!(fetched.unread);
    }

    #[tokio::test]
    async fn test_mark_read_clears_unread() {
        let repo = ThreadRepository::in_memory().await.unwrap();
        let now = Utc::now();
        let thread = repo.reconcile(USER, "Hello", &key(), now).await.unwrap();

        repo.advance(thread.id, now, "reply", true).await.unwrap();
        assert!(repo.get(thread.id).await.unwrap().unwrap().unread);

        repo.mark_read(thread.id).await.unwrap();
        assert!(!repo.get(thread.id).await.unwrap().unwrap().unread);
    }

    #[tokio::test]
    async fn test_listing_orders_by_most_recent_conversation() {
        let repo = ThreadRepository::in_memory().await.unwrap();
        let start = Utc::now();

        let old = repo.reconcile(USER, "Old news", &key(), start).await.unwrap();
        let fresh = repo
            .reconcile(USER, "Fresh", &key(), start + Duration::minutes(1))
            .await
            .unwrap();
        repo.advance(old.id, start + Duration::minutes(10), "revived", false)
            .await
            .unwrap();

        let listed = repo.list_for_user(USER).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, old.id);
        assert_eq!(listed[1].id, fresh.id);
    }
}
