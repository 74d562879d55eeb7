//! Contact storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

use super::model::{Contact, ContactId, ContactStatus};
use crate::Result;
use crate::identity::UserId;

/// Repository for contact storage and status transitions.
pub struct ContactRepository {
    pool: SqlitePool,
}

impl ContactRepository {
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
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                email TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                school TEXT,
                status TEXT NOT NULL DEFAULT 'not_contacted',
                contacted_at TEXT,
                UNIQUE(user_id, email)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add a contact to a user's list.
    ///
    /// Emails are normalized to lowercase; one row per `(user, email)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the contact already exists or the database
    /// query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        email: &str,
        name: &str,
        school: Option<&str>,
    ) -> Result<Contact> {
        let email = email.trim().to_lowercase();
        let name = name.trim();

        let result = sqlx::query(
            r"
            INSERT INTO contacts (user_id, email, name, school, status)
            VALUES (?, ?, ?, ?, 'not_contacted')
            ",
        )
        .bind(user_id.0)
        .bind(&email)
        .bind(name)
        .bind(school)
        .execute(&self.pool)
        .await?;

        Ok(Contact {
            id: ContactId::new(result.last_insert_rowid()),
            user_id,
            email,
            name: name.to_string(),
            school: school.map(ToString::to_string),
            status: ContactStatus::NotContacted,
            contacted_at: None,
        })
    }

    /// Get a contact by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: ContactId) -> Result<Option<Contact>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, email, name, school, status, contacted_at
            FROM contacts
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_contact))
    }

    /// Find a user's contact by email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, user_id: UserId, email: &str) -> Result<Option<Contact>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, email, name, school, status, contacted_at
            FROM contacts
            WHERE user_id = ? AND email = ?
            ",
        )
        .bind(user_id.0)
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_contact))
    }

    /// Record the first successful outreach to a contact.
    ///
    /// Only the `not_contacted -> sent` transition fires; repeat calls
    /// and calls against a contact that has already moved further are
    /// no-ops. Returns whether the transition happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn mark_contacted(&self, id: ContactId, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE contacts
            SET status = 'sent', contacted_at = ?
            WHERE id = ? AND status = 'not_contacted'
            ",
        )
        .bind(at.to_rfc3339())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Advance a contact to `target` if that moves forward on the
    /// ladder.
    ///
    /// Backward and sideways transitions are refused. Returns whether
    /// the transition happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn advance_status(&self, id: ContactId, target: ContactStatus) -> Result<bool> {
        let Some(contact) = self.get(id).await? else {
            return Ok(false);
        };
        if !contact.status.can_advance_to(target) {
            debug!(
                contact = %id,
                from = %contact.status,
                to = %target,
                "refusing backward status transition"
            );
            return Ok(false);
        }

        // Compare-and-swap on the previous status so a concurrent
        // transition cannot be overwritten. Rows written by the old
        // vocabulary store `sent` as `contacted`.
        let previous = contact.status.as_str();
        let stored = if contact.status == ContactStatus::Sent {
            "contacted"
        } else {
            previous
        };
        let result = sqlx::query("UPDATE contacts SET status = ? WHERE id = ? AND status IN (?, ?)")
            .bind(target.as_str())
            .bind(id.0)
            .bind(previous)
            .bind(stored)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_contact(row: &SqliteRow) -> Contact {
    Contact {
        id: ContactId::new(row.get("id")),
        user_id: UserId::new(row.get("user_id")),
        email: row.get("email"),
        name: row.get("name"),
        school: row.get("school"),
        status: ContactStatus::parse(&row.get::<String, _>("status")),
        contacted_at: row
            .get::<Option<String>, _>("contacted_at")
            .and_then(|raw| raw.parse().ok()),
    }
}
