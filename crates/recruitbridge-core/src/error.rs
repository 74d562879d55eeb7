//! Error types for the outreach engine.

use crate::identity::{ChannelType, UserId};

/// Errors that can occur in outreach operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Delivery endpoint failure.
    #[error("Transport error: {0}")]
    Transport(#[from] recruitbridge_transport::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The user has no verified sending identity. Nothing was sent.
    #[error("No sending identity is configured")]
    IdentityNotConfigured,

    /// No mailbox anchors the resolved channel.
    #[error("No mailbox found for user {user_id} on channel {channel}")]
    MailboxNotFound {
        /// Owner the lookup ran for.
        user_id: UserId,
        /// Channel that had no anchor.
        channel: ChannelType,
    },

    /// More than one thread row shares one conversation key.
    #[error("{count} threads share one conversation key for user {user_id}; data integrity violated")]
    ThreadKeyConflict {
        /// Owner of the conflicting threads.
        user_id: UserId,
        /// How many rows share the key.
        count: usize,
    },

    /// The batch failed validation before any send was attempted.
    #[error("Invalid batch: {0}")]
    InvalidBatch(&'static str),
}

/// Result type alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
