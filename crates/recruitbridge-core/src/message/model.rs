//! Message log model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mailbox::MailboxId;
use crate::thread::ThreadId;

/// Unique identifier for a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl MessageId {
    /// Create a new message ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Sent by the user.
    Outbound,
    /// Received from an external participant.
    Inbound,
}

impl Direction {
    /// Parse from database string representation.
    ///
    /// Unknown values fall back to outbound.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "inbound" | "in" => Self::Inbound,
            _ => Self::Outbound,
        }
    }

    /// Get database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Outbound => "outbound",
            Self::Inbound => "inbound",
        }
    }
}

/// Delivery status of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Accepted by the delivering provider.
    Sent,
    /// Landed in one of the user's mailboxes.
    Received,
}

impl MessageStatus {
    /// Parse from database string representation.
    ///
    /// Unknown values fall back to sent.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "received" => Self::Received,
            _ => Self::Sent,
        }
    }

    /// Get database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Received => "received",
        }
    }
}

/// One send or receive event in the append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Thread this message belongs to.
    pub thread_id: ThreadId,
    /// Mailbox the message went through.
    pub mailbox_id: MailboxId,
    /// Direction of travel.
    pub direction: Direction,
    /// Recipient address.
    pub to: String,
    /// Sender address.
    pub from: String,
    /// Subject line as composed or received.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// Identifier assigned by the delivering provider, when known.
    pub provider_id: Option<String>,
    /// Delivery status.
    pub status: MessageStatus,
    /// When the event happened.
    pub created_at: DateTime<Utc>,
}

/// A message event about to be appended to the log.
///
/// Direction and status travel together: outbound events are `Sent`,
/// inbound events are `Received`.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Thread this message belongs to.
    pub thread_id: ThreadId,
    /// Mailbox the message went through.
    pub mailbox_id: MailboxId,
    /// Direction of travel.
    pub direction: Direction,
    /// Recipient address.
    pub to: String,
    /// Sender address.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// Identifier assigned by the delivering provider, when known.
    pub provider_id: Option<String>,
    /// Delivery status.
    pub status: MessageStatus,
    /// When the event happened.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips() {
        for direction in [Direction::Outbound, Direction::Inbound] {
            assert_eq!(Direction::parse(direction.as_str()), direction);
        }
    }

    #[test]
    fn direction_accepts_legacy_short_forms() {
        assert_eq!(Direction::parse("IN"), Direction::Inbound);
        assert_eq!(Direction::parse("out"), Direction::Outbound);
    }

    #[test]
    fn status_round_trips() {
        for status in [MessageStatus::Sent, MessageStatus::Received] {
            assert_eq!(MessageStatus::parse(status.as_str()), status);
        }
    }
}
