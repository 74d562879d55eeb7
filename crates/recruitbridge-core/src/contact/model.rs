//! Contact model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Unique identifier for a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactId(pub i64);

impl ContactId {
    /// Create a new contact ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a contact stands in the outreach lifecycle.
///
/// The ladder only moves forward. A late reply outranks the no-answer
/// verdict, so `no_response` can still become `replied`; nothing ever
/// falls back to an earlier rung.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    /// No outreach has gone out yet.
    #[default]
    NotContacted,
    /// At least one message was delivered.
    Sent,
    /// The contact opened a message.
    Opened,
    /// Outreach went out long enough ago that no answer is expected.
    NoResponse,
    /// The contact wrote back.
    Replied,
}

impl ContactStatus {
    /// Parse from database string representation.
    ///
    /// `contacted` is accepted as a legacy spelling of `sent`. Unknown
    /// values fall back to `not_contacted`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "sent" | "contacted" => Self::Sent,
            "opened" => Self::Opened,
            "no_response" => Self::NoResponse,
            "replied" => Self::Replied,
            _ => Self::NotContacted,
        }
    }

    /// Get database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotContacted => "not_contacted",
            Self::Sent => "sent",
            Self::Opened => "opened",
            Self::NoResponse => "no_response",
            Self::Replied => "replied",
        }
    }

    /// Position on the ladder.
    const fn rank(self) -> u8 {
        match self {
            Self::NotContacted => 0,
            Self::Sent => 1,
            Self::Opened => 2,
            Self::NoResponse => 3,
            Self::Replied => 4,
        }
    }

    /// Whether moving to `target` goes forward on the ladder.
    #[must_use]
    pub const fn can_advance_to(self, target: Self) -> bool {
        target.rank() > self.rank()
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ContactStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// A coach contact on one user's recruiting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier.
    pub id: ContactId,
    /// Owning user.
    pub user_id: UserId,
    /// Contact address, normalized to lowercase.
    pub email: String,
    /// Contact name.
    pub name: String,
    /// School or program the contact recruits for.
    pub school: Option<String>,
    /// Outreach lifecycle position.
    pub status: ContactStatus,
    /// When the first successful outreach happened.
    pub contacted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_all_statuses() {
        for status in [
            ContactStatus::NotContacted,
            ContactStatus::Sent,
            ContactStatus::Opened,
            ContactStatus::NoResponse,
            ContactStatus::Replied,
        ] {
            assert_eq!(ContactStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn legacy_contacted_value_parses_as_sent() {
        assert_eq!(ContactStatus::parse("contacted"), ContactStatus::Sent);
        assert_eq!(ContactStatus::parse("Contacted"), ContactStatus::Sent);
    }

    #[test]
    fn unknown_status_falls_back_to_not_contacted() {
        assert_eq!(
            ContactStatus::parse("ghosted"),
            ContactStatus::NotContacted
        );
    }

    #[test]
    fn ladder_only_moves_forward() {
        assert!(ContactStatus::NotContacted.can_advance_to(ContactStatus::Sent));
        assert!(ContactStatus::Sent.can_advance_to(ContactStatus::Opened));
        assert!(ContactStatus::Opened.can_advance_to(ContactStatus::Replied));
        assert!(!ContactStatus::Sent.can_advance_to(ContactStatus::Sent));
        assert!(!ContactStatus::Replied.can_advance_to(ContactStatus::Sent));
    }

    #[test]
    fn late_reply_outranks_no_response() {
        assert!(ContactStatus::NoResponse.can_advance_to(ContactStatus::Replied));
        assert!(!ContactStatus::Replied.can_advance_to(ContactStatus::NoResponse));
    }
}
