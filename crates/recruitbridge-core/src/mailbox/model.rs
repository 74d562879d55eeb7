//! Mailbox model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{ChannelType, UserId};

/// Domain serving RecruitBridge alias addresses.
pub const NATIVE_DOMAIN: &str = "recruitbridge.net";

/// Unique identifier for a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MailboxId(pub i64);

impl MailboxId {
    /// Create a new mailbox ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MailboxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sending/receiving anchor owned by exactly one user.
///
/// Every logged message points at the mailbox it went through. A user
/// holds at most one mailbox per channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    /// Unique identifier.
    pub id: MailboxId,
    /// Owning user.
    pub user_id: UserId,
    /// Channel this mailbox belongs to.
    pub mailbox_type: ChannelType,
    /// Provider name, e.g. `recruitbridge` or `google`.
    pub provider: String,
    /// Address mail is sent from.
    pub address: String,
    /// Address replies are directed to, when it differs from `address`.
    pub reply_to: Option<String>,
    /// When the mailbox was registered.
    pub created_at: DateTime<Utc>,
}

impl Mailbox {
    /// Whether replies to this mailbox route through the native domain.
    ///
    /// An externally-provided mailbox with a `recruitbridge.net`
    /// reply-to still anchors alias traffic.
    #[must_use]
    pub fn routes_through_native_domain(&self) -> bool {
        self.reply_to
            .as_deref()
            .is_some_and(|reply_to| reply_to.contains(NATIVE_DOMAIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailbox(mailbox_type: ChannelType, reply_to: Option<&str>) -> Mailbox {
        Mailbox {
            id: MailboxId::new(1),
            user_id: UserId::new(7),
            mailbox_type,
            provider: "google".to_string(),
            address: "athlete@gmail.com".to_string(),
            reply_to: reply_to.map(ToString::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn native_reply_to_is_detected() {
        let anchored = mailbox(ChannelType::Gmail, Some("jsmith@recruitbridge.net"));
        assert!(anchored.routes_through_native_domain());
    }

    #[test]
    fn foreign_reply_to_does_not_anchor() {
        let unanchored = mailbox(ChannelType::Gmail, Some("athlete@gmail.com"));
        assert!(!unanchored.routes_through_native_domain());
    }

    #[test]
    fn missing_reply_to_does_not_anchor() {
        assert!(!mailbox(ChannelType::Gmail, None).routes_through_native_domain());
    }
}
