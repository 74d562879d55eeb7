//! Thread model types and conversation key helpers.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Separator joining canonical participant addresses.
pub const PARTICIPANT_SEPARATOR: &str = ",";

/// Unique identifier for a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub i64);

impl ThreadId {
    /// Create a new thread ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persistent conversation between one user and a participant set.
///
/// Two messages belong to the same thread exactly when their owner,
/// subject, and canonical participant key all match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Unique identifier.
    pub id: ThreadId,
    /// Owning user.
    pub user_id: UserId,
    /// Subject shared by every message in the thread.
    pub subject: String,
    /// Canonical participant key (see [`canonical_participants`]).
    pub participants: String,
    /// Timestamp of the most recent message.
    pub last_message_at: DateTime<Utc>,
    /// Preview of the most recent message body.
    pub last_snippet: String,
    /// Whether the latest inbound message is still unread.
    pub unread: bool,
    /// When the thread was created.
    pub created_at: DateTime<Utc>,
}

/// Build the canonical participant key for a set of addresses.
///
/// Addresses are trimmed, lowercased, deduplicated, sorted, and joined
/// with [`PARTICIPANT_SEPARATOR`]. Empty entries are dropped. The result
/// does not depend on argument order or casing, so both directions of a
/// conversation produce the same key.
#[must_use]
pub fn canonical_participants<I, S>(addresses: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unique: BTreeSet<String> = addresses
        .into_iter()
        .map(|address| address.as_ref().trim().to_lowercase())
        .filter(|address| !address.is_empty())
        .collect();

    unique
        .into_iter()
        .collect::<Vec<_>>()
        .join(PARTICIPANT_SEPARATOR)
}

/// Strip leading reply markers from a subject.
///
/// `Re: Re: Hello` and `Hello` name the same conversation; thread keys
/// use the unprefixed form. Forward markers are left alone since a
/// forward starts a new conversation.
#[must_use]
pub fn normalize_subject(subject: &str) -> String {
    let mut rest = subject.trim();
    while rest
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"))
    {
        rest = rest[3..].trim_start();
    }
    rest.to_string()
}

/// Build a short preview of a message body.
///
/// Control characters are dropped and the text is cut at `max_len`
/// characters with a trailing ellipsis.
#[must_use]
pub fn snippet_of(text: &str, max_len: usize) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control())
        .take(max_len)
        .collect();

    if text.chars().count() > max_len {
        format!("{cleaned}...")
    } else {
        cleaned
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn key_is_order_insensitive() {
        let forward = canonical_participants(["coach@university.edu", "jsmith@recruitbridge.net"]);
        let reverse = canonical_participants(["jsmith@recruitbridge.net", "coach@university.edu"]);
        assert_eq!(forward, reverse);
        assert_eq!(forward, "coach@university.edu,jsmith@recruitbridge.net");
    }

    #[test]
    fn key_lowercases_and_trims() {
        let key = canonical_participants(["  Coach@University.EDU ", "jsmith@recruitbridge.net"]);
        assert_eq!(key, "coach@university.edu,jsmith@recruitbridge.net");
    }

    #[test]
    fn key_drops_duplicates_and_empties() {
        let key = canonical_participants(["a@x.com", "A@X.COM", "", "  "]);
        assert_eq!(key, "a@x.com");
    }

    #[test]
    fn single_participant_has_no_separator() {
        let key = canonical_participants(["coach@university.edu"]);
        assert!(!key.contains(PARTICIPANT_SEPARATOR));
    }

    #[test]
    fn reply_markers_are_stripped() {
        assert_eq!(normalize_subject("Re: Hello"), "Hello");
        assert_eq!(normalize_subject("RE: re: Hello"), "Hello");
        assert_eq!(normalize_subject("Hello"), "Hello");
    }

    #[test]
    fn forward_markers_are_kept() {
        assert_eq!(normalize_subject("Fwd: Hello"), "Fwd: Hello");
    }

    #[test]
    fn reply_marker_inside_subject_is_kept() {
        assert_eq!(normalize_subject("Care: package"), "Care: package");
        assert_eq!(normalize_subject("More: Re: notes"), "More: Re: notes");
    }

    #[test]
    fn snippet_cuts_long_bodies() {
        let snippet = snippet_of("a".repeat(150).as_str(), 100);
        assert_eq!(snippet.chars().count(), 103);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn snippet_keeps_short_bodies_whole() {
        assert_eq!(snippet_of("Thanks, coach!", 100), "Thanks, coach!");
    }

    #[test]
    fn snippet_drops_control_characters() {
        assert_eq!(snippet_of("line one\r\nline two", 100), "line oneline two");
    }

    proptest! {
        #[test]
        fn key_ignores_order_case_and_duplicates(
            mut addresses in proptest::collection::vec("[a-z]{1,8}@[a-z]{1,6}\\.edu", 1..6)
        ) {
            let forward = canonical_participants(&addresses);

            addresses.reverse();
            let reversed = canonical_participants(&addresses);
            prop_assert_eq!(&forward, &reversed);

            let shouting: Vec<String> = addresses.iter().map(|a| a.to_uppercase()).collect();
            prop_assert_eq!(&forward, &canonical_participants(&shouting));

            let mut doubled = addresses.clone();
            doubled.extend(addresses.iter().cloned());
            prop_assert_eq!(&forward, &canonical_participants(&doubled));
        }
    }
}
