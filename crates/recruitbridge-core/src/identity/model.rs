//! Identity model types.

use recruitbridge_transport::AliasIdentity;
use serde::{Deserialize, Serialize};

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new user ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery channel a sending identity operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// RecruitBridge alias mailbox.
    AppAlias,
    /// Linked Gmail mailbox.
    Gmail,
    /// Linked Outlook mailbox.
    Outlook,
}

impl ChannelType {
    /// Parse from database string representation.
    ///
    /// Unknown values fall back to the alias channel.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "gmail" => Self::Gmail,
            "outlook" => Self::Outlook,
            _ => Self::AppAlias,
        }
    }

    /// Get database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AppAlias => "app_alias",
            Self::Gmail => "gmail",
            Self::Outlook => "outlook",
        }
    }

    /// Whether this channel sends through a linked external mailbox.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        matches!(self, Self::Gmail | Self::Outlook)
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChannelType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// An external mailbox linked to the user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    /// Address of the linked mailbox.
    pub address: String,
    /// Provider name, e.g. `google`.
    pub provider: String,
}

impl LinkedAccount {
    /// Create a linked account record.
    #[must_use]
    pub fn new(address: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            provider: provider.into(),
        }
    }

    /// Channel a linked account of this provider sends through.
    ///
    /// Unknown providers ride the Gmail channel.
    #[must_use]
    pub fn channel(&self) -> ChannelType {
        match self.provider.to_lowercase().as_str() {
            "microsoft" | "outlook" => ChannelType::Outlook,
            _ => ChannelType::Gmail,
        }
    }
}

/// An authenticated user as handed to identity resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Primary profile email. Not necessarily a sending address.
    pub email: String,
    /// Name shown to recipients.
    pub display_name: Option<String>,
    /// Externally linked mailbox, when one is connected.
    pub linked_account: Option<LinkedAccount>,
}

impl User {
    /// Create a user with no linked mailbox.
    #[must_use]
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            display_name: None,
            linked_account: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Attach a linked external mailbox.
    #[must_use]
    pub fn with_linked_account(mut self, account: LinkedAccount) -> Self {
        self.linked_account = Some(account);
        self
    }
}

/// A resolved sending identity: the address outreach goes out as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Address mail is sent from.
    pub address: String,
    /// Name shown to recipients.
    pub display_name: Option<String>,
    /// Permanent username component of the address.
    pub username: String,
    /// Domain component of the address.
    pub domain: String,
    /// Whether the channel has verified this identity.
    pub verified: bool,
    /// Channel this identity sends through.
    pub channel: ChannelType,
}

impl Identity {
    /// Identity backed by a verified RecruitBridge alias.
    #[must_use]
    pub fn from_alias(alias: AliasIdentity) -> Self {
        Self {
            address: alias.address,
            display_name: alias.display_name,
            username: alias.username,
            domain: alias.domain,
            verified: alias.verified,
            channel: ChannelType::AppAlias,
        }
    }

    /// Identity backed by a linked external mailbox.
    ///
    /// Linked accounts arrive already verified by their provider's
    /// connect flow.
    #[must_use]
    pub fn from_linked_account(account: &LinkedAccount, display_name: Option<&str>) -> Self {
        let (username, domain) = split_address(&account.address);
        Self {
            address: account.address.clone(),
            display_name: display_name.map(ToString::to_string),
            username,
            domain,
            verified: true,
            channel: account.channel(),
        }
    }
}

/// Split an address into username and domain parts.
///
/// An address without `@` keeps everything in the username and leaves
/// the domain empty.
fn split_address(address: &str) -> (String, String) {
    match address.split_once('@') {
        Some((user, domain)) => (user.to_string(), domain.to_string()),
        None => (address.to_string(), String::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod channel_type_tests {
        use super::*;

        #[test]
        fn parse_round_trips_all_channels() {
            for channel in [ChannelType::AppAlias, ChannelType::Gmail, ChannelType::Outlook] {
                assert_eq!(ChannelType::parse(channel.as_str()), channel);
            }
        }

        #[test]
        fn parse_is_case_insensitive() {
            assert_eq!(ChannelType::parse("GMAIL"), ChannelType::Gmail);
            assert_eq!(ChannelType::parse("App_Alias"), ChannelType::AppAlias);
        }

        #[test]
        fn unknown_channel_falls_back_to_alias() {
            assert_eq!(ChannelType::parse("carrier-pigeon"), ChannelType::AppAlias);
        }

        #[test]
        fn linked_predicate_excludes_alias() {
            assert!(!ChannelType::AppAlias.is_linked());
            assert!(ChannelType::Gmail.is_linked());
            assert!(ChannelType::Outlook.is_linked());
        }
    }

    mod linked_account_tests {
        use super::*;

        #[test]
        fn google_provider_maps_to_gmail_channel() {
            let account = LinkedAccount::new("athlete@gmail.com", "google");
            assert_eq!(account.channel(), ChannelType::Gmail);
        }

        #[test]
        fn microsoft_provider_maps_to_outlook_channel() {
            let account = LinkedAccount::new("athlete@outlook.com", "microsoft");
            assert_eq!(account.channel(), ChannelType::Outlook);
        }
    }

    mod identity_tests {
        use super::*;

        #[test]
        fn alias_identity_keeps_endpoint_fields() {
            let identity = Identity::from_alias(AliasIdentity {
                address: "jsmith@recruitbridge.net".to_string(),
                display_name: Some("Jordan Smith".to_string()),
                username: "jsmith".to_string(),
                domain: "recruitbridge.net".to_string(),
                verified: true,
            });
            assert_eq!(identity.channel, ChannelType::AppAlias);
            assert_eq!(identity.username, "jsmith");
            assert!(identity.verified);
        }

        #[test]
        fn linked_identity_splits_address() {
            let account = LinkedAccount::new("athlete@gmail.com", "google");
            let identity = Identity::from_linked_account(&account, Some("Jordan Smith"));
            assert_eq!(identity.username, "athlete");
            assert_eq!(identity.domain, "gmail.com");
            assert_eq!(identity.channel, ChannelType::Gmail);
            assert!(identity.verified);
        }

        #[test]
        fn address_without_at_sign_has_empty_domain() {
            let (username, domain) = split_address("not-an-address");
            assert_eq!(username, "not-an-address");
            assert!(domain.is_empty());
        }
    }
}
