//! Sending identity resolution.
//!
//! Resolution is a pure decision over already-fetched facts: the user
//! record and the alias identity check's answer. It never talks to the
//! network, so the priority rules are testable in isolation.

use tracing::debug;

use super::model::{ChannelType, Identity, User};
use recruitbridge_transport::AliasIdentity;

/// Outcome of identity resolution.
#[derive(Debug, Clone)]
pub enum IdentityResolution {
    /// At least one sending option exists.
    Configured(IdentitySelection),
    /// The user has no verified way to send. Callers must surface setup
    /// guidance instead of attempting delivery.
    NotConfigured,
}

impl IdentityResolution {
    /// Whether any sending option resolved.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    /// The resolved selection, when one exists.
    #[must_use]
    pub fn into_selection(self) -> Option<IdentitySelection> {
        match self {
            Self::Configured(selection) => Some(selection),
            Self::NotConfigured => None,
        }
    }
}

/// The session's sending options, resolved once.
///
/// Switching changes which option is active; it never re-derives the
/// options themselves. Completed sends keep whatever identity they went
/// out with.
#[derive(Debug, Clone)]
pub struct IdentitySelection {
    options: Vec<Identity>,
    active: usize,
}

impl IdentitySelection {
    fn new(options: Vec<Identity>) -> Self {
        Self { options, active: 0 }
    }

    /// The identity sends currently go out as.
    #[must_use]
    pub fn active(&self) -> &Identity {
        // options is non-empty and active stays within it
        &self.options[self.active]
    }

    /// Every option available this session, highest priority first.
    #[must_use]
    pub fn options(&self) -> &[Identity] {
        &self.options
    }

    /// Activate the option on `channel`.
    ///
    /// Returns `false` and leaves the active option untouched when no
    /// option exists on that channel.
    pub fn switch_to(&mut self, channel: ChannelType) -> bool {
        match self.options.iter().position(|o| o.channel == channel) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }
}

/// Resolve the sending options for `user`.
///
/// `alias` is the alias identity check's answer, fetched once by the
/// caller. Priority: a linked external mailbox first, a verified alias
/// second. An unverified alias is not an option.
#[must_use]
pub fn resolve(user: &User, alias: Option<AliasIdentity>) -> IdentityResolution {
    let mut options = Vec::new();

    if let Some(linked) = &user.linked_account {
        options.push(Identity::from_linked_account(
            linked,
            user.display_name.as_deref(),
        ));
    }
    if let Some(alias) = alias
        && alias.verified
    {
        options.push(Identity::from_alias(alias));
    }

    if options.is_empty() {
        debug!(user = %user.id, "no sending identity configured");
        return IdentityResolution::NotConfigured;
    }
    IdentityResolution::Configured(IdentitySelection::new(options))
}
