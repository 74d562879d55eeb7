//! The send contract shared by every delivery channel.

use serde::Serialize;

use crate::error::Result;

/// A single outbound email as handed to a delivery channel.
///
/// Serializes directly as the wire body both channels accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text: String,
}

impl OutboundEmail {
    /// Creates a new outbound email.
    #[must_use]
    pub fn new(to: impl Into<String>, subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            text: text.into(),
        }
    }
}

/// Outcome of an accepted send, identical across channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Identifier assigned by the provider that accepted the message.
    pub provider_id: String,
}

/// A delivery channel able to hand one message to one recipient.
///
/// Implementations normalize their provider-specific response shapes
/// into [`Delivery`] or [`crate::Error`] before anything downstream
/// sees them.
pub trait Transport {
    /// Delivers one message to one recipient.
    fn send(&self, email: &OutboundEmail) -> impl Future<Output = Result<Delivery>> + Send;
}
