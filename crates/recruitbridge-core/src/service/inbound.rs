//! Reply ingestion: folding inbound mail back into conversations.
//!
//! A coach's reply arrives addressed to whichever address the outreach
//! went out as. Ingestion anchors it to the receiving mailbox, lands it
//! in the conversation the original send started, and reflects the
//! reply onto the contact record. The conversation key is the same one
//! the send side uses, so no reply ever forks a new thread just because
//! its subject grew a `Re:` prefix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{OutreachStores, SNIPPET_LEN};
use crate::contact::ContactStatus;
use crate::identity::{ChannelType, UserId};
use crate::mailbox::Mailbox;
use crate::message::{Direction, Message, MessageStatus, NewMessage};
use crate::thread::{canonical_participants, normalize_subject, snippet_of};
use crate::{Error, Result};

/// An inbound email as handed over by the mail pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEmail {
    /// Address the reply came from.
    pub from: String,
    /// Address the reply was delivered to.
    pub to: String,
    /// Subject line as received.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// Identifier assigned by the receiving provider, when known.
    #[serde(default)]
    pub provider_id: Option<String>,
    /// When the reply arrived.
    pub received_at: DateTime<Utc>,
}

impl InboundEmail {
    /// Create an inbound email record.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            provider_id: None,
            received_at,
        }
    }

    /// Attach the receiving provider's identifier.
    #[must_use]
    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }
}

/// Ingest a reply into the user's conversations.
///
/// The reply is logged against the mailbox it was delivered to; when the
/// delivery address is not a registered mailbox, the alias channel's
/// anchor stands in. The thread is found or created under the same key
/// the send side uses, its unread flag is set, and a contact matching
/// the sender is advanced to `replied`. Contact bookkeeping is best
/// effort: its failure is logged and the ingested message is kept.
///
/// # Errors
///
/// Returns [`Error::MailboxNotFound`] when no mailbox anchors the
/// delivery address, [`Error::ThreadKeyConflict`] when storage holds
/// more than one thread for the conversation key, or an error if a
/// database query fails.
pub async fn ingest_reply(
    stores: OutreachStores<'_>,
    user_id: UserId,
    email: &InboundEmail,
) -> Result<Message> {
    let mailbox = receiving_mailbox(stores, user_id, &email.to).await?;

    let subject = normalize_subject(&email.subject);
    let participants = canonical_participants([email.from.as_str(), email.to.as_str()]);
    let thread = stores
        .threads
        .reconcile(user_id, &subject, &participants, email.received_at)
        .await?;

    let message = stores
        .messages
        .append(&NewMessage {
            thread_id: thread.id,
            mailbox_id: mailbox.id,
            direction: Direction::Inbound,
            to: email.to.clone(),
            from: email.from.clone(),
            subject: email.subject.clone(),
            body: email.body.clone(),
            provider_id: email.provider_id.clone(),
            status: MessageStatus::Received,
            created_at: email.received_at,
        })
        .await?;

    stores
        .threads
        .advance(
            thread.id,
            email.received_at,
            &snippet_of(&email.body, SNIPPET_LEN),
            true,
        )
        .await?;

    advance_replying_contact(stores, user_id, &email.from).await;

    debug!(
        user = %user_id,
        thread = %thread.id,
        from = %email.from,
        "ingested reply"
    );
    Ok(message)
}

/// The mailbox a reply to `to` is anchored on.
///
/// An exact address match wins; otherwise the alias channel's anchor
/// stands in, since alias replies route back through the native domain
/// whatever alias variant the coach answered.
async fn receiving_mailbox(
    stores: OutreachStores<'_>,
    user_id: UserId,
    to: &str,
) -> Result<Mailbox> {
    if let Some(mailbox) = stores.mailboxes.find_by_address(user_id, to).await? {
        return Ok(mailbox);
    }
    stores
        .mailboxes
        .find_for_channel(user_id, ChannelType::AppAlias)
        .await?
        .ok_or(Error::MailboxNotFound {
            user_id,
            channel: ChannelType::AppAlias,
        })
}

/// Advance the contact matching `from` to `replied`.
///
/// Missing contacts are normal; lookup or update failures are logged
/// and swallowed so the reply itself is never lost over status
/// bookkeeping.
async fn advance_replying_contact(stores: OutreachStores<'_>, user_id: UserId, from: &str) {
    match stores.contacts.find_by_email(user_id, from).await {
        Ok(Some(contact)) => {
            if let Err(e) = stores
                .contacts
                .advance_status(contact.id, ContactStatus::Replied)
                .await
            {
                warn!(contact = %contact.id, error = %e, "could not record reply on contact");
            }
        }
        Ok(None) => {}
        Err(e) => {
            warn!(user = %user_id, error = %e, "contact lookup failed during reply ingestion");
        }
    }
}
