//! Batch fan-out of one composed message to many recipients.
//!
//! One coordinator drives one batch, strictly sequentially: recipient
//! N+1 is not attempted until recipient N's send and bookkeeping have
//! finished. Failures stay where they happen. A failed send becomes
//! that recipient's result and the batch moves on; a bookkeeping
//! failure after an accepted send is logged and the send still counts.
//! The caller always gets one [`SendResult`] per recipient, in input
//! order.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use recruitbridge_transport::{Delivery, IdentityCheck, OutboundEmail, Transport};

use super::{OutreachStores, SNIPPET_LEN};
use crate::contact::ContactId;
use crate::identity::{ChannelType, Identity, User, UserId, resolve};
use crate::message::{Direction, MessageStatus, NewMessage};
use crate::thread::{canonical_participants, normalize_subject, snippet_of};
use crate::{Error, Result};

/// One recipient of a batch send.
#[derive(Debug, Clone)]
pub struct Recipient {
    /// Destination address.
    pub email: String,
    /// Display name, when known.
    pub name: Option<String>,
    /// Contact record to reflect the outcome onto; `None` for ad-hoc
    /// addresses.
    pub contact_id: Option<ContactId>,
}

impl Recipient {
    /// Create a recipient from a bare address.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            contact_id: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Tie the recipient to a contact record.
    #[must_use]
    pub const fn with_contact(mut self, contact_id: ContactId) -> Self {
        self.contact_id = Some(contact_id);
        self
    }
}

/// A composed message addressed to a list of recipients.
#[derive(Debug, Clone)]
pub struct OutreachBatch {
    /// Subject line shared by every recipient.
    pub subject: String,
    /// Plain text body shared by every recipient.
    pub body: String,
    /// Recipients in send order.
    pub recipients: Vec<Recipient>,
}

impl OutreachBatch {
    /// Create a batch.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        recipients: Vec<Recipient>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            recipients,
        }
    }
}

/// Per-recipient outcome of a batch send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendResult {
    /// Address the attempt went to.
    pub recipient: String,
    /// Whether the transport accepted the message.
    pub success: bool,
    /// Failure reason, for failed attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Provider-assigned id, for accepted attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl SendResult {
    fn delivered(recipient: String, provider_id: String) -> Self {
        Self {
            recipient,
            success: true,
            error: None,
            message_id: Some(provider_id),
        }
    }

    fn failed(recipient: String, error: String) -> Self {
        Self {
            recipient,
            success: false,
            error: Some(error),
            message_id: None,
        }
    }
}

/// Progress of a running batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    /// Recipients attempted so far.
    pub processed: usize,
    /// Total recipients in the batch.
    pub total: usize,
}

/// Final report of a completed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// One entry per recipient, in input order.
    pub results: Vec<SendResult>,
    /// How many recipients the transport accepted.
    pub sent: usize,
    /// How many recipients failed.
    pub failed: usize,
}

impl BatchReport {
    fn from_results(results: Vec<SendResult>) -> Self {
        let sent = results.iter().filter(|r| r.success).count();
        let failed = results.len() - sent;
        Self {
            results,
            sent,
            failed,
        }
    }

    /// One-line summary for operator logs.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} sent, {} failed", self.sent, self.failed)
    }

    /// The failed entries, in input order.
    pub fn failures(&self) -> impl Iterator<Item = &SendResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Sequential driver sending one composed message to many recipients.
///
/// The batch's state is explicit: the resolved identity, the results so
/// far, and a cursor. Callers either drive it step by step, polling
/// [`Self::progress`] in between, or hand [`Self::run`] a progress
/// callback. Stopping between steps is the unit of cancellation;
/// completed sends are final.
pub struct BatchSendCoordinator<'a, T: Transport> {
    transport: &'a T,
    stores: OutreachStores<'a>,
    user_id: UserId,
    identity: Identity,
    subject: String,
    body: String,
    recipients: Vec<Recipient>,
    results: Vec<SendResult>,
    cursor: usize,
}

impl<'a, T: Transport> BatchSendCoordinator<'a, T> {
    /// Create a coordinator for one batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBatch`] when the subject, body, or
    /// recipient list is empty.
    pub fn new(
        transport: &'a T,
        stores: OutreachStores<'a>,
        user_id: UserId,
        identity: Identity,
        batch: OutreachBatch,
    ) -> Result<Self> {
        if batch.subject.trim().is_empty() {
            return Err(Error::InvalidBatch("subject is empty"));
        }
        if batch.body.trim().is_empty() {
            return Err(Error::InvalidBatch("body is empty"));
        }
        if batch.recipients.is_empty() {
            return Err(Error::InvalidBatch("no recipients"));
        }

        let results = Vec::with_capacity(batch.recipients.len());
        Ok(Self {
            transport,
            stores,
            user_id,
            identity,
            subject: batch.subject,
            body: batch.body,
            recipients: batch.recipients,
            results,
            cursor: 0,
        })
    }

    /// The identity this batch goes out as.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Whether every recipient has been processed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cursor >= self.recipients.len()
    }

    /// Progress so far.
    #[must_use]
    pub fn progress(&self) -> BatchProgress {
        BatchProgress {
            processed: self.cursor,
            total: self.recipients.len(),
        }
    }

    /// Results recorded so far, in input order.
    #[must_use]
    pub fn results(&self) -> &[SendResult] {
        &self.results
    }

    /// Attempt delivery to the next recipient.
    ///
    /// Returns the recorded result, or `None` when every recipient has
    /// already been processed. Failures are recorded, never raised; one
    /// recipient's outcome cannot touch another's.
    pub async fn step(&mut self) -> Option<&SendResult> {
        let recipient = self.recipients.get(self.cursor)?.clone();
        let email = OutboundEmail::new(
            recipient.email.clone(),
            self.subject.clone(),
            self.body.clone(),
        );

        let result = match self.transport.send(&email).await {
            Ok(delivery) => {
                debug!(
                    recipient = %recipient.email,
                    provider_id = %delivery.provider_id,
                    "send accepted"
                );
                if let Err(e) = self.record_delivery(&recipient, &delivery).await {
                    // The send already happened; bookkeeping cannot fail it
                    warn!(
                        recipient = %recipient.email,
                        error = %e,
                        "post-send bookkeeping failed"
                    );
                }
                SendResult::delivered(recipient.email, delivery.provider_id)
            }
            Err(e) => {
                debug!(recipient = %recipient.email, error = %e, "send failed");
                SendResult::failed(recipient.email, e.to_string())
            }
        };

        self.results.push(result);
        self.cursor += 1;
        self.results.last()
    }

    /// Drive the batch to completion.
    ///
    /// `on_progress` fires after every recipient. The report carries one
    /// result per recipient in input order plus the sent/failed tallies.
    pub async fn run<F>(mut self, mut on_progress: F) -> BatchReport
    where
        F: FnMut(BatchProgress),
    {
        info!(
            user = %self.user_id,
            channel = %self.identity.channel,
            total = self.recipients.len(),
            "starting batch send"
        );

        while !self.is_done() {
            self.step().await;
            on_progress(self.progress());
        }

        let report = BatchReport::from_results(self.results);
        info!(sent = report.sent, failed = report.failed, "batch send finished");
        report
    }

    /// Bookkeeping after an accepted send: mailbox anchor, thread,
    /// message log, contact status.
    async fn record_delivery(&self, recipient: &Recipient, delivery: &Delivery) -> Result<()> {
        let now = Utc::now();

        let mailbox = self
            .stores
            .mailboxes
            .find_for_channel(self.user_id, self.identity.channel)
            .await?
            .ok_or(Error::MailboxNotFound {
                user_id: self.user_id,
                channel: self.identity.channel,
            })?;

        let subject = normalize_subject(&self.subject);
        let participants =
            canonical_participants([recipient.email.as_str(), self.identity.address.as_str()]);
        let thread = self
            .stores
            .threads
            .reconcile(self.user_id, &subject, &participants, now)
            .await?;

        self.stores
            .messages
            .append(&NewMessage {
                thread_id: thread.id,
                mailbox_id: mailbox.id,
                direction: Direction::Outbound,
                to: recipient.email.clone(),
                from: self.identity.address.clone(),
                subject: self.subject.clone(),
                body: self.body.clone(),
                provider_id: Some(delivery.provider_id.clone()),
                status: MessageStatus::Sent,
                created_at: now,
            })
            .await?;

        self.stores
            .threads
            .advance(thread.id, now, &snippet_of(&self.body, SNIPPET_LEN), false)
            .await?;

        if let Some(contact_id) = recipient.contact_id {
            self.stores.contacts.mark_contacted(contact_id, now).await?;
        }

        Ok(())
    }
}

/// Resolve the user's sending identity and fan the batch out on the
/// matching channel.
///
/// The identity is resolved exactly once, before the first recipient.
/// A user with no configured identity aborts here with
/// [`Error::IdentityNotConfigured`]: zero sends attempted, zero rows
/// written.
///
/// # Errors
///
/// Returns [`Error::IdentityNotConfigured`] when no sending identity
/// resolves, [`Error::InvalidBatch`] for an empty batch, and
/// [`Error::Transport`] when the identity check itself fails with no
/// linked mailbox to fall back on.
pub async fn send_batch<N, P, F>(
    native: &N,
    provider: &P,
    stores: OutreachStores<'_>,
    user: &User,
    batch: OutreachBatch,
    on_progress: F,
) -> Result<BatchReport>
where
    N: Transport + IdentityCheck,
    P: Transport,
    F: FnMut(BatchProgress),
{
    let alias = match native.me().await {
        Ok(alias) => alias,
        Err(e) if user.linked_account.is_some() => {
            warn!(error = %e, "alias identity check failed; continuing with linked mailbox");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let Some(selection) = resolve(user, alias).into_selection() else {
        return Err(Error::IdentityNotConfigured);
    };
    let identity = selection.active().clone();
    debug!(
        user = %user.id,
        channel = %identity.channel,
        address = %identity.address,
        "resolved sending identity"
    );

    match identity.channel {
        ChannelType::AppAlias => {
            let coordinator = BatchSendCoordinator::new(native, stores, user.id, identity, batch)?;
            Ok(coordinator.run(on_progress).await)
        }
        ChannelType::Gmail | ChannelType::Outlook => {
            let coordinator =
                BatchSendCoordinator::new(provider, stores, user.id, identity, batch)?;
            Ok(coordinator.run(on_progress).await)
        }
    }
}
