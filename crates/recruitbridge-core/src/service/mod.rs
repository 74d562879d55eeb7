//! Orchestration over transports and stores.
//!
//! [`batch`] fans one composed message out to many recipients through
//! the resolved sending identity; [`inbound`] folds replies back into
//! the same conversations.

pub mod batch;
pub mod inbound;

use crate::contact::ContactRepository;
use crate::mailbox::MailboxRepository;
use crate::message::MessageRepository;
use crate::thread::ThreadRepository;

pub use batch::{
    BatchProgress, BatchReport, BatchSendCoordinator, OutreachBatch, Recipient, SendResult,
    send_batch,
};
pub use inbound::{InboundEmail, ingest_reply};

/// Snippet length for thread previews.
pub(crate) const SNIPPET_LEN: usize = 100;

/// Borrowed handles to the stores the delivery pipeline writes.
#[derive(Clone, Copy)]
pub struct OutreachStores<'a> {
    /// Mailbox registry.
    pub mailboxes: &'a MailboxRepository,
    /// Conversation threads.
    pub threads: &'a ThreadRepository,
    /// Message log.
    pub messages: &'a MessageRepository,
    /// Contact records.
    pub contacts: &'a ContactRepository,
}
