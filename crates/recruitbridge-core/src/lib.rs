//! # recruitbridge-core
//!
//! Core outreach engine for `RecruitBridge`.
//!
//! This crate provides:
//! - Sending identity resolution (linked mailbox and alias channels)
//! - Mailbox registry
//! - **Batch Delivery** - sequential fan-out with per-recipient isolation
//! - **Conversation Threading** - replies land in the thread the send started
//! - **Reply Ingestion** - inbound mail folded back into conversations
//! - Append-only message log
//! - Contact outreach status tracking

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod contact;
mod error;
pub mod identity;
pub mod mailbox;
pub mod message;
pub mod service;
pub mod thread;

pub use contact::{Contact, ContactId, ContactRepository, ContactStatus};
pub use error::{Error, Result};
pub use identity::{
    ChannelType, Identity, IdentityResolution, IdentitySelection, LinkedAccount, User, UserId,
    resolve,
};
pub use mailbox::{Mailbox, MailboxId, MailboxRepository, NATIVE_DOMAIN};
pub use message::{Direction, Message, MessageId, MessageRepository, MessageStatus, NewMessage};
pub use service::{
    BatchProgress, BatchReport, BatchSendCoordinator, InboundEmail, OutreachBatch, OutreachStores,
    Recipient, SendResult, ingest_reply, send_batch,
};
pub use thread::{
    PARTICIPANT_SEPARATOR, Thread, ThreadId, ThreadRepository, canonical_participants,
    normalize_subject, snippet_of,
};
