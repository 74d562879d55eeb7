//! Mailbox registry: the anchors delivery logging hangs off.
//!
//! A mailbox records where a user's mail enters and leaves: the alias
//! mailbox, a linked Gmail or Outlook account. Lookup by channel prefers
//! an exact type match and falls back, for the alias channel, to any
//! mailbox whose reply-to routes through the native domain.

mod model;
mod repository;

pub use model::{Mailbox, MailboxId, NATIVE_DOMAIN};
pub use repository::MailboxRepository;
