//! The append-only message log.
//!
//! Every accepted send and every ingested reply becomes one immutable
//! row tied to its thread and the mailbox it traveled through. The log
//! is the delivery record; threads are derived bookkeeping over it.

mod model;
mod repository;

pub use model::{Direction, Message, MessageId, MessageStatus, NewMessage};
pub use repository::MessageRepository;
