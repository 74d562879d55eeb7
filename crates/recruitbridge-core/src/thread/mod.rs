//! Conversation threads.
//!
//! A thread is keyed by `(user, subject, canonical participant set)`.
//! Canonicalization makes the key direction-proof: the outbound message
//! to a coach and the coach's reply produce the same participant key,
//! so both land in the same conversation. Storage enforces one thread
//! per key; an observed duplicate is surfaced as a data integrity
//! violation rather than silently resolved.

mod model;
mod repository;

pub use model::{
    PARTICIPANT_SEPARATOR, Thread, ThreadId, canonical_participants, normalize_subject, snippet_of,
};
pub use repository::ThreadRepository;
