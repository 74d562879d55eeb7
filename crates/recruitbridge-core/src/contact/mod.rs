//! Coach contacts and their outreach status.
//!
//! Status is a forward-only ladder driven by delivery and ingestion:
//! the first accepted send moves `not_contacted` to `sent`, a reply
//! moves anything below it to `replied`. Transitions are idempotent and
//! never move a contact backward.

mod model;
mod repository;

pub use model::{Contact, ContactId, ContactStatus};
pub use repository::ContactRepository;
