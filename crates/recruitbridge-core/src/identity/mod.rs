//! Sending identities: who outreach goes out as.
//!
//! A user can send through a linked external mailbox, through a
//! verified RecruitBridge alias, through both, or through neither.
//! "Neither" is a first-class state ([`IdentityResolution::NotConfigured`])
//! that blocks sending up front; it is never an error thrown mid-batch.

mod model;
mod resolver;

pub use model::{ChannelType, Identity, LinkedAccount, User, UserId};
pub use resolver::{IdentityResolution, IdentitySelection, resolve};
