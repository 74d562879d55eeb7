//! # recruitbridge-transport
//!
//! HTTP delivery clients and wire contracts for RecruitBridge outreach.
//!
//! This crate provides:
//! - The [`Transport`] send contract every delivery channel implements
//! - [`NativeAliasClient`] for the RecruitBridge alias mail API,
//!   including the [`IdentityCheck`] identity endpoint
//! - [`ProviderClient`] for a linked external mailbox, with expired
//!   credentials surfaced as a distinct [`Error::AuthExpired`]
//! - [`DraftClient`] for the message drafting endpoint
//! - [`TransportConfig`] endpoint configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod draft;
mod error;
pub mod native;
pub mod outbound;
pub mod provider;

pub use config::TransportConfig;
pub use draft::{DraftClient, DraftRequest, DraftedMessage};
pub use error::{Error, Result};
pub use native::{AliasIdentity, IdentityCheck, NativeAliasClient};
pub use outbound::{Delivery, OutboundEmail, Transport};
pub use provider::ProviderClient;
