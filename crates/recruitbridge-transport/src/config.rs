//! Endpoint configuration for the delivery clients.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// Where the delivery and drafting endpoints live.
///
/// Base URLs are kept as strings so the config can round-trip through
/// serde without caring where it was loaded from; clients parse them
/// once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Root of the RecruitBridge alias mail API.
    pub native_base_url: String,
    /// Root of the linked provider proxy.
    pub provider_base_url: String,
    /// Root of the message drafting endpoint.
    pub draft_base_url: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            native_base_url: "https://api.recruitbridge.net/alias/".to_string(),
            provider_base_url: "https://api.recruitbridge.net/gmail/".to_string(),
            draft_base_url: "https://api.recruitbridge.net/draft/".to_string(),
        }
    }
}

impl TransportConfig {
    /// Parsed root of the alias mail API.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UrlError`] if the configured value is not
    /// a valid URL.
    pub fn native_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.native_base_url)?)
    }

    /// Parsed root of the linked provider proxy.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UrlError`] if the configured value is not
    /// a valid URL.
    pub fn provider_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.provider_base_url)?)
    }

    /// Parsed root of the message drafting endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UrlError`] if the configured value is not
    /// a valid URL.
    pub fn draft_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.draft_base_url)?)
    }
}
