//! Client for the linked external mailbox provider.
//!
//! Sends go through the provider proxy with the user's linked-account
//! access token. The proxy answers credential problems with HTTP 401,
//! surfaced here as [`Error::AuthExpired`] so callers can route the
//! user to re-connect the account instead of treating it as an ordinary
//! failed send.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::outbound::{Delivery, OutboundEmail, Transport};

#[derive(Debug, Deserialize)]
struct ProviderSendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: String,
}

/// HTTP client for the linked provider proxy.
#[derive(Clone)]
pub struct ProviderClient {
    http_client: Client,
    base_url: Url,
    access_token: String,
}

impl ProviderClient {
    /// Creates a client for the given proxy root, authenticating with
    /// the linked account's access token.
    #[must_use]
    pub fn new(base_url: Url, access_token: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
            access_token: access_token.into(),
        }
    }

    /// Creates a client from endpoint configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UrlError`] if the configured provider root is
    /// not a valid URL.
    pub fn from_config(config: &TransportConfig, access_token: impl Into<String>) -> Result<Self> {
        Ok(Self::new(config.provider_url()?, access_token))
    }
}

impl Transport for ProviderClient {
    async fn send(&self, email: &OutboundEmail) -> Result<Delivery> {
        let url = self.base_url.join("send")?;
        debug!(to = %email.to, "sending through linked provider");
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::AuthExpired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                reason: error_reason(status, &body),
            });
        }

        let body: ProviderSendResponse = response.json().await?;
        Ok(Delivery {
            provider_id: body.id,
        })
    }
}

/// Pulls a human-readable reason out of a provider error body.
///
/// Providers wrap messages as `{"error": {"message": ...}}`; anything
/// else falls back to the raw body, then to the status line.
fn error_reason(status: StatusCode, raw: &str) -> String {
    if let Ok(body) = serde_json::from_str::<ProviderErrorBody>(raw)
        && !body.error.message.is_empty()
    {
        return body.error.message;
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}
