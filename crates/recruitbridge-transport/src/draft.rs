//! Client for the message drafting endpoint.
//!
//! Drafting happens server-side; this client only carries the request
//! over and hands back the composed subject and body. Batch code treats
//! the draft as opaque input.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::TransportConfig;
use crate::error::Result;
use crate::native::status_error;

/// What the drafting endpoint needs to compose one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftRequest {
    /// Name of the person the message addresses.
    #[serde(rename = "recipientName")]
    pub recipient_name: String,
    /// School or program the recipient belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    /// Free-form guidance from the sender.
    pub prompt: String,
}

impl DraftRequest {
    /// Creates a drafting request.
    #[must_use]
    pub fn new(recipient_name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            recipient_name: recipient_name.into(),
            school: None,
            prompt: prompt.into(),
        }
    }

    /// Sets the recipient's school.
    #[must_use]
    pub fn with_school(mut self, school: impl Into<String>) -> Self {
        self.school = Some(school.into());
        self
    }
}

/// A composed message as returned by the drafting endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DraftedMessage {
    /// Composed subject line.
    pub subject: String,
    /// Composed plain text body.
    pub body: String,
}

/// HTTP client for the drafting endpoint.
#[derive(Clone)]
pub struct DraftClient {
    http_client: Client,
    base_url: Url,
    session_token: String,
}

impl DraftClient {
    /// Creates a client for the given drafting root, authenticating
    /// with the caller's session token.
    #[must_use]
    pub fn new(base_url: Url, session_token: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
            session_token: session_token.into(),
        }
    }

    /// Creates a client from endpoint configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UrlError`] if the configured drafting
    /// root is not a valid URL.
    pub fn from_config(config: &TransportConfig, session_token: impl Into<String>) -> Result<Self> {
        Ok(Self::new(config.draft_url()?, session_token))
    }

    /// Asks the endpoint to compose one message.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Http`] on connection failure and
    /// [`crate::Error::Status`] when the endpoint refuses the request.
    pub async fn draft(&self, request: &DraftRequest) -> Result<DraftedMessage> {
        let url = self.base_url.join("message")?;
        debug!(recipient = %request.recipient_name, "requesting message draft");
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.session_token)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json().await?)
    }
}
