//! Client for the RecruitBridge alias mail API.
//!
//! The alias API is a small JSON surface: an op-style endpoint answering
//! identity questions and a send endpoint accepting one message per
//! call. Send acceptance is reported in the payload (`ok`), not only in
//! the HTTP status.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::outbound::{Delivery, OutboundEmail, Transport};

/// A verified alias identity as reported by the identity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasIdentity {
    /// Full alias address, e.g. `jsmith@recruitbridge.net`.
    pub address: String,
    /// Name shown to recipients.
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    /// Permanent username component; never changes once assigned.
    pub username: String,
    /// Domain component of the address.
    pub domain: String,
    /// Whether the alias passed verification.
    #[serde(default)]
    pub verified: bool,
}

/// Answers the identity check: which verified alias, if any, the
/// current session may send as.
pub trait IdentityCheck {
    /// Fetches the session's verified alias identity.
    ///
    /// `None` means no alias is configured or verification is still
    /// pending; it is an answer, not a failure.
    fn me(&self) -> impl Future<Output = Result<Option<AliasIdentity>>> + Send;
}

#[derive(Debug, Serialize)]
struct OpRequest {
    op: &'static str,
}

#[derive(Debug, Deserialize)]
struct IdentityEnvelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    identity: Option<AliasIdentity>,
}

#[derive(Debug, Deserialize)]
struct SendEnvelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the alias mail API.
#[derive(Clone)]
pub struct NativeAliasClient {
    http_client: Client,
    base_url: Url,
    session_token: String,
}

impl NativeAliasClient {
    /// Creates a client for the given API root, authenticating with the
    /// caller's session token.
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
    /// Returns [`Error::UrlError`] if the configured alias root is not a
    /// valid URL.
    pub fn from_config(config: &TransportConfig, session_token: impl Into<String>) -> Result<Self> {
        Ok(Self::new(config.native_url()?, session_token))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

impl IdentityCheck for NativeAliasClient {
    async fn me(&self) -> Result<Option<AliasIdentity>> {
        let url = self.endpoint("mailbox")?;
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.session_token)
            .json(&OpRequest { op: "me" })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let envelope: IdentityEnvelope = response.json().await?;
        Ok(identity_from_envelope(envelope))
    }
}

impl Transport for NativeAliasClient {
    async fn send(&self, email: &OutboundEmail) -> Result<Delivery> {
        let url = self.endpoint("send")?;
        debug!(to = %email.to, "sending through alias channel");
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.session_token)
            .json(email)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let envelope: SendEnvelope = response.json().await?;
        delivery_from_envelope(envelope)
    }
}

fn identity_from_envelope(envelope: IdentityEnvelope) -> Option<AliasIdentity> {
    if envelope.ok { envelope.identity } else { None }
}

fn delivery_from_envelope(envelope: SendEnvelope) -> Result<Delivery> {
    if !envelope.ok {
        let reason = envelope
            .error
            .unwrap_or_else(|| "send was not accepted".to_string());
        return Err(Error::Rejected(reason));
    }
    envelope
        .id
        .map(|provider_id| Delivery { provider_id })
        .ok_or_else(|| Error::Rejected("response carried no message id".to_string()))
}

pub(crate) async fn status_error(response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let reason = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.trim().to_string()
    };
    Error::Status {
        status: status.as_u16(),
        reason,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn op_request_serializes_as_me() {
        let json = serde_json::to_string(&OpRequest { op: "me" }).unwrap();
        assert_eq!(json, r#"{"op":"me"}"#);
    }

    #[test]
    fn identity_envelope_parses_full_identity() {
        let envelope: IdentityEnvelope = serde_json::from_str(
            r#"{
                "ok": true,
                "identity": {
                    "address": "jsmith@recruitbridge.net",
                    "displayName": "Jordan Smith",
                    "username": "jsmith",
                    "domain": "recruitbridge.net",
                    "verified": true
                }
            }"#,
        )
        .unwrap();

        let identity = identity_from_envelope(envelope).unwrap();
        assert_eq!(identity.address, "jsmith@recruitbridge.net");
        assert_eq!(identity.display_name.as_deref(), Some("Jordan Smith"));
        assert_eq!(identity.username, "jsmith");
        assert!(identity.verified);
    }

    #[test]
    fn null_identity_means_not_configured() {
        let envelope: IdentityEnvelope =
            serde_json::from_str(r#"{"ok": true, "identity": null}"#).unwrap();
        assert!(identity_from_envelope(envelope).is_none());
    }

    #[test]
    fn not_ok_envelope_means_not_configured() {
        let envelope: IdentityEnvelope = serde_json::from_str(
            r#"{
                "ok": false,
                "identity": {
                    "address": "jsmith@recruitbridge.net",
                    "username": "jsmith",
                    "domain": "recruitbridge.net",
                    "verified": false
                }
            }"#,
        )
        .unwrap();
        assert!(identity_from_envelope(envelope).is_none());
    }

    #[test]
    fn accepted_send_yields_provider_id() {
        let envelope: SendEnvelope =
            serde_json::from_str(r#"{"ok": true, "id": "msg_8123"}"#).unwrap();
        let delivery = delivery_from_envelope(envelope).unwrap();
        assert_eq!(delivery.provider_id, "msg_8123");
    }

    #[test]
    fn refused_send_carries_endpoint_reason() {
        let envelope: SendEnvelope =
            serde_json::from_str(r#"{"ok": false, "error": "alias not verified"}"#).unwrap();
        let error = delivery_from_envelope(envelope).unwrap_err();
        assert!(matches!(error, Error::Rejected(ref reason) if reason == "alias not verified"));
    }

    #[test]
    fn accepted_send_without_id_is_rejected() {
        let envelope: SendEnvelope = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(delivery_from_envelope(envelope).is_err());
    }
}
