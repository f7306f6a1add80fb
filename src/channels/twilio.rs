//! Twilio channel — sends WhatsApp messages through the Messages REST API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::channels::Notifier;
use crate::config::TwilioConfig;
use crate::error::ChannelError;

/// Twilio API version segment.
const TWILIO_API_VERSION: &str = "2010-04-01";

/// Sends messages from a fixed originating address via Twilio.
pub struct TwilioNotifier {
    account_sid: String,
    auth_token: SecretString,
    from_address: String,
    api_base: String,
    client: reqwest::Client,
}

impl TwilioNotifier {
    pub fn new(config: &TwilioConfig) -> Self {
        Self {
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_address: config.from_address.clone(),
            api_base: config.api_base.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{TWILIO_API_VERSION}/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }

    fn send_failed(reason: impl Into<String>) -> ChannelError {
        ChannelError::SendFailed {
            name: "twilio".into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn deliver(&self, body: &str, recipient: &str) -> Result<String, ChannelError> {
        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[
                ("From", self.from_address.as_str()),
                ("To", recipient),
                ("Body", body),
            ])
            .send()
            .await
            .map_err(|e| Self::send_failed(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            // The body can echo account details; keep it out of the error.
            let detail = resp.text().await.unwrap_or_default();
            tracing::debug!(status = %status, detail = %detail, "Twilio rejected message");
            return Err(Self::send_failed(format!("HTTP {}", status.as_u16())));
        }

        let data: serde_json::Value =
            resp.json().await.map_err(|e| ChannelError::InvalidResponse {
                name: "twilio".into(),
                reason: e.without_url().to_string(),
            })?;

        data.get("sid")
            .and_then(serde_json::Value::as_str)
            .filter(|sid| !sid.is_empty())
            .map(String::from)
            .ok_or_else(|| ChannelError::InvalidResponse {
                name: "twilio".into(),
                reason: "response has no message sid".into(),
            })
    }
}
