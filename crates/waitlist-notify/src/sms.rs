//! SMS delivery, the messaging collaborator behind the second-position trigger.
//! Twilio Programmable Messaging over its REST API.

use std::time::Duration;
use waitlist_core::config::SmsConfig;
use waitlist_core::{Result, WaitlistError};

/// Sends a text message. Returns the provider's message id.
pub trait SmsSender: Send + Sync {
    fn send_sms(&self, to: &str, from: &str, body: &str) -> Result<String>;
}

/// Twilio REST sender (blocking; bounded by the configured timeout).
pub struct TwilioSender {
    account_sid: String,
    auth_token: String,
    api_base: String,
    client: reqwest::blocking::Client,
}

impl TwilioSender {
    pub fn new(config: &SmsConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| WaitlistError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

impl SmsSender for TwilioSender {
    fn send_sms(&self, to: &str, from: &str, body: &str) -> Result<String> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", from), ("Body", body)])
            .send()
            .map_err(|e| WaitlistError::NotificationFailed(format!("Twilio request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(WaitlistError::NotificationFailed(format!(
                "Twilio API error {status}: {error_text}"
            )));
        }

        let result: serde_json::Value = response
            .json()
            .map_err(|e| WaitlistError::NotificationFailed(format!("Invalid Twilio response: {e}")))?;
        let sid = result["sid"].as_str().unwrap_or("unknown").to_string();
        tracing::debug!("Twilio message {sid} queued → {to}");
        Ok(sid)
    }
}
