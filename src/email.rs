//! Outbound email through a transactional HTTP API

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::settings::EmailSettings;
use crate::error::{HalfsiesError, HalfsiesResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// A plain-text message ready to send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
}

/// Something that can deliver an email
pub trait Mailer {
    /// Sender address used for outgoing messages
    fn sender(&self) -> &str;

    fn send(&self, email: &OutgoingEmail) -> HalfsiesResult<()>;
}

/// Posts messages as JSON to the configured endpoint with a bearer key
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn from_settings(settings: &EmailSettings) -> HalfsiesResult<Self> {
        if !settings.enabled {
            return Err(HalfsiesError::Email(
                "Email is disabled; set email.enabled in the config file".into(),
            ));
        }
        if settings.from.trim().is_empty() {
            return Err(HalfsiesError::Email("No sender address configured (email.from)".into()));
        }
        let api_key = settings.api_key().ok_or_else(|| {
            HalfsiesError::Email(format!("API key not set; export {}", settings.api_key_env))
        })?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HalfsiesError::Email(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key,
            from: settings.from.clone(),
        })
    }
}

impl Mailer for HttpMailer {
    fn sender(&self) -> &str {
        &self.from
    }

    fn send(&self, email: &OutgoingEmail) -> HalfsiesResult<()> {
        debug!(endpoint = %self.endpoint, to = ?email.to, "POST email");
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .map_err(|e| HalfsiesError::Email(format!("Request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(HalfsiesError::Email(format!("HTTP {}: {}", status, body)));
        }
        info!(subject = %email.subject, recipients = email.to.len(), "sent email");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_settings_rejected() {
        let settings = EmailSettings::default();
        assert!(matches!(
            HttpMailer::from_settings(&settings),
            Err(HalfsiesError::Email(_))
        ));
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let settings = EmailSettings {
            enabled: true,
            from: "bills@example.com".into(),
            api_key_env: "HALFSIES_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..EmailSettings::default()
        };
        let err = HttpMailer::from_settings(&settings).err().unwrap();
        assert!(err.to_string().contains("HALFSIES_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_payload_shape() {
        let email = OutgoingEmail {
            from: "bills@example.com".into(),
            to: vec!["alex@example.com".into()],
            subject: "January".into(),
            text: "hi".into(),
        };
        let json = serde_json::to_value(&email).unwrap();
        assert_eq!(json["to"][0], "alex@example.com");
        assert_eq!(json["subject"], "January");
    }
}
