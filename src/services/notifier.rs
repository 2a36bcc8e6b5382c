//! WhatsApp delivery through the Twilio Messages API.
//!
//! Without credentials the notifier runs in mock mode: the message is logged
//! and reported back as `mock` instead of being sent.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

struct TwilioCredentials {
    sid: String,
    auth_token: String,
    from: String,
}

#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    credentials: Option<std::sync::Arc<TwilioCredentials>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Delivery {
    Sent { sid: String },
    Mock { message: String },
    Error { message: String },
}

#[derive(Deserialize)]
struct MessageResource {
    sid: String,
}

/// Twilio expects WhatsApp endpoints as `whatsapp:+<number>`.
fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{}", number)
    }
}

impl Notifier {
    pub fn from_config(config: &Config) -> Self {
        let credentials = match (
            &config.twilio_sid,
            &config.twilio_auth_token,
            &config.twilio_whatsapp_from,
        ) {
            (Some(sid), Some(auth_token), Some(from)) => {
                Some(std::sync::Arc::new(TwilioCredentials {
                    sid: sid.clone(),
                    auth_token: auth_token.clone(),
                    from: from.clone(),
                }))
            }
            _ => None,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for notifier");
                reqwest::Client::new()
            });

        Self {
            client,
            credentials,
        }
    }

    pub async fn send_whatsapp(&self, to: &str, body: &str) -> Delivery {
        let Some(creds) = self.credentials.as_deref() else {
            tracing::warn!(to = %to, message = %body, "Twilio credentials not set, message logged only");
            return Delivery::Mock {
                message: body.to_string(),
            };
        };

        match self.post_message(creds, to, body).await {
            Ok(sid) => {
                tracing::info!(to = %to, sid = %sid, "WhatsApp message sent");
                Delivery::Sent { sid }
            }
            Err(e) => {
                tracing::error!(to = %to, error = %e, "Failed to send WhatsApp message");
                Delivery::Error {
                    message: "Message delivery failed".into(),
                }
            }
        }
    }

    async fn post_message(
        &self,
        creds: &TwilioCredentials,
        to: &str,
        body: &str,
    ) -> anyhow::Result<String> {
        let url = format!("{}/Accounts/{}/Messages.json", TWILIO_API_BASE, creds.sid);
        let response = self
            .client
            .post(url)
            .basic_auth(&creds.sid, Some(&creds.auth_token))
            .form(&[
                ("From", whatsapp_address(&creds.from)),
                ("To", whatsapp_address(to)),
                ("Body", body.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Twilio API error {}: {}", status, text);
        }

        let message: MessageResource = response.json().await?;
        Ok(message.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_address_prefix() {
        assert_eq!(whatsapp_address("+15550001111"), "whatsapp:+15550001111");
        assert_eq!(whatsapp_address("whatsapp:+15550001111"), "whatsapp:+15550001111");
    }

    #[tokio::test]
    async fn test_mock_mode_without_credentials() {
        let notifier = Notifier::from_config(&Config::for_tests());
        let delivery = notifier.send_whatsapp("+15550001111", "hello").await;
        assert_eq!(
            delivery,
            Delivery::Mock {
                message: "hello".into()
            }
        );

        let json = serde_json::to_value(&delivery).unwrap();
        assert_eq!(json["status"], "mock");
        assert_eq!(json["message"], "hello");
    }

    #[test]
    fn test_partial_credentials_stay_in_mock_mode() {
        let mut config = Config::for_tests();
        config.twilio_sid = Some("AC123".into());
        assert!(Notifier::from_config(&config).credentials.is_none());
    }
}
