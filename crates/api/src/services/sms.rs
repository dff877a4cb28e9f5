//! Order confirmation notifications.
//!
//! [`AfricasTalkingClient`] sends SMS through the Africa's Talking messaging
//! API. [`LogNotifier`] is used when no SMS credentials are configured and
//! only writes the message to the log.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::SmsConfig;

const LIVE_BASE_URL: &str = "https://api.africastalking.com";
const SANDBOX_BASE_URL: &str = "https://api.sandbox.africastalking.com";

/// Upper bound on one gateway call. Orders wait on the confirmation send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Recipient status codes the gateway reports for an accepted message
/// (Processed, Sent, Queued).
const ACCEPTED_STATUS_CODES: std::ops::RangeInclusive<u16> = 100..=102;

/// Errors raised while sending a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway answered with a non-success HTTP status.
    #[error("SMS gateway error ({status}): {body}")]
    Gateway {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Gateway accepted the request but did not deliver to the recipient.
    #[error("SMS rejected for {recipient}: {status}")]
    Rejected {
        /// Recipient number.
        recipient: String,
        /// Status text reported by the gateway.
        status: String,
    },
}

/// Sends order confirmations to customers.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// Send the order-received message to `phone`.
    async fn send_order_confirmation(
        &self,
        phone: &str,
        customer_name: &str,
    ) -> Result<(), NotificationError>;
}

/// Text of the order confirmation message.
#[must_use]
pub fn confirmation_message(customer_name: &str) -> String {
    format!(
        "Hi {customer_name}, your order has been received and is being processed. Thank you!"
    )
}

/// Africa's Talking SMS client.
#[derive(Clone)]
pub struct AfricasTalkingClient {
    client: Client,
    base_url: String,
    username: String,
    api_key: SecretString,
    sender_id: Option<String>,
}

impl std::fmt::Debug for AfricasTalkingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AfricasTalkingClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_key", &"[REDACTED]")
            .field("sender_id", &self.sender_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(rename = "SMSMessageData")]
    data: MessageData,
}

#[derive(Debug, Deserialize)]
struct MessageData {
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Recipients", default)]
    recipients: Vec<Recipient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Recipient {
    status_code: u16,
    #[serde(default)]
    number: String,
    #[serde(default)]
    status: String,
}

impl AfricasTalkingClient {
    /// Create a client from SMS configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Http` if the HTTP client cannot be built.
    pub fn new(config: &SmsConfig) -> Result<Self, NotificationError> {
        let base_url = if config.sandbox {
            SANDBOX_BASE_URL
        } else {
            LIVE_BASE_URL
        };
        Self::with_endpoint(config, base_url, REQUEST_TIMEOUT)
    }

    fn with_endpoint(
        config: &SmsConfig,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.to_owned(),
            username: config.username.clone(),
            api_key: config.api_key.clone(),
            sender_id: config.shortcode.clone(),
        })
    }

    /// Send a single SMS.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Gateway` on a non-success HTTP status and
    /// `NotificationError::Rejected` when the recipient was not accepted.
    #[instrument(skip(self, message))]
    pub async fn send(&self, to: &str, message: &str) -> Result<(), NotificationError> {
        let mut form = vec![
            ("username", self.username.as_str()),
            ("to", to),
            ("message", message),
        ];
        if let Some(sender_id) = &self.sender_id {
            form.push(("from", sender_id.as_str()));
        }

        let response = self
            .client
            .post(format!("{}/version1/messaging", self.base_url))
            .header("apiKey", self.api_key.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NotificationError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendResponse = response.json().await?;
        check_delivery(to, &sent.data)?;
        info!(summary = %sent.data.message, "SMS sent");
        Ok(())
    }
}

/// Every recipient must be accepted, and there must be at least one.
fn check_delivery(to: &str, data: &MessageData) -> Result<(), NotificationError> {
    if data.recipients.is_empty() {
        return Err(NotificationError::Rejected {
            recipient: to.to_owned(),
            status: if data.message.is_empty() {
                "no recipients accepted".to_owned()
            } else {
                data.message.clone()
            },
        });
    }

    if let Some(rejected) = data
        .recipients
        .iter()
        .find(|r| !ACCEPTED_STATUS_CODES.contains(&r.status_code))
    {
        return Err(NotificationError::Rejected {
            recipient: rejected.number.clone(),
            status: format!("{} ({})", rejected.status, rejected.status_code),
        });
    }

    Ok(())
}

#[async_trait]
impl OrderNotifier for AfricasTalkingClient {
    async fn send_order_confirmation(
        &self,
        phone: &str,
        customer_name: &str,
    ) -> Result<(), NotificationError> {
        self.send(phone, &confirmation_message(customer_name)).await
    }
}

/// Notifier that only logs. Used when SMS is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl OrderNotifier for LogNotifier {
    async fn send_order_confirmation(
        &self,
        phone: &str,
        customer_name: &str,
    ) -> Result<(), NotificationError> {
        warn!(
            phone = %phone,
            message = %confirmation_message(customer_name),
            "SMS not configured, confirmation not sent"
        );
        Ok(())
    }
}
