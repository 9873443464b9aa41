//! Outbound email. Production delivery goes through Brevo's transactional
//! HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EmailConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

pub fn reset_code_message(to: &str, code: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Reset your Pantry password".into(),
        html: format!(
            "<p>Use this code to reset your password. It is valid for 10 minutes.</p>\
             <h1 style=\"letter-spacing: 8px\">{code}</h1>\
             <p>If you did not request a reset, you can ignore this email.</p>"
        ),
    }
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email delivery is not configured")]
    NotConfigured,
    #[error("email request failed: {0}")]
    Transport(reqwest::Error),
    #[error("email api returned status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for EmailError {
    fn from(e: reqwest::Error) -> Self {
        EmailError::Transport(e.without_url())
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

#[derive(Clone)]
pub struct BrevoEmailSender {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    sender_email: String,
    sender_name: String,
}

impl BrevoEmailSender {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            sender_email: config.sender_email.clone(),
            sender_name: config.sender_name.clone(),
        })
    }

    fn payload<'a>(&'a self, message: &'a EmailMessage) -> BrevoEmail<'a> {
        BrevoEmail {
            sender: BrevoAddress {
                email: &self.sender_email,
                name: Some(&self.sender_name),
            },
            to: vec![BrevoAddress {
                email: &message.to,
                name: None,
            }],
            subject: &message.subject,
            html_content: &message.html,
        }
    }
}

#[async_trait]
impl EmailSender for BrevoEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let api_key = self.api_key.as_deref().ok_or(EmailError::NotConfigured)?;
        let res = self
            .http
            .post(format!("{}/smtp/email", self.base_url))
            .header("api-key", api_key)
            .json(&self.payload(message))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            warn!(%status, "email api error status");
            return Err(EmailError::Status(status.as_u16()));
        }
        debug!(%status, "email accepted");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmail<'a> {
    sender: BrevoAddress<'a>,
    to: Vec<BrevoAddress<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

#[derive(Debug, Serialize)]
struct BrevoAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// Keeps every message instead of sending it.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryEmailSender {
    pub sent: std::sync::Mutex<Vec<EmailMessage>>,
}

#[cfg(test)]
#[async_trait]
impl EmailSender for MemoryEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
