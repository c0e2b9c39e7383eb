use log::*;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

use crate::{config::MailConfig, errors::ServerError};

#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Could not initialize mail client. {0}")]
    Initialization(String),
    #[error("Mail request failed. {0}")]
    RequestError(String),
    #[error("Mail provider returned {status}: {message}")]
    ApiError { status: u16, message: String },
}

impl From<MailerError> for ServerError {
    fn from(e: MailerError) -> Self {
        ServerError::UpstreamError(e.to_string())
    }
}

/// Transactional email. Whether a failed send aborts the surrounding operation is the caller's decision: welcome
/// and approval mails are fire-and-forget, invite and reset mails are load-bearing.
#[allow(async_fn_in_trait)]
pub trait Mailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError>;
}

/// SendGrid-style JSON mail API client.
#[derive(Clone)]
pub struct MailApiClient {
    client: Client,
    config: MailConfig,
}

impl MailApiClient {
    pub fn new(config: MailConfig) -> Result<Self, MailerError> {
        let client = Client::builder().build().map_err(|e| MailerError::Initialization(e.to_string()))?;
        Ok(Self { client, config })
    }
}

impl Mailer for MailApiClient {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.config.from_address },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html_body }],
        });
        trace!("📧️ Sending \"{subject}\" to {to}");
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.reveal())
            .json(&body)
            .send()
            .await
            .map_err(|e| MailerError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            debug!("📧️ Mail \"{subject}\" accepted for {to}");
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MailerError::RequestError(e.to_string()))?;
            Err(MailerError::ApiError { status, message })
        }
    }
}

/// Message bodies. Content is deliberately minimal; templating is out of scope.
pub mod messages {
    pub fn welcome() -> (&'static str, String) {
        (
            "Welcome to Our Service!",
            "<p>Hello,</p><p>Thank you for registering with us.</p><p>Best regards,<br/>The Team</p>".to_string(),
        )
    }

    pub fn password_reset(reset_url: &str) -> (&'static str, String) {
        (
            "Password Reset Request",
            format!("<p>Click here to reset your password: <a href=\"{reset_url}\">{reset_url}</a></p>"),
        )
    }

    pub fn staff_invite(link: &str) -> (&'static str, String) {
        (
            "Staff Invitation",
            format!(
                "<h2>Welcome!</h2><p>Please complete your registration:</p><a href=\"{link}\">Complete \
                 Registration</a>"
            ),
        )
    }

    pub fn staff_approved(name: &str, joining_date: &str) -> (&'static str, String) {
        (
            "Congratulations! Your application is approved",
            format!(
                "<h2>Congratulations {name}!</h2><p>You can use your registered email and password to log in and \
                 start working.</p><p>This is your official joining date: <strong>{joining_date}</strong></p>\
                 <p>Welcome aboard!</p>"
            ),
        )
    }
}
