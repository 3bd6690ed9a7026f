//! Email collaborator used for best-effort notification delivery.
//!
//! [`SmtpEmailSender`] wraps the `lettre` async SMTP transport. When
//! `SMTP_HOST` is not set [`EmailConfig::from_env`] returns `None` and the
//! service falls back to [`NoopEmailSender`], which reports every send as
//! not configured so `email_sent` stays false.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use super::templates;
use crate::notification::notification_models::NotificationCategory;

/// Error type for email delivery failures. Recorded, never retried.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),

    #[error("Email delivery is not configured")]
    NotConfigured,
}

const DEFAULT_SMTP_PORT: u16 = 587;

const DEFAULT_FROM_ADDRESS: &str = "fleet-reminders@localhost";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// | Variable        | Required | Default                     |
    /// |-----------------|----------|-----------------------------|
    /// | `SMTP_HOST`     | yes      | none                        |
    /// | `SMTP_PORT`     | no       | `587`                       |
    /// | `SMTP_FROM`     | no       | `fleet-reminders@localhost` |
    /// | `SMTP_USER`     | no       | none                        |
    /// | `SMTP_PASSWORD` | no       | none                        |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Everything the collaborator needs to render and send one notification email.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEmail {
    pub to: String,
    pub name: String,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
    pub language: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_notification_email(&self, email: &NotificationEmail) -> Result<(), DeliveryError>;
}

pub struct SmtpEmailSender {
    from_address: String,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailSender {
    pub fn new(config: EmailConfig) -> Result<Self, DeliveryError> {
        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (config.smtp_user, config.smtp_password) {
            transport_builder = transport_builder.credentials(Credentials::new(user, pass));
        }

        Ok(Self {
            from_address: config.from_address,
            mailer: transport_builder.build(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_notification_email(&self, email: &NotificationEmail) -> Result<(), DeliveryError> {
        let message = Message::builder()
            .from(self.from_address.parse()?)
            .to(email.to.parse()?)
            .subject(templates::render_subject(email))
            .header(ContentType::TEXT_PLAIN)
            .body(templates::render_body(email))
            .map_err(|e| DeliveryError::Build(e.to_string()))?;

        self.mailer.send(message).await?;

        tracing::info!(to = %email.to, category = %email.category, "Notification email sent");
        Ok(())
    }
}

/// Stand-in used when SMTP is not configured.
pub struct NoopEmailSender;

#[async_trait]
impl EmailSender for NoopEmailSender {
    async fn send_notification_email(&self, email: &NotificationEmail) -> Result<(), DeliveryError> {
        tracing::debug!(to = %email.to, category = %email.category, "SMTP not configured, skipping email");
        Err(DeliveryError::NotConfigured)
    }
}
