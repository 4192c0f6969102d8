//! Email delivery via SMTP.
//!
//! [`SmtpMailer`] wraps the `lettre` async SMTP transport. Configuration is
//! loaded from environment variables; if `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and [`build_mailer`] falls back
//! to [`LogMailer`].

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::templates::RenderedEmail;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

const DEFAULT_FROM_ADDRESS: &str = "noreply@admissions.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                     |
    /// |-----------------|----------|-----------------------------|
    /// | `SMTP_HOST`     | yes      |                             |
    /// | `SMTP_PORT`     | no       | `587`                       |
    /// | `SMTP_FROM`     | no       | `noreply@admissions.local`  |
    /// | `SMTP_USER`     | no       |                             |
    /// | `SMTP_PASSWORD` | no       |                             |
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

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// Sends one rendered email to one recipient.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError>;

    /// Short name for logs.
    fn kind(&self) -> &'static str;
}

/// Pick the SMTP mailer when configured, otherwise log emails instead.
pub fn build_mailer(config: Option<EmailConfig>) -> Result<Arc<dyn Mailer>, EmailError> {
    match config {
        Some(config) => Ok(Arc::new(SmtpMailer::new(config)?)),
        None => Ok(Arc::new(LogMailer)),
    }
}

pub struct SmtpMailer {
    from_address: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            from_address: config.from_address,
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        let message = build_message(&self.from_address, to, email)?;
        self.transport.send(message).await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "smtp"
    }
}

fn build_message(from: &str, to: &str, email: &RenderedEmail) -> Result<Message, EmailError> {
    Message::builder()
        .from(from.parse()?)
        .to(to.parse()?)
        .subject(email.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())
        .map_err(|e| EmailError::Build(e.to_string()))
}

/// Writes emails to the log instead of sending them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        tracing::info!(to, subject = %email.subject, body = %email.body, "Email (not sent, SMTP disabled)");
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "log"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> RenderedEmail {
        RenderedEmail {
            subject: "Hello".into(),
            body: "Body".into(),
        }
    }

    #[test]
    fn build_mailer_without_config_logs() {
        let mailer = build_mailer(None).unwrap();
        assert_eq!(mailer.kind(), "log");
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        LogMailer.send("someone@example.com", &email()).await.unwrap();
    }

    #[test]
    fn message_rejects_bad_recipient() {
        let err = build_message("noreply@admissions.local", "not-an-email", &email()).unwrap_err();
        assert!(err.to_string().contains("Email address parse error"));
    }

    #[test]
    fn message_builds_for_valid_addresses() {
        assert!(build_message("noreply@admissions.local", "maria@example.com", &email()).is_ok());
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
