//! Admissions event bus and email notifications.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope.
//! - [`EmailTemplate`]: subject and body rendering for applicant and staff
//!   emails.
//! - [`delivery`]: the [`Mailer`] seam with SMTP and log-only senders.
//! - [`NotificationDispatcher`]: background service that turns events into
//!   emails.

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod templates;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::email::{build_mailer, EmailConfig, EmailError, LogMailer, Mailer, SmtpMailer};
pub use dispatcher::NotificationDispatcher;
pub use templates::{EmailTemplate, Notification, RenderedEmail};
