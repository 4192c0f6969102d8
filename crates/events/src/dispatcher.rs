//! Notification dispatch service.
//!
//! [`NotificationDispatcher`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and emails every event that carries a [`Notification`]. Delivery failures
//! are logged; the request that published the event has already completed.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::bus::PlatformEvent;
use crate::delivery::email::{EmailError, Mailer};
use crate::templates::Notification;

pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    portal_name: String,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, portal_name: impl Into<String>) -> Self {
        Self {
            mailer,
            portal_name: portal_name.into(),
        }
    }

    /// Run the dispatch loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        tracing::info!(mailer = self.mailer.kind(), "Notification dispatcher started");
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.dispatch(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to send notification email"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification dispatcher lagged, some emails were not sent");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Send the email attached to `event`. Returns `false` for events
    /// without a notification.
    pub async fn dispatch(&self, event: &PlatformEvent) -> Result<bool, EmailError> {
        let Some(Notification {
            recipient_email,
            template,
        }) = event.notification()
        else {
            return Ok(false);
        };

        let email = template.render(&self.portal_name);
        self.mailer.send(&recipient_email, &email).await?;
        tracing::info!(
            to = %recipient_email,
            event_type = %event.event_type,
            template = template.name(),
            "Notification email sent"
        );
        Ok(true)
    }
}
