//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across the application.

use admissions_core::types::DbId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::templates::Notification;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// An applicant's form was stored.
pub const APPLICATION_SUBMITTED: &str = "application.submitted";
/// Staff moved an application along its review lifecycle.
pub const APPLICATION_STATUS_CHANGED: &str = "application.status_changed";
/// Staff wrote to an applicant about their application.
pub const APPLICATION_MESSAGE: &str = "application.message";
/// Staff created a login for someone.
pub const ADMIN_ACCOUNT_CREATED: &str = "admin.account_created";

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred in the portal.
///
/// Constructed via [`PlatformEvent::new`] and enriched with the builder
/// methods [`with_source`](PlatformEvent::with_source),
/// [`with_actor`](PlatformEvent::with_actor) and
/// [`with_notification`](PlatformEvent::with_notification).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"application.submitted"`.
    pub event_type: String,

    /// Source entity kind (e.g. `"application"`, `"user"`).
    pub source_entity_type: Option<String>,

    /// Database id of the source entity.
    pub source_entity_id: Option<DbId>,

    /// User that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// Event-specific data. Events that should produce an email carry a
    /// serialized [`Notification`].
    pub payload: serde_json::Value,

    /// Creation time (UTC).
    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    /// Create an event carrying only its type. The optional fields start
    /// empty and the payload is an empty object.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Record which entity the event concerns.
    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    /// Record the user who caused the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Replace the JSON payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Attach an email notification as the payload.
    pub fn with_notification(self, notification: &Notification) -> Self {
        let payload = serde_json::to_value(notification)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
        self.with_payload(payload)
    }

    /// The attached notification, if the payload carries one.
    pub fn notification(&self) -> Option<Notification> {
        serde_json::from_value(self.payload.clone()).ok()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast buffer size used by [`EventBus::default`].
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Every subscriber gets its own copy of each [`PlatformEvent`] published
/// after it subscribed.
///
/// ```rust
/// use admissions_events::bus::{EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new("application.submitted"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest messages are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: PlatformEvent) {
        let _ = self.sender.send(event);
    }

    /// Start receiving events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::EmailTemplate;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            PlatformEvent::new(APPLICATION_SUBMITTED)
                .with_source("application", 42)
                .with_actor(7)
                .with_payload(serde_json::json!({"key": "value"})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, APPLICATION_SUBMITTED);
        assert_eq!(received.source_entity_type.as_deref(), Some("application"));
        assert_eq!(received.source_entity_id, Some(42));
        assert_eq!(received.actor_user_id, Some(7));
        assert_eq!(received.payload["key"], "value");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(PlatformEvent::new(APPLICATION_MESSAGE));

        assert_eq!(rx1.recv().await.unwrap().event_type, APPLICATION_MESSAGE);
        assert_eq!(rx2.recv().await.unwrap().event_type, APPLICATION_MESSAGE);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        EventBus::default().publish(PlatformEvent::new("orphan.event"));
    }

    #[test]
    fn notification_payload_round_trips() {
        let notification = Notification {
            recipient_email: "maria@example.com".into(),
            template: EmailTemplate::AdminMessage {
                applicant_name: "Maria".into(),
                subject: "Interview".into(),
                message: "Please come on Monday.".into(),
            },
        };
        let event = PlatformEvent::new(APPLICATION_MESSAGE).with_notification(&notification);
        assert_eq!(event.notification(), Some(notification));
    }

    #[test]
    fn bare_event_has_no_notification() {
        let event = PlatformEvent::new("bare.event");
        assert!(event.source_entity_type.is_none());
        assert!(event.payload.is_object());
        assert!(event.notification().is_none());
    }
}
