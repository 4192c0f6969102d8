use std::sync::Arc;

use admissions_core::submission::{ObjectStorage, SubmissionAssembler};

use crate::config::ServerConfig;
use crate::sessions::WizardSessions;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: admissions_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Event bus feeding the notification dispatcher.
    pub event_bus: Arc<admissions_events::EventBus>,
    /// Live intake sessions, one per account.
    pub sessions: Arc<WizardSessions>,
    pub storage: Arc<dyn ObjectStorage>,
    pub assembler: SubmissionAssembler,
}

impl AppState {
    /// Wire the Postgres collaborators around the given object storage.
    pub fn new(
        pool: admissions_db::DbPool,
        config: Arc<ServerConfig>,
        event_bus: Arc<admissions_events::EventBus>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let assembler = SubmissionAssembler::new(
            Arc::new(admissions_db::stores::PgIdentityDirectory::new(pool.clone())),
            Arc::clone(&storage),
            Arc::new(admissions_db::stores::PgApplicationSink::new(pool.clone())),
        );
        let sessions = Arc::new(WizardSessions::new(config.wizard_session_idle()));
        Self {
            pool,
            config,
            event_bus,
            sessions,
            storage,
            assembler,
        }
    }
}
