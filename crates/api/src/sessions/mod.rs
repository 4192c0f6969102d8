//! Live intake sessions.
//!
//! Each account owns at most one [`WizardSession`](admissions_core::session::WizardSession)
//! at a time. The registry hands out the session behind a mutex so every
//! mutation of one draft is serialized; the sweeper drops sessions that
//! have been idle too long. Evicted drafts stay in the draft store and are
//! rehydrated by the next `POST /application/session`.

mod registry;
mod sweeper;

pub use registry::{SharedSession, WizardSessions};
pub use sweeper::start_sweeper;
