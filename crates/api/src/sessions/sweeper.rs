use std::sync::Arc;
use std::time::Duration;

use super::registry::WizardSessions;

/// Interval between idle-session sweeps.
const SWEEP_INTERVAL_SECS: u64 = 60;

/// Spawn the task that periodically evicts idle wizard sessions.
///
/// Runs until aborted during shutdown.
pub fn start_sweeper(sessions: Arc<WizardSessions>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let evicted = sessions.evict_idle().await;
            if evicted > 0 {
                let remaining = sessions.count().await;
                tracing::info!(evicted, remaining, "Evicted idle wizard sessions");
            }
        }
    })
}
