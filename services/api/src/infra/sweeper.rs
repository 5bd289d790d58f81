use std::time::Duration;

use tokio::task::JoinHandle;

use crate::domain::repository::OneTimeCodeRepository;

/// How often expired one-time codes are purged.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically delete expired one-time codes, the way a TTL index would.
///
/// Reads already ignore expired rows; this only keeps the table small.
pub fn spawn_expired_code_sweeper<C>(codes: C, every: Duration) -> JoinHandle<()>
where
    C: OneTimeCodeRepository + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match codes.delete_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "purged expired one-time codes"),
                Err(e) => tracing::warn!(error = ?e, "failed to purge expired one-time codes"),
            }
        }
    })
}
