//! Background refresh and idle expiry.
//!
//! One worker loop per cache sweeps the entry table every poll interval. It
//! drops entries idle for longer than the expiry window and claims entries
//! whose refresh time has passed. Each claimed key is refreshed on its own
//! task, bounded by a semaphore; the `refreshing` flag on the entry keeps a
//! key from being claimed again until its refresh finishes.

use std::sync::Arc;

use chainmeta_error::Result;
use tokio::sync::Semaphore;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::Shared;

pub(crate) async fn run<V>(shared: Arc<Shared<V>>, cancel: CancellationToken)
where
    V: Clone + Send + Sync + 'static,
{
    let mut ticker = interval(shared.config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let permits = Arc::new(Semaphore::new(shared.config.max_concurrent_refreshes.max(1)));

    debug!(cache = %shared.name, "refresh scheduler started");

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(cache = %shared.name, "refresh scheduler stopped");
                break;
            }

            _ = ticker.tick() => {
                let now = Instant::now();
                let evicted = shared.evict_idle(now);
                if evicted > 0 {
                    debug!(cache = %shared.name, evicted, "dropped idle entries");
                }

                for key in shared.claim_due(now) {
                    tokio::spawn(refresh_one(
                        Arc::clone(&shared),
                        Arc::clone(&permits),
                        cancel.clone(),
                        key,
                    ));
                }
            }
        }
    }
}

async fn refresh_one<V>(
    shared: Arc<Shared<V>>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    key: String,
) where
    V: Clone + Send + Sync + 'static,
{
    let Ok(_permit) = permits.acquire_owned().await else {
        shared.release(&key);
        return;
    };

    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        result = shared.loader.load(&key) => result,
    };

    shared.finish_refresh(&key, result);
}

impl<V> Shared<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Removes entries nobody has read within the expiry window
    pub(crate) fn evict_idle(&self, now: Instant) -> u64 {
        let Some(expire) = self.config.expire_after() else {
            return 0;
        };

        let mut evicted = 0u64;
        self.entries.retain(|key, entry| {
            let keep = now.saturating_duration_since(entry.last_read) < expire;
            if !keep {
                trace!(cache = %self.name, key = %key, "entry expired");
                evicted += 1;
            }
            keep
        });
        self.stats.evicted(evicted);
        evicted
    }

    /// Marks every due entry not already refreshing and returns its key
    pub(crate) fn claim_due(&self, now: Instant) -> Vec<String> {
        let mut due = Vec::new();
        for mut entry in self.entries.iter_mut() {
            if !entry.refreshing && entry.next_refresh <= now {
                entry.refreshing = true;
                due.push(entry.key().clone());
            }
        }
        due
    }

    fn release(&self, key: &str) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.refreshing = false;
        }
    }

    /// Applies a background reload result.
    ///
    /// A failure keeps the previous value. A result for a key that expired
    /// while the refresh was running is discarded.
    pub(crate) fn finish_refresh(&self, key: &str, result: Result<V>) {
        let next_refresh = Instant::now() + self.config.refresh_interval();
        let Some(mut entry) = self.entries.get_mut(key) else {
            trace!(cache = %self.name, key = %key, "refreshed key no longer cached");
            return;
        };

        entry.refreshing = false;
        entry.next_refresh = next_refresh;
        match result {
            Ok(value) => {
                entry.value = value;
                self.stats.refresh(true);
                trace!(cache = %self.name, key = %key, "entry refreshed");
            }
            Err(err) => {
                self.stats.refresh(false);
                warn!(cache = %self.name, key = %key, error = %err, "refresh failed, keeping previous value");
            }
        }
    }
}
