//! Background eviction shared by every cache in the process.
//!
//! One ticking task services all caches instead of one timer per entry.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::ttl::TtlCache;

/// Object-safe hook letting heterogeneous `TtlCache<K, V>` instances share a
/// single sweeper task.
pub trait PruneExpired: Send + Sync {
    /// Evicts expired entries, returning how many were removed.
    fn purge_expired(&self) -> usize;
}

impl<K, V> PruneExpired for TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn purge_expired(&self) -> usize {
        // Resolves to the inherent method on TtlCache.
        self.purge_expired()
    }
}

/// Spawns the process-wide cache sweeper.
///
/// Every `period`, each registered cache is asked to purge expired entries.
/// The returned handle aborts the sweeper when dropped by the caller via
/// [`tokio::task::JoinHandle::abort`]; services typically keep it for the
/// process lifetime.
pub fn spawn_sweeper(
    caches: Vec<Arc<dyn PruneExpired>>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick of a tokio interval fires immediately; consume it so
        // sweeps start one full period after startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let mut evicted = 0;
            for cache in &caches {
                evicted += cache.purge_expired();
            }
            if evicted > 0 {
                tracing::debug!(evicted, "cache sweep removed expired entries");
            }
        }
    })
}
