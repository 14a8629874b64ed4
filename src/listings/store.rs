use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::types::ListingRecord;

/// Remembers which listing ids have already been distributed, keyed by the
/// moment each id was first observed. Membership alone decides freshness;
/// the timestamp only drives retention.
pub struct ListingStore {
    seen: RwLock<HashMap<String, DateTime<Utc>>>,
    retention: Duration,
    touch_on_refresh: bool,
}

impl ListingStore {
    pub fn new(retention: Duration, touch_on_refresh: bool) -> Self {
        Self {
            seen: RwLock::new(HashMap::new()),
            retention,
            touch_on_refresh,
        }
    }

    /// Candidates whose id is not yet in the seen set, in their incoming
    /// order. Read-only: calling this twice without `mark_seen` in between
    /// reports the same records twice.
    pub async fn compute_fresh(&self, candidates: &[ListingRecord]) -> Vec<ListingRecord> {
        let seen = self.seen.read().await;
        candidates
            .iter()
            .filter(|record| !seen.contains_key(&record.id))
            .cloned()
            .collect()
    }

    /// Record every candidate id. New ids get `now` as their first-seen
    /// moment; ids already present keep their original timestamp unless the
    /// store was built with touch-on-refresh, in which case re-observation
    /// restarts their retention clock.
    pub async fn mark_seen(&self, candidates: &[ListingRecord], now: DateTime<Utc>) {
        let mut seen = self.seen.write().await;
        for record in candidates {
            seen.entry(record.id.clone())
                .and_modify(|first_seen| {
                    if self.touch_on_refresh {
                        *first_seen = now;
                    }
                })
                .or_insert(now);
        }
    }

    /// Drop entries older than the retention horizon and report how many
    /// went. An entry exactly at the horizon survives; one second past it
    /// does not.
    pub async fn evict_stale(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.retention;
        let mut seen = self.seen.write().await;
        let before = seen.len();
        seen.retain(|_, first_seen| *first_seen >= cutoff);
        let evicted = before - seen.len();
        if evicted > 0 {
            debug!("🧹 Seen-Set bereinigt: {} alte Einträge entfernt", evicted);
        }
        evicted
    }

    pub async fn seen_count(&self) -> usize {
        self.seen.read().await.len()
    }
}
