// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UPDATE CYCLE - ONE GATED REFRESH FROM FETCH TO FAN-OUT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Every refresh trigger (poll timer, pull request) funnels through here:
// 1. Claim the scheduler slot; losers return an empty delta immediately
// 2. Fetch raw listings, bounded by a hard timeout
// 3. Promote to records, resolve timestamps, sort newest first
// 4. Diff against the seen set, mark candidates, evict stale entries
// 5. Release the slot, then fan the fresh delta out to subscribers
//
// At most one cycle runs at a time system-wide; everything the process
// fetches flows through this single path.
//
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::Arc;

use chrono::{Local, Utc};
use tokio::sync::RwLock;
use tracing::{error, info};

use super::fetcher::ListingFetcher;
use super::scheduler::{AcquireDecision, RefreshScheduler};
use crate::core::{CrawlerMetrics, FetchError, HealthState};
use crate::distribution::Distributor;
use crate::listings::{time, FilterSet, ListingRecord, ListingStore};

/// How a refresh attempt ended.
#[derive(Debug)]
pub enum CycleStatus {
    /// Fetch, dedup and distribution all ran.
    Completed,
    /// The scheduler refused the slot; nothing was fetched.
    Rejected,
    /// The fetch call failed; the seen set is untouched.
    FetchFailed(FetchError),
}

/// Result of one refresh attempt. `delta` holds the records that turned out
/// new in this attempt; it stays empty on rejection and on failure.
#[derive(Debug)]
pub struct CycleReport {
    pub delta: Vec<ListingRecord>,
    pub status: CycleStatus,
}

impl CycleReport {
    fn empty(status: CycleStatus) -> Self {
        Self {
            delta: Vec::new(),
            status,
        }
    }
}

/// One full refresh: gate, fetch, promote, dedup, distribute.
pub struct UpdateCycle {
    fetcher: Arc<dyn ListingFetcher>,
    store: Arc<ListingStore>,
    scheduler: Arc<RefreshScheduler>,
    distributor: Arc<Distributor>,
    metrics: Arc<CrawlerMetrics>,
    health: Arc<HealthState>,
    fetch_timeout: std::time::Duration,
    latest_delta: RwLock<Vec<ListingRecord>>,
}

impl UpdateCycle {
    pub fn new(
        fetcher: Arc<dyn ListingFetcher>,
        store: Arc<ListingStore>,
        scheduler: Arc<RefreshScheduler>,
        distributor: Arc<Distributor>,
        metrics: Arc<CrawlerMetrics>,
        health: Arc<HealthState>,
        fetch_timeout: std::time::Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            scheduler,
            distributor,
            metrics,
            health,
            fetch_timeout,
            latest_delta: RwLock::new(Vec::new()),
        }
    }

    /// Run one refresh attempt with the given fetch criteria.
    ///
    /// Never fails as such: a refused slot or a broken fetch comes back as a
    /// report the caller can map to its own surface.
    pub async fn run(&self, filters: &FilterSet) -> CycleReport {
        let now = Utc::now();

        match self.scheduler.try_acquire(now).await {
            AcquireDecision::Granted => {}
            AcquireDecision::AlreadyRunning => {
                info!("⚠️ Crawl läuft bereits, überspringe diesen Durchlauf");
                self.metrics.record_rejection();
                return CycleReport::empty(CycleStatus::Rejected);
            }
            AcquireDecision::Throttled { remaining } => {
                info!(
                    "⏳ Zu früh für nächsten Crawl, wieder frei in {}s",
                    remaining.num_seconds().max(1)
                );
                self.metrics.record_rejection();
                return CycleReport::empty(CycleStatus::Rejected);
            }
        }

        info!("🔄 Suche nach neuesten Anzeigen...");
        let fetched_result =
            tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch_listings(filters))
                .await
                .unwrap_or_else(|_| Err(FetchError::Timeout(self.fetch_timeout)));
        let raw = match fetched_result {
            Ok(raw) => raw,
            Err(e) => {
                error!("⚠️ Crawler-Fehler: {}", e);
                self.metrics.record_fetch_failure();
                self.health.record_fetch(false).await;
                self.scheduler.release().await;
                return CycleReport::empty(CycleStatus::FetchFailed(e));
            }
        };
        self.health.record_fetch(true).await;

        // relative timestamps resolve against the local calendar day
        let local_now = Local::now();
        let fetched = raw.len();
        let mut candidates: Vec<ListingRecord> = raw
            .into_iter()
            .filter_map(|r| ListingRecord::from_raw(r, &local_now))
            .collect();
        time::sort_newest_first(&mut candidates);

        let fresh = self.store.compute_fresh(&candidates).await;
        self.store.mark_seen(&candidates, now).await;
        self.store.evict_stale(now).await;

        // free the slot before fan-out; distribution must never delay the
        // next refresh
        self.scheduler.release().await;

        if fresh.is_empty() {
            info!("ℹ️ Keine neuen Anzeigen.");
        } else {
            info!("🆕 {} neue Anzeigen gefunden!", fresh.len());
        }
        self.metrics.record_cycle(fetched, fresh.len());
        self.health.record_cycle().await;

        *self.latest_delta.write().await = fresh.clone();
        self.distributor.distribute(&fresh).await;

        CycleReport {
            delta: fresh,
            status: CycleStatus::Completed,
        }
    }

    /// The delta of the most recently completed refresh. Pull callers fall
    /// back to this when the scheduler refuses them.
    pub async fn latest_delta(&self) -> Vec<ListingRecord> {
        self.latest_delta.read().await.clone()
    }

    /// Kick off the periodic refresh loop. The first round runs right away,
    /// then once per interval; criteria-free, so the seen set covers the
    /// whole feed.
    pub fn spawn_polling(self: &Arc<Self>, interval_secs: u64) {
        let cycle = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                cycle.run(&FilterSet::default()).await;
            }
        });
        info!("🔄 Auto-Crawl alle {}s aktiv", interval_secs);
    }
}
