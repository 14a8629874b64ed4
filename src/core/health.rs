use serde::Serialize;
use std::time::Instant;
use tokio::sync::RwLock;

use super::metrics::MetricsSnapshot;

/// Process-level health, fed by the update cycle and read by `/status`.
///
/// Liveness (`/health`) never depends on this: a process that answers HTTP
/// is alive even when every fetch fails.
pub struct HealthState {
    started: Instant,
    last_fetch_ok: RwLock<Option<bool>>,
    last_cycle: RwLock<Option<Instant>>,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            last_fetch_ok: RwLock::new(None),
            last_cycle: RwLock::new(None),
        }
    }

    pub async fn record_fetch(&self, ok: bool) {
        *self.last_fetch_ok.write().await = Some(ok);
    }

    pub async fn record_cycle(&self) {
        *self.last_cycle.write().await = Some(Instant::now());
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub async fn report(
        &self,
        seen_entries: usize,
        subscribers: usize,
        metrics: MetricsSnapshot,
    ) -> StatusReport {
        let last_fetch_ok = *self.last_fetch_ok.read().await;
        let last_cycle_age_seconds = self
            .last_cycle
            .read()
            .await
            .map(|t| t.elapsed().as_secs());

        let status = match last_fetch_ok {
            Some(true) => "ok",
            Some(false) => "degraded",
            None => "starting",
        };

        StatusReport {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            last_cycle_age_seconds,
            last_fetch_ok,
            seen_entries,
            subscribers,
            metrics,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub last_cycle_age_seconds: Option<u64>,
    pub last_fetch_ok: Option<bool>,
    pub seen_entries: usize,
    pub subscribers: usize,
    pub metrics: MetricsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::CrawlerMetrics;

    #[tokio::test]
    async fn status_label_follows_last_fetch() {
        let health = HealthState::new();
        let metrics = CrawlerMetrics::new();

        let report = health.report(0, 0, metrics.snapshot()).await;
        assert_eq!(report.status, "starting");
        assert!(report.last_cycle_age_seconds.is_none());

        health.record_fetch(true).await;
        health.record_cycle().await;
        let report = health.report(5, 2, metrics.snapshot()).await;
        assert_eq!(report.status, "ok");
        assert_eq!(report.seen_entries, 5);
        assert_eq!(report.subscribers, 2);
        assert!(report.last_cycle_age_seconds.is_some());

        health.record_fetch(false).await;
        let report = health.report(5, 2, metrics.snapshot()).await;
        assert_eq!(report.status, "degraded");
    }
}
