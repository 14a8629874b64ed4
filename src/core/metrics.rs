use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug)]
pub struct CrawlerMetrics {
    cycles_completed: AtomicU64,
    cycles_rejected: AtomicU64,
    fetch_failures: AtomicU64,
    listings_fetched: AtomicU64,
    fresh_found: AtomicU64,
    pushes_sent: AtomicU64,
    push_failures: AtomicU64,
    started: Instant,
}

impl CrawlerMetrics {
    pub fn new() -> Self {
        Self {
            cycles_completed: AtomicU64::new(0),
            cycles_rejected: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            listings_fetched: AtomicU64::new(0),
            fresh_found: AtomicU64::new(0),
            pushes_sent: AtomicU64::new(0),
            push_failures: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_cycle(&self, fetched: usize, fresh: usize) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.listings_fetched
            .fetch_add(fetched as u64, Ordering::Relaxed);
        self.fresh_found.fetch_add(fresh as u64, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.cycles_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_push(&self) {
        self.pushes_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_push_failure(&self) {
        self.push_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            cycles_rejected: self.cycles_rejected.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            listings_fetched: self.listings_fetched.load(Ordering::Relaxed),
            fresh_found: self.fresh_found.load(Ordering::Relaxed),
            pushes_sent: self.pushes_sent.load(Ordering::Relaxed),
            push_failures: self.push_failures.load(Ordering::Relaxed),
            uptime_seconds: self.started.elapsed().as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub cycles_completed: u64,
    pub cycles_rejected: u64,
    pub fetch_failures: u64,
    pub listings_fetched: u64,
    pub fresh_found: u64,
    pub pushes_sent: u64,
    pub push_failures: u64,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = CrawlerMetrics::new();

        metrics.record_cycle(15, 3);
        metrics.record_cycle(15, 0);
        metrics.record_rejection();
        metrics.record_fetch_failure();

        let snap = metrics.snapshot();
        assert_eq!(snap.cycles_completed, 2);
        assert_eq!(snap.cycles_rejected, 1);
        assert_eq!(snap.fetch_failures, 1);
        assert_eq!(snap.listings_fetched, 30);
        assert_eq!(snap.fresh_found, 3);
    }
}
