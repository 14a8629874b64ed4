use std::sync::Arc;

use tracing::{debug, error, info};

use super::registry::{PushFrame, SubscriberRegistry};
use crate::core::CrawlerMetrics;
use crate::listings::ListingRecord;

/// Fans a freshly computed delta out to every subscriber whose criteria
/// match, each one getting only its own records.
pub struct Distributor {
    registry: Arc<SubscriberRegistry>,
    metrics: Arc<CrawlerMetrics>,
}

impl Distributor {
    pub fn new(registry: Arc<SubscriberRegistry>, metrics: Arc<CrawlerMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Deliver `delta` to all matching subscribers. Returns how many
    /// subscribers actually received a frame; those whose criteria match
    /// nothing in the delta get no message at all.
    pub async fn distribute(&self, delta: &[ListingRecord]) -> usize {
        if delta.is_empty() {
            return 0;
        }

        let targets = self.registry.snapshot().await;
        let mut delivered = 0;

        for (id, filters, sender) in targets {
            let matching: Vec<&ListingRecord> = delta
                .iter()
                .filter(|record| filters.matches_record(record))
                .collect();
            if matching.is_empty() {
                continue;
            }

            let payload = match serde_json::to_string(&matching) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("❌ Delta-Serialisierung fehlgeschlagen: {}", e);
                    self.metrics.record_push_failure();
                    continue;
                }
            };

            if sender.send(PushFrame::Delta(payload)).is_ok() {
                self.metrics.record_push();
                delivered += 1;
            } else {
                // connection task already gone; the liveness probe reaps it
                debug!("📪 Abonnent {} nicht mehr erreichbar", id);
                self.metrics.record_push_failure();
            }
        }

        if delivered > 0 {
            info!(
                "📤 Delta mit {} Anzeigen an {} Abonnenten verteilt",
                delta.len(),
                delivered
            );
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::FilterSet;
    use tokio::sync::mpsc;

    fn record(id: &str, title: &str, price: &str) -> ListingRecord {
        ListingRecord {
            id: id.to_string(),
            title: title.to_string(),
            price: price.to_string(),
            location: String::new(),
            image_url: String::new(),
            detail_text: String::new(),
            raw_timestamp: String::new(),
            parsed_timestamp: None,
        }
    }

    fn brand_filter(marke: &str) -> FilterSet {
        FilterSet {
            marke: Some(marke.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn each_subscriber_gets_only_matching_records() {
        let registry = Arc::new(SubscriberRegistry::new());
        let metrics = Arc::new(CrawlerMetrics::new());
        let distributor = Distributor::new(registry.clone(), metrics);

        let (bmw_tx, mut bmw_rx) = mpsc::unbounded_channel();
        let (audi_tx, mut audi_rx) = mpsc::unbounded_channel();
        registry.register(brand_filter("BMW"), bmw_tx).await;
        registry.register(brand_filter("Audi"), audi_tx).await;

        let delta = vec![
            record("1", "BMW 320d", "12.500 €"),
            record("2", "Audi A4", "9.900 €"),
            record("3", "BMW X1", "18.000 €"),
        ];
        assert_eq!(distributor.distribute(&delta).await, 2);

        match bmw_rx.recv().await {
            Some(PushFrame::Delta(payload)) => {
                assert!(payload.contains("BMW 320d"));
                assert!(payload.contains("BMW X1"));
                assert!(!payload.contains("Audi"));
            }
            other => panic!("expected delta frame, got {:?}", other),
        }
        match audi_rx.recv().await {
            Some(PushFrame::Delta(payload)) => {
                assert!(payload.contains("Audi A4"));
                assert!(!payload.contains("BMW"));
            }
            other => panic!("expected delta frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn no_frame_when_nothing_matches() {
        let registry = Arc::new(SubscriberRegistry::new());
        let metrics = Arc::new(CrawlerMetrics::new());
        let distributor = Distributor::new(registry.clone(), metrics);

        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register(brand_filter("Porsche"), tx).await;

        let delta = vec![record("1", "BMW 320d", "12.500 €")];
        assert_eq!(distributor.distribute(&delta).await, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_delta_sends_nothing() {
        let registry = Arc::new(SubscriberRegistry::new());
        let metrics = Arc::new(CrawlerMetrics::new());
        let distributor = Distributor::new(registry.clone(), metrics);

        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register(FilterSet::default(), tx).await;

        assert_eq!(distributor.distribute(&[]).await, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dead_channel_does_not_stop_the_round() {
        let registry = Arc::new(SubscriberRegistry::new());
        let metrics = Arc::new(CrawlerMetrics::new());
        let distributor = Distributor::new(registry.clone(), metrics.clone());

        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        registry.register(FilterSet::default(), dead_tx).await;
        registry.register(FilterSet::default(), live_tx).await;
        drop(dead_rx);

        let delta = vec![record("1", "BMW 320d", "12.500 €")];
        assert_eq!(distributor.distribute(&delta).await, 1);
        assert!(matches!(live_rx.recv().await, Some(PushFrame::Delta(_))));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.pushes_sent, 1);
        assert_eq!(snapshot.push_failures, 1);
    }
}
