use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use fahregut_auto_crawler::core::{logging, Config, CrawlerMetrics, HealthState};
use fahregut_auto_crawler::crawler::{HttpListingFetcher, RefreshScheduler, UpdateCycle};
use fahregut_auto_crawler::distribution::{Distributor, SubscriberRegistry};
use fahregut_auto_crawler::listings::ListingStore;
use fahregut_auto_crawler::server::{self, AppContext};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    logging::init_logging(&config.monitoring.log_level);

    info!("🚗 Fahregut Auto-Crawler startet...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Fetch-Service: {}", config.crawler.fetcher_url);

    let fetcher = Arc::new(HttpListingFetcher::new(
        config.crawler.fetcher_url.clone(),
        Duration::from_secs(config.crawler.fetch_timeout_secs),
    ));
    let store = Arc::new(ListingStore::new(
        chrono::Duration::hours(config.store.retention_hours),
        config.store.touch_on_refresh,
    ));
    let scheduler = Arc::new(RefreshScheduler::new(chrono::Duration::seconds(
        config.crawler.min_refresh_interval_secs as i64,
    )));
    let registry = Arc::new(SubscriberRegistry::new());
    let metrics = Arc::new(CrawlerMetrics::new());
    let distributor = Arc::new(Distributor::new(registry.clone(), metrics.clone()));
    let health = Arc::new(HealthState::new());
    let cycle = Arc::new(UpdateCycle::new(
        fetcher,
        store.clone(),
        scheduler,
        distributor,
        metrics.clone(),
        health.clone(),
        Duration::from_secs(config.crawler.fetch_timeout_secs),
    ));

    cycle.spawn_polling(config.crawler.poll_interval_secs);
    spawn_liveness_probe(registry.clone(), config.distributor.probe_interval_secs);
    if let Some(url) = config.crawler.keepalive_url.clone() {
        spawn_keepalive(url, config.crawler.poll_interval_secs);
    }

    let ctx = AppContext {
        cycle,
        store,
        registry,
        metrics,
        health,
    };

    let port = config.server.port;
    info!("🚗 Server läuft auf Port {}", port);
    warp::serve(server::routes(ctx)).run(([0, 0, 0, 0], port)).await;

    Ok(())
}

fn spawn_liveness_probe(registry: Arc<SubscriberRegistry>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            registry.probe().await;
        }
    });
}

fn spawn_keepalive(url: String, interval_secs: u64) {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // first ping one full interval in, once the server is up
        interval.tick().await;
        loop {
            interval.tick().await;
            match client.get(&url).send().await {
                Ok(response) => match response.json::<Vec<serde_json::Value>>().await {
                    Ok(ads) => info!("🔄 Live-Check: {} Anzeigen geladen", ads.len()),
                    Err(e) => warn!("⚠️ Auto-Update-Fehler: {}", e),
                },
                Err(e) => warn!("⚠️ Auto-Update-Fehler: {}", e),
            }
        }
    });
    info!(
        "🕒 Live-Auto-Update aktiviert (Intervall {} Sekunden)",
        interval_secs
    );
}
