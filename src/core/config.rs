use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub crawler: CrawlerConfig,
    pub store: StoreConfig,
    pub distributor: DistributorConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Endpoint of the out-of-process fetch service that renders the
    /// listings page and returns the raw listing JSON array.
    pub fetcher_url: String,
    pub fetch_timeout_secs: u64,
    pub poll_interval_secs: u64,
    /// Minimum spacing between two admitted refresh cycles, regardless of
    /// how many timers or pull requests try to trigger one.
    pub min_refresh_interval_secs: u64,
    /// Optional URL to self-ping every poll interval (keeps the host warm
    /// on platforms that idle out).
    pub keepalive_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// How long a listing id stays in the seen-set before it may be
    /// reported as new again.
    pub retention_hours: i64,
    /// When true, re-observing a seen listing refreshes its eviction clock.
    pub touch_on_refresh: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistributorConfig {
    pub probe_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
            },
            crawler: CrawlerConfig {
                fetcher_url: env::var("FETCHER_URL")
                    .unwrap_or_else(|_| "http://127.0.0.1:3000/fetch".to_string()),
                fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
                poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_refresh_interval_secs: env::var("MIN_REFRESH_INTERVAL_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                keepalive_url: env::var("KEEPALIVE_URL").ok().filter(|v| !v.is_empty()),
            },
            store: StoreConfig {
                retention_hours: env::var("RETENTION_HOURS")
                    .unwrap_or_else(|_| "12".to_string())
                    .parse()
                    .unwrap_or(12),
                touch_on_refresh: env::var("TOUCH_ON_REFRESH")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
            },
            distributor: DistributorConfig {
                probe_interval_secs: env::var("PROBE_INTERVAL_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .unwrap_or(15),
            },
            monitoring: MonitoringConfig {
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}
