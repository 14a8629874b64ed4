pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;

pub use config::Config;
pub use error::FetchError;
pub use health::{HealthState, StatusReport};
pub use metrics::{CrawlerMetrics, MetricsSnapshot};
