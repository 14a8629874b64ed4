use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "fahregut_auto_crawler={log_level},warp=warn,hyper=warn"
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();
}
