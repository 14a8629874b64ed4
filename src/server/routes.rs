use std::convert::Infallible;
use std::sync::Arc;

use warp::http::StatusCode;
use warp::Filter;

use crate::core::{CrawlerMetrics, HealthState};
use crate::crawler::{CycleStatus, UpdateCycle};
use crate::distribution::SubscriberRegistry;
use crate::listings::{FilterSet, ListingStore};

/// Everything the request handlers need, cloned into each route.
#[derive(Clone)]
pub struct AppContext {
    pub cycle: Arc<UpdateCycle>,
    pub store: Arc<ListingStore>,
    pub registry: Arc<SubscriberRegistry>,
    pub metrics: Arc<CrawlerMetrics>,
    pub health: Arc<HealthState>,
}

fn with_context(
    ctx: AppContext,
) -> impl Filter<Extract = (AppContext,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

/// The complete route table: pull endpoint, push upgrade, health text and
/// status snapshot, all CORS-open like the original service.
pub fn routes(
    ctx: AppContext,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let crawl = warp::path("crawl")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<FilterSet>())
        .and(with_context(ctx.clone()))
        .and_then(handle_crawl);

    let ws = warp::path("ws")
        .and(warp::path::end())
        .and(warp::ws())
        .and(with_context(ctx.clone()))
        .map(|upgrade: warp::ws::Ws, ctx: AppContext| {
            upgrade.on_upgrade(move |socket| super::ws::subscriber_connection(socket, ctx))
        });

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            format!(
                "✅ Fahregut Auto-Crawler läuft (Version {} – Realtime OK)",
                env!("CARGO_PKG_VERSION")
            )
        });

    let status = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(handle_status);

    crawl
        .or(ws)
        .or(health)
        .or(status)
        .with(warp::cors().allow_any_origin())
}

/// Pull endpoint: every call is a refresh attempt. When the scheduler
/// refuses the slot the caller gets the most recently completed delta,
/// narrowed to its own criteria; only a fetch that this request itself
/// triggered and that failed becomes a 500.
async fn handle_crawl(
    filters: FilterSet,
    ctx: AppContext,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Infallible> {
    let report = ctx.cycle.run(&filters).await;

    let reply = match report.status {
        CycleStatus::Completed => {
            warp::reply::with_status(warp::reply::json(&report.delta), StatusCode::OK)
        }
        CycleStatus::Rejected => {
            let delta: Vec<_> = ctx
                .cycle
                .latest_delta()
                .await
                .into_iter()
                .filter(|record| filters.matches_record(record))
                .collect();
            warp::reply::with_status(warp::reply::json(&delta), StatusCode::OK)
        }
        CycleStatus::FetchFailed(e) => {
            let body = serde_json::json!({
                "error": "Crawler-Fehler",
                "details": e.to_string(),
            });
            warp::reply::with_status(
                warp::reply::json(&body),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    };
    Ok(reply)
}

async fn handle_status(ctx: AppContext) -> Result<warp::reply::Json, Infallible> {
    let report = ctx
        .health
        .report(
            ctx.store.seen_count().await,
            ctx.registry.count().await,
            ctx.metrics.snapshot(),
        )
        .await;
    Ok(warp::reply::json(&report))
}
