use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use warp::ws::{Message, WebSocket};

use super::routes::AppContext;
use crate::distribution::PushFrame;
use crate::listings::FilterSet;

/// One push subscriber from upgrade to disconnect. Starts criteria-free;
/// filter messages narrow what the distributor delivers. When the registry
/// drops the subscriber (missed liveness round), the loop sends a Close
/// frame and hangs up so the peer knows to reconnect.
pub async fn subscriber_connection(socket: WebSocket, ctx: AppContext) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<PushFrame>();
    let subscriber_id = ctx.registry.register(FilterSet::default(), tx).await;

    loop {
        tokio::select! {
            // outbound: distributor frames onto the socket
            frame = rx.recv() => {
                match frame {
                    Some(PushFrame::Delta(payload)) => {
                        if ws_tx.send(Message::text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(PushFrame::Ping) => {
                        if ws_tx.send(Message::ping(Vec::new())).await.is_err() {
                            break;
                        }
                    }
                    // registry side is gone: close the socket instead of
                    // idling on a connection nothing will ever write to
                    None => {
                        let _ = ws_tx.send(Message::close()).await;
                        break;
                    }
                }
            }
            // inbound: filter updates and pongs
            incoming = ws_rx.next() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        debug!("🔌 WebSocket-Fehler bei Abonnent {}: {}", subscriber_id, e);
                        break;
                    }
                    None => break,
                };

                if message.is_close() {
                    break;
                }
                if message.is_pong() {
                    ctx.registry.record_pong(&subscriber_id).await;
                    continue;
                }
                if let Ok(text) = message.to_str() {
                    match parse_filter_message(text) {
                        Some(filters) => {
                            ctx.registry.update_filters(&subscriber_id, filters).await;
                        }
                        None => {
                            warn!("⚠️ Unlesbare Filter-Nachricht von Abonnent {}", subscriber_id);
                        }
                    }
                }
            }
        }
    }

    ctx.registry.unregister(&subscriber_id).await;
}

/// Clients send either `{"type":"filter", ...criteria}` or the bare
/// criteria object. A bare object counts only when every key is a known
/// criteria field, so app-level chatter like `{"ping":1}` cannot wipe a
/// subscriber's filters. Anything else is ignored.
fn parse_filter_message(text: &str) -> Option<FilterSet> {
    #[derive(Deserialize)]
    struct Tagged {
        #[serde(rename = "type")]
        kind: String,
        #[serde(flatten)]
        filters: FilterSet,
    }

    if let Ok(tagged) = serde_json::from_str::<Tagged>(text) {
        if tagged.kind == "filter" {
            return Some(tagged.filters);
        }
        return None;
    }

    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let criteria = value.as_object()?;
    if !criteria.keys().all(|key| FilterSet::is_criteria_field(key)) {
        return None;
    }
    serde_json::from_value(value).ok()
}
