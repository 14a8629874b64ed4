use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::listings::FilterSet;

/// What the push channel carries to a connection task. Keeping the frame
/// transport-free lets the registry and distributor run without a socket
/// in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum PushFrame {
    /// A serialized delta, ready for the wire.
    Delta(String),
    /// Liveness probe; the connection task answers on the socket.
    Ping,
}

struct Subscriber {
    filters: FilterSet,
    sender: mpsc::UnboundedSender<PushFrame>,
    connected_at: DateTime<Utc>,
    awaiting_pong: bool,
}

/// All currently connected push subscribers with their filter criteria.
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<Uuid, Subscriber>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection. The sender is unbounded so distribution never waits
    /// on a slow consumer.
    pub async fn register(
        &self,
        filters: FilterSet,
        sender: mpsc::UnboundedSender<PushFrame>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(
            id,
            Subscriber {
                filters,
                sender,
                connected_at: Utc::now(),
                awaiting_pong: false,
            },
        );
        info!("📡 Neuer Abonnent {} ({} aktiv)", id, subscribers.len());
        id
    }

    pub async fn unregister(&self, id: &Uuid) {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.remove(id).is_some() {
            info!("👋 Abonnent {} getrennt ({} aktiv)", id, subscribers.len());
        }
    }

    /// Replace a subscriber's criteria; the next delta is matched against
    /// the new set. Unknown ids are ignored.
    pub async fn update_filters(&self, id: &Uuid, filters: FilterSet) -> bool {
        let mut subscribers = self.subscribers.write().await;
        match subscribers.get_mut(id) {
            Some(subscriber) => {
                subscriber.filters = filters;
                debug!("🔧 Filter für Abonnent {} aktualisiert", id);
                true
            }
            None => false,
        }
    }

    /// A pong arrived for this connection; it survives the next probe.
    pub async fn record_pong(&self, id: &Uuid) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(subscriber) = subscribers.get_mut(id) {
            subscriber.awaiting_pong = false;
        }
    }

    /// One liveness round: drop every subscriber that never answered the
    /// previous probe, then probe the rest. Returns the ids that were
    /// dropped.
    pub async fn probe(&self) -> Vec<Uuid> {
        let mut subscribers = self.subscribers.write().await;
        let mut dropped = Vec::new();

        subscribers.retain(|id, subscriber| {
            if subscriber.awaiting_pong {
                dropped.push(*id);
                return false;
            }
            subscriber.awaiting_pong = true;
            if subscriber.sender.send(PushFrame::Ping).is_err() {
                dropped.push(*id);
                return false;
            }
            true
        });

        if !dropped.is_empty() {
            warn!(
                "💀 {} Abonnenten ohne Pong entfernt ({} aktiv)",
                dropped.len(),
                subscribers.len()
            );
        }
        dropped
    }

    /// Current subscribers with a cloned sender each, so the caller can
    /// fan out without holding the registry lock.
    pub async fn snapshot(&self) -> Vec<(Uuid, FilterSet, mpsc::UnboundedSender<PushFrame>)> {
        let subscribers = self.subscribers.read().await;
        subscribers
            .iter()
            .map(|(id, s)| (*id, s.filters.clone(), s.sender.clone()))
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn connected_since(&self, id: &Uuid) -> Option<DateTime<Utc>> {
        let subscribers = self.subscribers.read().await;
        subscribers.get(id).map(|s| s.connected_at)
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
