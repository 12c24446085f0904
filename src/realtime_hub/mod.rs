//! RealtimeHub - WebSocket distribution
//!
//! ## Responsibilities
//!
//! - WebSocket connection management, keyed by the authenticated username
//! - Per-operator delivery of camera usage events (availability, access
//!   requests)
//!
//! Delivery is fire and forget: a closed or slow socket drops the message
//! with a log line and nothing else. The hub is the production
//! implementation of the coordinator's notification interface.

use crate::camera_usage::{NotificationDispatcher, UsageNotification};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Client connection
struct ClientConnection {
    id: Uuid,
    username: String,
    tx: mpsc::UnboundedSender<String>,
}

/// RealtimeHub instance
pub struct RealtimeHub {
    connections: RwLock<HashMap<Uuid, ClientConnection>>,
    connection_count: AtomicU64,
}

impl RealtimeHub {
    /// Create new RealtimeHub
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            connection_count: AtomicU64::new(0),
        }
    }

    /// Register a new client for an authenticated operator
    pub async fn register(&self, username: String) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        let conn = ClientConnection { id, username, tx };

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, conn);
        }

        self.connection_count.fetch_add(1, Ordering::Relaxed);

        tracing::info!(connection_id = %id, "Client connected");

        (id, rx)
    }

    /// Unregister a client
    pub async fn unregister(&self, id: &Uuid) {
        let mut connections = self.connections.write().await;
        if connections.remove(id).is_some() {
            self.connection_count.fetch_sub(1, Ordering::Relaxed);
            tracing::info!(connection_id = %id, "Client disconnected");
        }
    }

    /// Send a payload to every connection of one operator
    pub async fn send_to_user(&self, username: &str, payload: &str) {
        let connections = self.connections.read().await;
        for conn in connections.values() {
            if conn.username == username {
                if let Err(e) = conn.tx.send(payload.to_string()) {
                    tracing::warn!(connection_id = %conn.id, error = %e, "Failed to send message");
                }
            }
        }
    }

    /// Get connection count
    pub fn connection_count(&self) -> u64 {
        self.connection_count.load(Ordering::Relaxed)
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for RealtimeHub {
    async fn send(&self, username: &str, notification: UsageNotification) {
        let payload = match serde_json::to_string(&notification) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize notification");
                return;
            }
        };
        self.send_to_user(username, &payload).await;
    }
}
