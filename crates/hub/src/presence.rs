// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Presence store: which kiosks and monitors are currently connected.
//!
//! At most one connection per client id. A newer registration displaces
//! the older one by cancelling its per-connection token; the displaced
//! socket loop then exits and its unregister is a no-op because the
//! connection id no longer matches.
//!
//! Presence changes (`kiosk-online` / `kiosk-offline`) fan out through
//! a broadcast channel that every monitor connection subscribes to.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use vigil_core::role::Role;

use crate::protocol::{KioskPresence, ServerEvent};

/// Opaque per-connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(Uuid);

impl ConnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

/// A connected signaling client.
pub struct PeerEntry {
    pub client_id: String,
    pub role: Role,
    pub conn: ConnId,
    pub connected_at: DateTime<Utc>,
    pub outbound: mpsc::UnboundedSender<ServerEvent>,
    pub cancel: CancellationToken,
}

impl PeerEntry {
    /// Queue an event for this peer. Send failures mean the socket loop
    /// already exited; the disconnect path cleans up.
    pub fn send(&self, event: ServerEvent) {
        let _ = self.outbound.send(event);
    }
}

/// Presence maps for both roles, plus the presence event channel.
pub struct Presence {
    kiosks: RwLock<HashMap<String, Arc<PeerEntry>>>,
    monitors: RwLock<HashMap<String, Arc<PeerEntry>>>,
    events: broadcast::Sender<ServerEvent>,
}

impl Presence {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self { kiosks: RwLock::new(HashMap::new()), monitors: RwLock::new(HashMap::new()), events }
    }

    fn map(&self, role: Role) -> &RwLock<HashMap<String, Arc<PeerEntry>>> {
        match role {
            Role::Kiosk => &self.kiosks,
            Role::Monitor => &self.monitors,
        }
    }

    /// Insert (or overwrite) a presence entry. Returns the displaced
    /// entry, already cancelled, if a different connection held the id.
    /// Re-registration on the same connection is a refresh, not a
    /// displacement.
    pub async fn register(&self, entry: Arc<PeerEntry>) -> Option<Arc<PeerEntry>> {
        let displaced =
            self.map(entry.role).write().await.insert(entry.client_id.clone(), entry.clone());
        match displaced {
            Some(old) if old.conn != entry.conn => {
                old.cancel.cancel();
                tracing::info!(
                    client_id = %entry.client_id,
                    role = %entry.role,
                    "displaced previous connection"
                );
                Some(old)
            }
            _ => None,
        }
    }

    /// Remove an entry, but only if it still belongs to this connection.
    /// Returns true when the entry was removed.
    pub async fn unregister(&self, role: Role, client_id: &str, conn: ConnId) -> bool {
        let mut map = self.map(role).write().await;
        match map.get(client_id) {
            Some(entry) if entry.conn == conn => {
                map.remove(client_id);
                true
            }
            _ => false,
        }
    }

    pub async fn kiosk(&self, kiosk_id: &str) -> Option<Arc<PeerEntry>> {
        self.kiosks.read().await.get(kiosk_id).map(Arc::clone)
    }

    pub async fn monitor(&self, monitor_id: &str) -> Option<Arc<PeerEntry>> {
        self.monitors.read().await.get(monitor_id).map(Arc::clone)
    }

    /// Snapshot of the online kiosk list, as projected to monitors.
    pub async fn online_kiosks(&self) -> Vec<KioskPresence> {
        self.kiosks
            .read()
            .await
            .values()
            .map(|e| KioskPresence { kiosk_id: e.client_id.clone(), connected_at: e.connected_at })
            .collect()
    }

    /// Subscribe to presence events. Every monitor connection holds a
    /// receiver and forwards matching events down its socket.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Publish a presence event to every subscriber. No cross-monitor
    /// ordering guarantee.
    pub fn publish(&self, event: ServerEvent) {
        let _ = self.events.send(event);
    }

    pub async fn kiosk_count(&self) -> usize {
        self.kiosks.read().await.len()
    }

    pub async fn monitor_count(&self) -> usize {
        self.monitors.read().await.len()
    }
}

impl Default for Presence {
    fn default() -> Self {
        Self::new()
    }
}
