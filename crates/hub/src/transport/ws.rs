// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signaling WebSocket handler.
//!
//! The handshake carries the identity bearer token; unauthenticated
//! upgrades are refused with 401 before any socket exists. One task per
//! connection: inbound frames dispatch in arrival order, outbound events
//! drain from the peer's queue, and both paths funnel into the same
//! disconnect transition.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::SignalCode;
use crate::presence::{ConnId, PeerEntry};
use crate::protocol::{ClientEvent, ServerEvent};
use crate::signaling;
use crate::state::HubState;

/// Query parameters for the signaling upgrade.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalingQuery {
    pub token: Option<String>,
}

/// `GET /ws` — signaling WebSocket upgrade.
pub async fn ws_handler(
    State(state): State<Arc<HubState>>,
    Query(query): Query<SignalingQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let claims = match query.token.as_deref().map(|t| state.signer.verify_identity(t)) {
        Some(Ok(claims)) => claims,
        _ => {
            return axum::http::Response::builder()
                .status(401)
                .body(axum::body::Body::from("unauthorized"))
                .unwrap_or_default()
                .into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(state, claims, socket)).into_response()
}

/// Per-connection event loop.
async fn handle_socket(
    state: Arc<HubState>,
    claims: vigil_core::token::IdentityClaims,
    socket: WebSocket,
) {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let cancel = state.shutdown.child_token();
    let peer = Arc::new(PeerEntry {
        client_id: claims.client_id,
        role: claims.role,
        conn: ConnId::new(),
        connected_at: Utc::now(),
        outbound: outbound_tx,
        cancel: cancel.clone(),
    });
    tracing::debug!(client_id = %peer.client_id, role = %peer.role, "signaling connection open");

    // Presence events reach monitors only.
    let mut presence_rx = state.presence.subscribe();
    let wants_presence = peer.role == vigil_core::role::Role::Monitor;

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            // Hub -> client
            event = outbound_rx.recv() => {
                match event {
                    Some(event) => {
                        let Ok(json) = serde_json::to_string(&event) else { continue };
                        if ws_tx.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // Presence broadcast -> monitor
            event = presence_rx.recv(), if wants_presence => {
                let event = match event {
                    Ok(event) => event,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                };
                let Ok(json) = serde_json::to_string(&event) else { continue };
                if ws_tx.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }

            // Client -> hub
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(text.as_str()) {
                            Ok(event) => signaling::dispatch(&state, &peer, event).await,
                            Err(_) => peer.send(ServerEvent::error(SignalCode::BadRequest)),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {} // ping/pong/binary ignored
                }
            }
        }
    }

    signaling::handle_disconnect(&state, &peer).await;
    tracing::debug!(client_id = %peer.client_id, "signaling connection closed");
}
