// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Viewer WebSocket transport.
//!
//! A viewer presents a single-use stream token in the handshake; the
//! admission pipeline runs before the upgrade, so a rejected viewer
//! never costs a socket. An admitted viewer is bound to the token's
//! camera for the life of the connection and receives that worker's
//! output frames in order.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::admission::{self, AdmissionError};
use crate::state::GatewayState;
use crate::worker::ffmpeg::StreamProfile;
use crate::worker::{StreamWorker, ViewerId, WorkerSpec};

/// Query parameters for the viewer upgrade.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerQuery {
    pub token: Option<String>,
    /// `hls` selects the fallback worker variant.
    pub profile: Option<String>,
}

fn reject(err: AdmissionError) -> axum::response::Response {
    tracing::debug!(reason = err.reason(), "viewer rejected");
    axum::http::Response::builder()
        .status(err.http_status())
        .body(axum::body::Body::from(err.reason()))
        .unwrap_or_default()
        .into_response()
}

/// `GET /webrtc?token=…[&profile=hls]` — viewer admission and upgrade.
pub async fn viewer_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ViewerQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let claims = match admission::admit(&state, query.token.as_deref()).await {
        Ok(claims) => claims,
        Err(err) => return reject(err),
    };

    let source = match state.sources.get(&claims.camera_id).await {
        Some(source) => source,
        None => return reject(AdmissionError::UnknownCamera),
    };

    let profile = match query.profile.as_deref() {
        Some("hls") => StreamProfile::Hls,
        _ => StreamProfile::LowLatency,
    };

    let spec = WorkerSpec::from_config(&state.config, &source, profile);
    let worker = state.workers.acquire(spec, &state.shutdown).await;

    let Some((viewer_id, frames)) = worker.viewers.add().await else {
        return reject(AdmissionError::ViewerLimit);
    };

    tracing::info!(
        camera_id = %claims.camera_id,
        monitor_id = %claims.monitor_id,
        viewer_id,
        profile = profile.label(),
        "viewer admitted"
    );

    ws.on_upgrade(move |socket| handle_viewer(socket, worker, viewer_id, frames))
        .into_response()
}

/// Forward worker frames to one viewer until either side goes away.
/// The frame queue closing means the worker stopped or permanently
/// failed (or this viewer was dropped for falling behind).
async fn handle_viewer(
    socket: WebSocket,
    worker: Arc<StreamWorker>,
    viewer_id: ViewerId,
    mut frames: mpsc::Receiver<Bytes>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            frame = frames.recv() => {
                match frame {
                    Some(frame) => {
                        if ws_tx.send(Message::Binary(frame)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {} // viewers have nothing to say
                }
            }
        }
    }

    worker.viewers.remove(viewer_id).await;
    tracing::debug!(camera_id = %worker.camera_id, viewer_id, "viewer disconnected");
}
