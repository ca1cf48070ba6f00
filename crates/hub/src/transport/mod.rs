// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport for the signaling hub and control backend.

pub mod auth;
pub mod http;
pub mod ws;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::HubState;

/// Build the axum `Router` with all hub routes.
pub fn build_router(state: Arc<HubState>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/health", get(http::health))
        // Signaling plane
        .route("/ws", get(ws::ws_handler))
        // Camera registry (monitor bearer auth per handler)
        .route("/api/cctv/cameras", get(http::list_cameras).post(http::register_camera))
        .route("/api/cctv/cameras/{id}", get(http::get_camera).delete(http::remove_camera))
        // Stream tokens
        .route("/api/cctv/stream-token", post(http::stream_token))
        // Gateway health ingest
        .route("/api/cctv/health-callback", post(http::health_callback))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
