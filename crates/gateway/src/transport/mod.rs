// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport for the stream gateway.

pub mod auth;
pub mod http;
pub mod ws;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::GatewayState;

/// Build the axum `Router` with all gateway routes.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        // Status
        .route("/health", get(http::health))
        // Token probe
        .route("/validate-token", post(http::validate_token))
        // Camera table
        .route("/register-camera", post(http::register_camera))
        .route("/cameras", get(http::list_cameras))
        // Viewer plane
        .route("/webrtc", get(ws::viewer_handler))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
