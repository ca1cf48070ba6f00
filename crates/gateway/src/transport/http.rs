// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway HTTP handlers: status snapshot, token probe, camera table.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::admission;
use crate::error::GatewayError;
use crate::sources::SourceConfig;
use crate::state::GatewayState;
use crate::transport::auth;
use crate::worker::WorkerSnapshot;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub cameras: usize,
    pub replay_entries: usize,
    pub workers: Vec<WorkerSnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTokenResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /health` — gateway status snapshot.
pub async fn health(State(s): State<Arc<GatewayState>>) -> impl IntoResponse {
    let mut workers = Vec::new();
    for worker in s.workers.snapshot().await {
        workers.push(worker.snapshot().await);
    }

    Json(HealthResponse {
        status: "running".to_owned(),
        cameras: s.sources.count().await,
        replay_entries: s.replay.len().await,
        workers,
    })
}

/// `POST /validate-token` — non-consuming admission probe.
pub async fn validate_token(
    State(s): State<Arc<GatewayState>>,
    Json(req): Json<ValidateTokenRequest>,
) -> impl IntoResponse {
    match admission::probe(&s, Some(&req.token)).await {
        Ok(claims) => Json(ValidateTokenResponse {
            valid: true,
            camera_id: Some(claims.camera_id),
            expires_at: Some(claims.expires_at),
            reason: None,
        }),
        Err(err) => Json(ValidateTokenResponse {
            valid: false,
            camera_id: None,
            expires_at: None,
            reason: Some(err.reason()),
        }),
    }
}

/// `POST /register-camera` — add or update an RTSP source.
pub async fn register_camera(
    State(s): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(config): Json<SourceConfig>,
) -> impl IntoResponse {
    if let Err(e) = auth::check_gateway_secret(&s, &headers) {
        return e.to_http_response("bad gateway secret").into_response();
    }

    match s.sources.register(config).await {
        Ok(info) => {
            tracing::info!(camera_id = %info.camera_id, url = %info.rtsp_url, "camera source registered");
            (StatusCode::CREATED, Json(info)).into_response()
        }
        Err(err) => GatewayError::BadRequest.to_http_response(err.to_string()).into_response(),
    }
}

/// `GET /cameras` — registered sources with masked URLs.
pub async fn list_cameras(State(s): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(s.sources.list().await)
}
