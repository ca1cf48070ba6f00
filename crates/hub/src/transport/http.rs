// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-backend HTTP handlers: camera registry, stream-token minting,
//! and the gateway health-callback sink.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vigil_core::token::StreamClaims;

use crate::error::ApiError;
use crate::registry::{CameraConfig, CameraStatus, RegistryError};
use crate::state::HubState;
use crate::transport::auth;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub kiosks: usize,
    pub monitors: usize,
    pub sessions: usize,
    pub cameras: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamTokenRequest {
    pub camera_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub camera_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamHealthEntry {
    pub camera_id: String,
    pub status: CameraStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCallbackRequest {
    pub entries: Vec<StreamHealthEntry>,
}

#[derive(Debug, Serialize)]
pub struct HealthCallbackResponse {
    pub updated: usize,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub camera_id: String,
    pub removed: bool,
}

fn registry_error(err: RegistryError) -> (StatusCode, Json<crate::error::ErrorResponse>) {
    let api = match err {
        RegistryError::NotFound => ApiError::NotFound,
        RegistryError::Disabled => ApiError::Forbidden,
        _ => ApiError::BadRequest,
    };
    api.to_http_response(err.to_string())
}

// -- Handlers -----------------------------------------------------------------

/// `GET /health`
pub async fn health(State(s): State<Arc<HubState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "running".to_owned(),
        kiosks: s.presence.kiosk_count().await,
        monitors: s.presence.monitor_count().await,
        sessions: s.sessions.count().await,
        cameras: s.registry.count().await,
    })
}

/// `GET /api/cctv/cameras[?enabled=true]` — list camera projections.
pub async fn list_cameras(
    State(s): State<Arc<HubState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    if let Err(e) = auth::require_monitor(&s, &headers) {
        return e.to_http_response("monitor role required").into_response();
    }
    let cameras = s.registry.list(query.enabled.unwrap_or(false)).await;
    Json(cameras).into_response()
}

/// `GET /api/cctv/cameras/{id}` — one camera projection.
pub async fn get_camera(
    State(s): State<Arc<HubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if let Err(e) = auth::require_monitor(&s, &headers) {
        return e.to_http_response("monitor role required").into_response();
    }
    match s.registry.get(&id).await {
        Some(info) => Json(info).into_response(),
        None => ApiError::NotFound.to_http_response("camera not found").into_response(),
    }
}

/// `POST /api/cctv/cameras` — register a camera.
pub async fn register_camera(
    State(s): State<Arc<HubState>>,
    headers: HeaderMap,
    Json(config): Json<CameraConfig>,
) -> impl IntoResponse {
    if let Err(e) = auth::require_monitor(&s, &headers) {
        return e.to_http_response("monitor role required").into_response();
    }
    match s.registry.register(config).await {
        Ok(info) => {
            tracing::info!(camera_id = %info.camera_id, "camera registered");
            (StatusCode::CREATED, Json(info)).into_response()
        }
        Err(err) => registry_error(err).into_response(),
    }
}

/// `DELETE /api/cctv/cameras/{id}` — deregister a camera.
pub async fn remove_camera(
    State(s): State<Arc<HubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if let Err(e) = auth::require_monitor(&s, &headers) {
        return e.to_http_response("monitor role required").into_response();
    }
    match s.registry.remove(&id).await {
        Some(info) => {
            tracing::info!(camera_id = %info.camera_id, "camera removed");
            Json(RemoveResponse { camera_id: id, removed: true }).into_response()
        }
        None => ApiError::NotFound.to_http_response("camera not found").into_response(),
    }
}

/// `POST /api/cctv/stream-token` — mint a single-use viewing token.
pub async fn stream_token(
    State(s): State<Arc<HubState>>,
    headers: HeaderMap,
    Json(req): Json<StreamTokenRequest>,
) -> impl IntoResponse {
    let claims = match auth::require_monitor(&s, &headers) {
        Ok(claims) => claims,
        Err(e) => return e.to_http_response("monitor role required").into_response(),
    };
    if let Err(err) = s.registry.check_streamable(&req.camera_id).await {
        return registry_error(err).into_response();
    }

    let stream_claims =
        StreamClaims::issue(&req.camera_id, &claims.client_id, s.config.stream_token_ttl());
    let token = s.signer.sign_stream(&stream_claims);

    // Audit trail for every issued capability.
    tracing::info!(
        camera_id = %req.camera_id,
        monitor_id = %claims.client_id,
        expires_at = %stream_claims.expires_at,
        "stream token issued"
    );

    Json(StreamTokenResponse {
        token,
        expires_at: stream_claims.expires_at,
        camera_id: req.camera_id,
    })
    .into_response()
}

/// `POST /api/cctv/health-callback` — status batch from the gateway.
pub async fn health_callback(
    State(s): State<Arc<HubState>>,
    headers: HeaderMap,
    Json(req): Json<HealthCallbackRequest>,
) -> impl IntoResponse {
    if let Err(e) = auth::check_gateway_secret(&s, &headers) {
        return e.to_http_response("bad gateway secret").into_response();
    }

    let mut updated = 0;
    for entry in &req.entries {
        match s.registry.update_status(&entry.camera_id, entry.status).await {
            Ok(()) => updated += 1,
            Err(_) => {
                tracing::debug!(camera_id = %entry.camera_id, "health report for unknown camera");
            }
        }
    }
    Json(HealthCallbackResponse { updated }).into_response()
}
