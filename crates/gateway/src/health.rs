// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic health reporter: posts per-camera stream status to the
//! control plane's health-callback endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::GatewayState;
use crate::worker::WorkerStatus;

/// One camera's status entry in a health batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEntry {
    pub camera_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct HealthBatch {
    entries: Vec<HealthEntry>,
}

/// Build the current batch: one entry per registered camera, preferring
/// the worst live worker state (ERROR over OFFLINE) and reporting ONLINE
/// whenever any worker variant is producing output.
pub async fn collect_entries(state: &GatewayState) -> Vec<HealthEntry> {
    let mut by_camera: HashMap<String, (&'static str, Option<String>)> = HashMap::new();

    for worker in state.workers.snapshot().await {
        let (status, message) = match worker.current_status().await {
            WorkerStatus::Running => ("ONLINE", None),
            WorkerStatus::Error => ("ERROR", worker.last_error().await),
            WorkerStatus::Starting | WorkerStatus::Stopping | WorkerStatus::Stopped => {
                ("OFFLINE", None)
            }
        };
        let entry = by_camera.entry(worker.camera_id.clone()).or_insert((status, message.clone()));
        // ONLINE wins over everything, ERROR over OFFLINE.
        let rank = |s: &str| match s {
            "ONLINE" => 2,
            "ERROR" => 1,
            _ => 0,
        };
        if rank(status) > rank(entry.0) {
            *entry = (status, message);
        }
    }

    let now = Utc::now();
    let mut entries = Vec::new();
    for source in state.sources.list().await {
        let (status, message) = by_camera
            .remove(&source.camera_id)
            .unwrap_or(("OFFLINE", Some("no active stream".to_owned())));
        entries.push(HealthEntry { camera_id: source.camera_id, status, message, last_seen: now });
    }
    entries
}

/// Spawn the reporter loop. Failures are logged and retried on the next
/// tick; the task never takes the process down.
pub fn spawn_health_reporter(state: Arc<GatewayState>) {
    let Some(url) = state.config.health_callback_url.clone() else {
        tracing::info!("HEALTH_CALLBACK_URL not set; health reporting disabled");
        return;
    };
    let interval = state.config.health_check_interval();

    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = state.shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            let entries = collect_entries(&state).await;
            if entries.is_empty() {
                continue;
            }

            let mut request = client.post(&url).json(&HealthBatch { entries });
            if let Some(secret) = state.config.gateway_secret.as_deref() {
                request = request.header("X-Gateway-Secret", secret);
            }

            match request.send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!("health report delivered");
                }
                Ok(resp) => {
                    tracing::warn!(status = %resp.status(), "health callback rejected");
                }
                Err(e) => {
                    tracing::warn!(err = %e, "health callback failed");
                }
            }
        }
    });
}
