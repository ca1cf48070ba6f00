// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Camera registry and stream-token issuance.
//!
//! The RTSP URL is write-only: it enters through registration and is
//! never part of an outward projection. `CameraInfo` simply has no field
//! for it, so it cannot serialize.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Reported camera status, updated through the health-callback sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CameraStatus {
    Online,
    Offline,
    Error,
}

/// Full camera record. Held only inside the registry.
#[derive(Debug, Clone)]
pub struct Camera {
    pub camera_id: String,
    pub rtsp_url: String,
    pub location: String,
    pub enabled: bool,
    pub registered_at: DateTime<Utc>,
    pub status: CameraStatus,
    pub last_status_update: DateTime<Utc>,
}

/// Outward projection of a camera. Never carries the RTSP URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    pub camera_id: String,
    pub location: String,
    pub enabled: bool,
    pub registered_at: DateTime<Utc>,
    pub status: CameraStatus,
    pub last_status_update: DateTime<Utc>,
}

impl From<&Camera> for CameraInfo {
    fn from(c: &Camera) -> Self {
        Self {
            camera_id: c.camera_id.clone(),
            location: c.location.clone(),
            enabled: c.enabled,
            registered_at: c.registered_at,
            status: c.status,
            last_status_update: c.last_status_update,
        }
    }
}

/// Registration request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConfig {
    pub camera_id: String,
    pub rtsp_url: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    InvalidCameraId,
    InvalidRtspUrl,
    DuplicateCamera,
    NotFound,
    Disabled,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidCameraId => "camera id must be 1-64 chars of [A-Za-z0-9_-]",
            Self::InvalidRtspUrl => "rtspUrl must start with rtsp://",
            Self::DuplicateCamera => "camera already registered",
            Self::NotFound => "camera not found",
            Self::Disabled => "camera is disabled",
        };
        f.write_str(msg)
    }
}

fn valid_camera_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Shared camera table.
#[derive(Default)]
pub struct CameraRegistry {
    cameras: RwLock<HashMap<String, Camera>>,
}

impl CameraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, config: CameraConfig) -> Result<CameraInfo, RegistryError> {
        if !valid_camera_id(&config.camera_id) {
            return Err(RegistryError::InvalidCameraId);
        }
        if !config.rtsp_url.starts_with("rtsp://") {
            return Err(RegistryError::InvalidRtspUrl);
        }

        let mut cameras = self.cameras.write().await;
        if cameras.contains_key(&config.camera_id) {
            return Err(RegistryError::DuplicateCamera);
        }

        let now = Utc::now();
        let camera = Camera {
            camera_id: config.camera_id.clone(),
            rtsp_url: config.rtsp_url,
            location: config.location,
            enabled: config.enabled.unwrap_or(true),
            registered_at: now,
            status: CameraStatus::Offline,
            last_status_update: now,
        };
        let info = CameraInfo::from(&camera);
        cameras.insert(config.camera_id, camera);
        Ok(info)
    }

    pub async fn get(&self, camera_id: &str) -> Option<CameraInfo> {
        self.cameras.read().await.get(camera_id).map(CameraInfo::from)
    }

    pub async fn list(&self, enabled_only: bool) -> Vec<CameraInfo> {
        self.cameras
            .read()
            .await
            .values()
            .filter(|c| !enabled_only || c.enabled)
            .map(CameraInfo::from)
            .collect()
    }

    pub async fn remove(&self, camera_id: &str) -> Option<CameraInfo> {
        self.cameras.write().await.remove(camera_id).map(|c| CameraInfo::from(&c))
    }

    /// Check a camera may be streamed from (present and enabled).
    pub async fn check_streamable(&self, camera_id: &str) -> Result<(), RegistryError> {
        let cameras = self.cameras.read().await;
        let camera = cameras.get(camera_id).ok_or(RegistryError::NotFound)?;
        if !camera.enabled {
            return Err(RegistryError::Disabled);
        }
        Ok(())
    }

    /// Apply a status report from the health-callback sink.
    pub async fn update_status(
        &self,
        camera_id: &str,
        status: CameraStatus,
    ) -> Result<(), RegistryError> {
        let mut cameras = self.cameras.write().await;
        let camera = cameras.get_mut(camera_id).ok_or(RegistryError::NotFound)?;
        camera.status = status;
        camera.last_status_update = Utc::now();
        Ok(())
    }

    pub async fn count(&self) -> usize {
        self.cameras.read().await.len()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
