// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway-local camera table: camera id -> RTSP source URL.
//!
//! The raw URL exists only to launch workers. Every outward projection
//! and log line carries the credential-masked form.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::worker::ffmpeg::mask_credentials;

/// A registered RTSP source.
#[derive(Debug, Clone)]
pub struct CameraSource {
    pub camera_id: String,
    pub rtsp_url: String,
}

/// Registration request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub camera_id: String,
    pub rtsp_url: String,
}

/// Outward projection with the masked URL only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub camera_id: String,
    pub rtsp_url: String,
}

impl From<&CameraSource> for SourceInfo {
    fn from(s: &CameraSource) -> Self {
        Self { camera_id: s.camera_id.clone(), rtsp_url: mask_credentials(&s.rtsp_url) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceError {
    InvalidCameraId,
    InvalidRtspUrl,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::InvalidCameraId => "camera id must be non-empty",
            Self::InvalidRtspUrl => "rtspUrl must start with rtsp://",
        };
        f.write_str(msg)
    }
}

/// Shared source table.
#[derive(Default)]
pub struct SourceTable {
    sources: RwLock<HashMap<String, CameraSource>>,
}

impl SourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a source. Re-registration updates the URL.
    pub async fn register(&self, config: SourceConfig) -> Result<SourceInfo, SourceError> {
        if config.camera_id.is_empty() {
            return Err(SourceError::InvalidCameraId);
        }
        if !config.rtsp_url.starts_with("rtsp://") {
            return Err(SourceError::InvalidRtspUrl);
        }

        let source = CameraSource { camera_id: config.camera_id.clone(), rtsp_url: config.rtsp_url };
        let info = SourceInfo::from(&source);
        self.sources.write().await.insert(config.camera_id, source);
        Ok(info)
    }

    pub async fn get(&self, camera_id: &str) -> Option<CameraSource> {
        self.sources.read().await.get(camera_id).cloned()
    }

    pub async fn list(&self) -> Vec<SourceInfo> {
        self.sources.read().await.values().map(SourceInfo::from).collect()
    }

    pub async fn count(&self) -> usize {
        self.sources.read().await.len()
    }
}

#[cfg(test)]
#[path = "sources_tests.rs"]
mod tests;
