// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signaling wire protocol: the closed set of client and server events.
//!
//! Every frame is a JSON object tagged by `type` (kebab-case), with
//! camelCase fields. Unknown fields on known events are ignored; unknown
//! event types fail to parse and are answered with an `error` event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SignalCode;

/// A kiosk visible in the presence map, as projected to monitors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KioskPresence {
    pub kiosk_id: String,
    pub connected_at: DateTime<Utc>,
}

/// Client->server events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    RegisterKiosk,
    RegisterMonitor,
    GetOnlineKiosks,
    StartMonitoring { kiosk_id: String },
    StopMonitoring { kiosk_id: String },
    CallRequest { kiosk_id: String },
    CallAccept { kiosk_id: String },
    CallReject { kiosk_id: String },
    CallEnd { kiosk_id: String },
    ToggleVideo { kiosk_id: String, enabled: bool },
    ToggleAudio { kiosk_id: String, enabled: bool },
    Ping,
}

/// Server->client events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    KioskRegistered { kiosk_id: String, timestamp: DateTime<Utc> },
    MonitorRegistered { online_kiosks: Vec<KioskPresence> },
    OnlineKiosksList { kiosks: Vec<KioskPresence>, count: usize, timestamp: DateTime<Utc> },
    KioskOnline { kiosk_id: String, timestamp: DateTime<Utc> },
    KioskOffline { kiosk_id: String, timestamp: DateTime<Utc>, reason: String },
    MonitoringStarted { kiosk_id: String },
    MonitoringStopped { kiosk_id: String, reason: String },
    CallRequest { from_id: String },
    CallRequestSent { kiosk_id: String },
    CallAccepted { from_id: String },
    CallAcceptConfirmed { kiosk_id: String },
    CallRejected { from_id: String },
    CallEnded { from_id: String },
    CallEndConfirmed { kiosk_id: String },
    VideoToggled { from_id: String, enabled: bool },
    VideoToggleConfirmed { enabled: bool },
    AudioToggled { from_id: String, enabled: bool },
    AudioToggleConfirmed { enabled: bool },
    Error { code: String, message: String },
    Pong,
}

impl ServerEvent {
    /// Build an `error` event from a stable signaling code.
    pub fn error(code: SignalCode) -> Self {
        Self::Error { code: code.as_str().to_owned(), message: code.message().to_owned() }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
