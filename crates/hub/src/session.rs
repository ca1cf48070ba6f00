// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session store and the per-session call state machine.
//!
//! A session is the monitoring relationship between one monitor and one
//! kiosk, keyed by kiosk id: a kiosk is watched by at most one monitor
//! at a time. Ended sessions are removed from the store, so presence in
//! the map means ACTIVE.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use vigil_core::role::Role;

use crate::error::SignalCode;
use crate::presence::ConnId;

/// Call sub-state of a session. Call metadata lives inside the variants:
/// an initiator only exists while a call is being set up or live, and a
/// start timestamp only exists once the call is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Connecting { initiated_by: Role },
    Connected { initiated_by: Role, started_at: DateTime<Utc> },
}

impl CallState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Connecting { .. } => "CONNECTING",
            Self::Connected { .. } => "CONNECTED",
        }
    }
}

/// Per-side media enablement, toggled only while a call is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaFlags {
    pub video_enabled: bool,
    pub audio_enabled: bool,
}

impl Default for MediaFlags {
    fn default() -> Self {
        Self { video_enabled: true, audio_enabled: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaState {
    pub monitor: MediaFlags,
    pub kiosk: MediaFlags,
}

impl MediaState {
    pub fn side_mut(&mut self, role: Role) -> &mut MediaFlags {
        match role {
            Role::Monitor => &mut self.monitor,
            Role::Kiosk => &mut self.kiosk,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

/// An active monitoring session.
#[derive(Debug, Clone)]
pub struct Session {
    pub kiosk_id: String,
    pub monitor_id: String,
    pub monitor_conn: ConnId,
    pub started_at: DateTime<Utc>,
    pub last_activity: Instant,
    pub call: CallState,
    pub media: MediaState,
}

impl Session {
    pub fn new(kiosk_id: &str, monitor_id: &str, monitor_conn: ConnId) -> Self {
        Self {
            kiosk_id: kiosk_id.to_owned(),
            monitor_id: monitor_id.to_owned(),
            monitor_conn,
            started_at: Utc::now(),
            last_activity: Instant::now(),
            call: CallState::Idle,
            media: MediaState::default(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// IDLE -> CONNECTING. Either side may initiate.
    pub fn request_call(&mut self, from: Role) -> Result<(), SignalCode> {
        match self.call {
            CallState::Idle => {
                self.call = CallState::Connecting { initiated_by: from };
                Ok(())
            }
            _ => Err(SignalCode::InvalidCallState),
        }
    }

    /// CONNECTING -> CONNECTED, only from the side opposite the initiator.
    pub fn accept_call(&mut self, from: Role) -> Result<(), SignalCode> {
        match self.call {
            CallState::Connecting { initiated_by } if initiated_by != from => {
                self.call = CallState::Connected { initiated_by, started_at: Utc::now() };
                Ok(())
            }
            CallState::Connecting { .. } => Err(SignalCode::InvalidCallState),
            CallState::Idle => Err(SignalCode::NoActiveCall),
            CallState::Connected { .. } => Err(SignalCode::InvalidCallState),
        }
    }

    /// CONNECTING -> IDLE, only from the side opposite the initiator.
    pub fn reject_call(&mut self, from: Role) -> Result<Role, SignalCode> {
        match self.call {
            CallState::Connecting { initiated_by } if initiated_by != from => {
                self.call = CallState::Idle;
                Ok(initiated_by)
            }
            CallState::Connecting { .. } => Err(SignalCode::InvalidCallState),
            CallState::Idle => Err(SignalCode::NoActiveCall),
            CallState::Connected { .. } => Err(SignalCode::InvalidCallState),
        }
    }

    /// CONNECTING | CONNECTED -> IDLE, from either side. Call-scoped
    /// fields (initiator, start time, media toggles) are reset.
    pub fn end_call(&mut self) -> Result<(), SignalCode> {
        match self.call {
            CallState::Connecting { .. } | CallState::Connected { .. } => {
                self.call = CallState::Idle;
                self.media = MediaState::default();
                Ok(())
            }
            CallState::Idle => Err(SignalCode::NoActiveCall),
        }
    }

    /// Update one side's media flag. Only valid while CONNECTED.
    /// Idempotent: repeating a value is accepted and re-confirmed.
    pub fn toggle_media(
        &mut self,
        from: Role,
        kind: MediaKind,
        enabled: bool,
    ) -> Result<(), SignalCode> {
        if !self.call.is_connected() {
            return Err(SignalCode::NoActiveCall);
        }
        let flags = self.media.side_mut(from);
        match kind {
            MediaKind::Video => flags.video_enabled = enabled,
            MediaKind::Audio => flags.audio_enabled = enabled,
        }
        Ok(())
    }
}

/// Outcome of removing a session, for notification purposes.
#[derive(Debug, Clone)]
pub struct EndedSession {
    pub kiosk_id: String,
    pub monitor_id: String,
    pub call_was_live: bool,
}

impl From<Session> for EndedSession {
    fn from(s: Session) -> Self {
        let call_was_live = !s.call.is_idle();
        Self { kiosk_id: s.kiosk_id, monitor_id: s.monitor_id, call_was_live }
    }
}

/// Shared session store, keyed by kiosk id.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for `kiosk_id` owned by `monitor_id`.
    ///
    /// Fails with the owning monitor's id when another monitor already
    /// holds the kiosk. Re-starting by the same monitor refreshes the
    /// session (new connection handle, call state reset).
    pub async fn start(
        &self,
        kiosk_id: &str,
        monitor_id: &str,
        monitor_conn: ConnId,
    ) -> Result<(), String> {
        let mut sessions = self.inner.write().await;
        if let Some(existing) = sessions.get(kiosk_id) {
            if existing.monitor_id != monitor_id {
                return Err(existing.monitor_id.clone());
            }
        }
        sessions.insert(kiosk_id.to_owned(), Session::new(kiosk_id, monitor_id, monitor_conn));
        Ok(())
    }

    pub async fn remove(&self, kiosk_id: &str) -> Option<Session> {
        self.inner.write().await.remove(kiosk_id)
    }

    /// Remove a session after a validation closure approves it. Check and
    /// removal happen under one write-lock acquisition.
    pub async fn remove_checked(
        &self,
        kiosk_id: &str,
        f: impl FnOnce(&Session) -> Result<(), SignalCode>,
    ) -> Result<Session, SignalCode> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get(kiosk_id).ok_or(SignalCode::NoSession)?;
        f(session)?;
        sessions.remove(kiosk_id).ok_or(SignalCode::NoSession)
    }

    /// Remove every session owned by the given monitor connection.
    pub async fn remove_owned_by_conn(&self, conn: ConnId) -> Vec<Session> {
        let mut sessions = self.inner.write().await;
        let keys: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.monitor_conn == conn)
            .map(|(k, _)| k.clone())
            .collect();
        keys.iter().filter_map(|k| sessions.remove(k)).collect()
    }

    /// Run a serialized read-modify-write against one session. The write
    /// lock is held for the whole closure, so per-session transitions
    /// never interleave.
    pub async fn with_session<T>(
        &self,
        kiosk_id: &str,
        f: impl FnOnce(&mut Session) -> Result<T, SignalCode>,
    ) -> Result<T, SignalCode> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(kiosk_id).ok_or(SignalCode::NoSession)?;
        f(session)
    }

    /// Refresh activity on every session this client participates in.
    pub async fn touch_participant(&self, client_id: &str, role: Role) {
        let mut sessions = self.inner.write().await;
        for session in sessions.values_mut() {
            let participates = match role {
                Role::Monitor => session.monitor_id == client_id,
                Role::Kiosk => session.kiosk_id == client_id,
            };
            if participates {
                session.touch();
            }
        }
    }

    /// Remove and return sessions idle for longer than `timeout`.
    pub async fn remove_idle(&self, timeout: Duration) -> Vec<Session> {
        let mut sessions = self.inner.write().await;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.last_activity.elapsed() > timeout)
            .map(|(k, _)| k.clone())
            .collect();
        expired.iter().filter_map(|k| sessions.remove(k)).collect()
    }

    pub async fn get(&self, kiosk_id: &str) -> Option<Session> {
        self.inner.read().await.get(kiosk_id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
