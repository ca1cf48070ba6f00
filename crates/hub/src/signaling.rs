// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signaling command handlers.
//!
//! Every command runs the same validation ladder before touching state:
//! the session exists, the sender is a participant, the sender's role is
//! permitted, and the call-state guard holds. A violation answers with a
//! stable `error` code and changes nothing. Accepted commands refresh
//! session activity.

use std::sync::Arc;

use chrono::Utc;

use vigil_core::role::Role;

use crate::error::SignalCode;
use crate::presence::PeerEntry;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::session::{MediaKind, Session};
use crate::state::HubState;

/// Route one inbound client event. Called inline from the socket loop,
/// so per-connection ordering is arrival ordering.
pub async fn dispatch(state: &HubState, peer: &Arc<PeerEntry>, event: ClientEvent) {
    match event {
        ClientEvent::RegisterKiosk => on_register_kiosk(state, peer).await,
        ClientEvent::RegisterMonitor => on_register_monitor(state, peer).await,
        ClientEvent::GetOnlineKiosks => on_get_online_kiosks(state, peer).await,
        ClientEvent::StartMonitoring { kiosk_id } => {
            on_start_monitoring(state, peer, kiosk_id).await
        }
        ClientEvent::StopMonitoring { kiosk_id } => on_stop_monitoring(state, peer, kiosk_id).await,
        ClientEvent::CallRequest { kiosk_id } => on_call_request(state, peer, kiosk_id).await,
        ClientEvent::CallAccept { kiosk_id } => on_call_accept(state, peer, kiosk_id).await,
        ClientEvent::CallReject { kiosk_id } => on_call_reject(state, peer, kiosk_id).await,
        ClientEvent::CallEnd { kiosk_id } => on_call_end(state, peer, kiosk_id).await,
        ClientEvent::ToggleVideo { kiosk_id, enabled } => {
            on_toggle(state, peer, kiosk_id, MediaKind::Video, enabled).await
        }
        ClientEvent::ToggleAudio { kiosk_id, enabled } => {
            on_toggle(state, peer, kiosk_id, MediaKind::Audio, enabled).await
        }
        ClientEvent::Ping => {
            state.sessions.touch_participant(&peer.client_id, peer.role).await;
            peer.send(ServerEvent::Pong);
        }
    }
}

/// Participant check: the owning monitor connection, or the session's
/// own kiosk. Any other sender is rejected without state change.
fn check_participant(session: &Session, peer: &PeerEntry) -> Result<(), SignalCode> {
    match peer.role {
        Role::Monitor => {
            if session.monitor_conn == peer.conn {
                Ok(())
            } else {
                Err(SignalCode::NotOwner)
            }
        }
        Role::Kiosk => {
            if session.kiosk_id == peer.client_id {
                Ok(())
            } else {
                Err(SignalCode::InvalidTarget)
            }
        }
    }
}

/// Resolve the presence entry for the other side of a session.
async fn session_peer_of(
    state: &HubState,
    sender: &PeerEntry,
    kiosk_id: &str,
    monitor_id: &str,
) -> Option<Arc<PeerEntry>> {
    match sender.role {
        Role::Monitor => state.presence.kiosk(kiosk_id).await,
        Role::Kiosk => state.presence.monitor(monitor_id).await,
    }
}

// -- Registration -------------------------------------------------------------

async fn on_register_kiosk(state: &HubState, peer: &Arc<PeerEntry>) {
    if peer.role != Role::Kiosk {
        peer.send(ServerEvent::error(SignalCode::BadRole));
        return;
    }

    state.presence.register(Arc::clone(peer)).await;
    tracing::info!(kiosk_id = %peer.client_id, "kiosk registered");

    state.presence.publish(ServerEvent::KioskOnline {
        kiosk_id: peer.client_id.clone(),
        timestamp: Utc::now(),
    });
    peer.send(ServerEvent::KioskRegistered {
        kiosk_id: peer.client_id.clone(),
        timestamp: Utc::now(),
    });
}

async fn on_register_monitor(state: &HubState, peer: &Arc<PeerEntry>) {
    if peer.role != Role::Monitor {
        peer.send(ServerEvent::error(SignalCode::BadRole));
        return;
    }

    state.presence.register(Arc::clone(peer)).await;
    tracing::info!(monitor_id = %peer.client_id, "monitor registered");

    let online_kiosks = state.presence.online_kiosks().await;
    peer.send(ServerEvent::MonitorRegistered { online_kiosks });
}

async fn on_get_online_kiosks(state: &HubState, peer: &Arc<PeerEntry>) {
    let kiosks = state.presence.online_kiosks().await;
    let count = kiosks.len();
    peer.send(ServerEvent::OnlineKiosksList { kiosks, count, timestamp: Utc::now() });
}

// -- Session lifecycle --------------------------------------------------------

async fn on_start_monitoring(state: &HubState, peer: &Arc<PeerEntry>, kiosk_id: String) {
    if !peer.role.may_own_sessions() {
        peer.send(ServerEvent::error(SignalCode::BadRole));
        return;
    }
    if state.presence.kiosk(&kiosk_id).await.is_none() {
        peer.send(ServerEvent::error(SignalCode::KioskNotFound));
        return;
    }

    match state.sessions.start(&kiosk_id, &peer.client_id, peer.conn).await {
        Ok(()) => {
            tracing::info!(kiosk_id = %kiosk_id, monitor_id = %peer.client_id, "monitoring started");
            peer.send(ServerEvent::MonitoringStarted { kiosk_id });
        }
        Err(owner) => {
            tracing::debug!(
                kiosk_id = %kiosk_id,
                monitor_id = %peer.client_id,
                owner = %owner,
                "session conflict"
            );
            peer.send(ServerEvent::error(SignalCode::SessionConflict));
        }
    }
}

async fn on_stop_monitoring(state: &HubState, peer: &Arc<PeerEntry>, kiosk_id: String) {
    let removed = state
        .sessions
        .remove_checked(&kiosk_id, |session| {
            check_participant(session, peer)?;
            if peer.role != Role::Monitor {
                return Err(SignalCode::BadRole);
            }
            Ok(())
        })
        .await;

    match removed {
        Ok(session) => {
            tracing::info!(kiosk_id = %kiosk_id, monitor_id = %peer.client_id, "monitoring stopped");
            notify_session_ended(state, &session.into(), "stopped").await;
        }
        Err(code) => peer.send(ServerEvent::error(code)),
    }
}

/// Notify both sides that a session ended, preceded by `call-ended` when
/// a call was being set up or live.
pub(crate) async fn notify_session_ended(
    state: &HubState,
    ended: &crate::session::EndedSession,
    reason: &str,
) {
    if let Some(kiosk) = state.presence.kiosk(&ended.kiosk_id).await {
        if ended.call_was_live {
            kiosk.send(ServerEvent::CallEnded { from_id: ended.monitor_id.clone() });
        }
        kiosk.send(ServerEvent::MonitoringStopped {
            kiosk_id: ended.kiosk_id.clone(),
            reason: reason.to_owned(),
        });
    }
    if let Some(monitor) = state.presence.monitor(&ended.monitor_id).await {
        if ended.call_was_live {
            monitor.send(ServerEvent::CallEnded { from_id: ended.kiosk_id.clone() });
        }
        monitor.send(ServerEvent::MonitoringStopped {
            kiosk_id: ended.kiosk_id.clone(),
            reason: reason.to_owned(),
        });
    }
}

// -- Call state machine -------------------------------------------------------

async fn on_call_request(state: &HubState, peer: &Arc<PeerEntry>, kiosk_id: String) {
    let result = state
        .sessions
        .with_session(&kiosk_id, |session| {
            check_participant(session, peer)?;
            session.request_call(peer.role)?;
            session.touch();
            Ok(session.monitor_id.clone())
        })
        .await;

    match result {
        Ok(monitor_id) => {
            if let Some(other) = session_peer_of(state, peer, &kiosk_id, &monitor_id).await {
                other.send(ServerEvent::CallRequest { from_id: peer.client_id.clone() });
            }
            peer.send(ServerEvent::CallRequestSent { kiosk_id });
        }
        Err(code) => peer.send(ServerEvent::error(code)),
    }
}

async fn on_call_accept(state: &HubState, peer: &Arc<PeerEntry>, kiosk_id: String) {
    let result = state
        .sessions
        .with_session(&kiosk_id, |session| {
            check_participant(session, peer)?;
            session.accept_call(peer.role)?;
            session.touch();
            Ok(session.monitor_id.clone())
        })
        .await;

    match result {
        Ok(monitor_id) => {
            let accepted = ServerEvent::CallAccepted { from_id: peer.client_id.clone() };
            if let Some(other) = session_peer_of(state, peer, &kiosk_id, &monitor_id).await {
                other.send(accepted.clone());
            }
            peer.send(accepted);
            peer.send(ServerEvent::CallAcceptConfirmed { kiosk_id });
        }
        Err(code) => peer.send(ServerEvent::error(code)),
    }
}

async fn on_call_reject(state: &HubState, peer: &Arc<PeerEntry>, kiosk_id: String) {
    let result = state
        .sessions
        .with_session(&kiosk_id, |session| {
            check_participant(session, peer)?;
            session.reject_call(peer.role)?;
            session.touch();
            Ok(session.monitor_id.clone())
        })
        .await;

    match result {
        Ok(monitor_id) => {
            // The initiator is by construction the opposite side.
            if let Some(initiator) = session_peer_of(state, peer, &kiosk_id, &monitor_id).await {
                initiator.send(ServerEvent::CallRejected { from_id: peer.client_id.clone() });
            }
        }
        Err(code) => peer.send(ServerEvent::error(code)),
    }
}

async fn on_call_end(state: &HubState, peer: &Arc<PeerEntry>, kiosk_id: String) {
    let result = state
        .sessions
        .with_session(&kiosk_id, |session| {
            check_participant(session, peer)?;
            session.end_call()?;
            session.touch();
            Ok(session.monitor_id.clone())
        })
        .await;

    match result {
        Ok(monitor_id) => {
            let ended = ServerEvent::CallEnded { from_id: peer.client_id.clone() };
            if let Some(other) = session_peer_of(state, peer, &kiosk_id, &monitor_id).await {
                other.send(ended.clone());
            }
            peer.send(ended);
            peer.send(ServerEvent::CallEndConfirmed { kiosk_id });
        }
        Err(code) => peer.send(ServerEvent::error(code)),
    }
}

// -- Media control -------------------------------------------------------------

async fn on_toggle(
    state: &HubState,
    peer: &Arc<PeerEntry>,
    kiosk_id: String,
    kind: MediaKind,
    enabled: bool,
) {
    let result = state
        .sessions
        .with_session(&kiosk_id, |session| {
            check_participant(session, peer)?;
            session.toggle_media(peer.role, kind, enabled)?;
            session.touch();
            Ok(session.monitor_id.clone())
        })
        .await;

    match result {
        Ok(monitor_id) => {
            let from_id = peer.client_id.clone();
            let (confirmed, toggled) = match kind {
                MediaKind::Video => (
                    ServerEvent::VideoToggleConfirmed { enabled },
                    ServerEvent::VideoToggled { from_id, enabled },
                ),
                MediaKind::Audio => (
                    ServerEvent::AudioToggleConfirmed { enabled },
                    ServerEvent::AudioToggled { from_id, enabled },
                ),
            };
            peer.send(confirmed);
            if let Some(other) = session_peer_of(state, peer, &kiosk_id, &monitor_id).await {
                other.send(toggled);
            }
        }
        Err(code) => peer.send(ServerEvent::error(code)),
    }
}

// -- Disconnect ----------------------------------------------------------------

/// Run the disconnect transition for a closed connection: drop presence
/// (only if this connection is still the registered one), end affected
/// sessions, and notify the surviving side. A participant disconnect
/// during call setup or a live call behaves as `call-end` from that side.
pub async fn handle_disconnect(state: &HubState, peer: &Arc<PeerEntry>) {
    let was_current = state.presence.unregister(peer.role, &peer.client_id, peer.conn).await;

    match peer.role {
        Role::Monitor => {
            let ended = state.sessions.remove_owned_by_conn(peer.conn).await;
            for session in ended {
                tracing::info!(
                    kiosk_id = %session.kiosk_id,
                    monitor_id = %peer.client_id,
                    "session ended: monitor disconnected"
                );
                notify_session_ended(state, &session.into(), "monitor-disconnected").await;
            }
        }
        Role::Kiosk => {
            if !was_current {
                return;
            }
            if let Some(session) = state.sessions.remove(&peer.client_id).await {
                tracing::info!(
                    kiosk_id = %peer.client_id,
                    monitor_id = %session.monitor_id,
                    "session ended: kiosk disconnected"
                );
                notify_session_ended(state, &session.into(), "kiosk-disconnected").await;
            }
            state.presence.publish(ServerEvent::KioskOffline {
                kiosk_id: peer.client_id.clone(),
                timestamp: Utc::now(),
                reason: "disconnected".to_owned(),
            });
        }
    }
}

#[cfg(test)]
#[path = "signaling_tests.rs"]
mod tests;
