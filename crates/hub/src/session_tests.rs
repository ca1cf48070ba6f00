// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use vigil_core::role::Role;

use super::*;
use crate::error::SignalCode;
use crate::presence::ConnId;

fn session() -> Session {
    Session::new("K1", "M1", ConnId::new())
}

// ── call state machine ────────────────────────────────────────────────

#[test]
fn new_session_is_idle_with_media_defaults() {
    let s = session();
    assert!(s.call.is_idle());
    assert!(s.media.monitor.video_enabled);
    assert!(s.media.monitor.audio_enabled);
    assert!(s.media.kiosk.video_enabled);
    assert!(s.media.kiosk.audio_enabled);
}

#[test]
fn request_then_accept_connects() -> Result<(), SignalCode> {
    let mut s = session();
    s.request_call(Role::Monitor)?;
    assert_eq!(s.call.label(), "CONNECTING");

    s.accept_call(Role::Kiosk)?;
    assert!(s.call.is_connected());
    match s.call {
        CallState::Connected { initiated_by, .. } => assert_eq!(initiated_by, Role::Monitor),
        _ => unreachable!(),
    }
    Ok(())
}

#[test]
fn kiosk_may_initiate_symmetrically() -> Result<(), SignalCode> {
    let mut s = session();
    s.request_call(Role::Kiosk)?;
    s.accept_call(Role::Monitor)?;
    assert!(s.call.is_connected());
    Ok(())
}

#[test]
fn request_while_not_idle_is_invalid() {
    let mut s = session();
    s.request_call(Role::Monitor).ok();
    assert_eq!(s.request_call(Role::Kiosk), Err(SignalCode::InvalidCallState));

    s.accept_call(Role::Kiosk).ok();
    assert_eq!(s.request_call(Role::Monitor), Err(SignalCode::InvalidCallState));
}

#[test]
fn initiator_cannot_accept_its_own_call() {
    let mut s = session();
    s.request_call(Role::Monitor).ok();
    assert_eq!(s.accept_call(Role::Monitor), Err(SignalCode::InvalidCallState));
}

#[test]
fn accept_or_reject_while_idle_is_no_active_call() {
    let mut s = session();
    assert_eq!(s.accept_call(Role::Kiosk), Err(SignalCode::NoActiveCall));
    assert_eq!(s.reject_call(Role::Kiosk), Err(SignalCode::NoActiveCall));
    assert_eq!(s.end_call(), Err(SignalCode::NoActiveCall));
}

#[test]
fn reject_returns_to_idle_and_names_initiator() -> Result<(), SignalCode> {
    let mut s = session();
    s.request_call(Role::Monitor)?;
    let initiator = s.reject_call(Role::Kiosk)?;
    assert_eq!(initiator, Role::Monitor);
    assert!(s.call.is_idle());
    Ok(())
}

#[test]
fn end_works_from_connecting_and_connected() -> Result<(), SignalCode> {
    let mut s = session();
    s.request_call(Role::Monitor)?;
    s.end_call()?;
    assert!(s.call.is_idle());

    s.request_call(Role::Kiosk)?;
    s.accept_call(Role::Monitor)?;
    s.end_call()?;
    assert!(s.call.is_idle());
    Ok(())
}

#[test]
fn end_resets_call_scoped_media() -> Result<(), SignalCode> {
    let mut s = session();
    s.request_call(Role::Monitor)?;
    s.accept_call(Role::Kiosk)?;
    s.toggle_media(Role::Monitor, MediaKind::Video, false)?;
    assert!(!s.media.monitor.video_enabled);

    s.end_call()?;
    assert!(s.media.monitor.video_enabled);
    Ok(())
}

#[test]
fn toggles_only_while_connected() {
    let mut s = session();
    assert_eq!(
        s.toggle_media(Role::Monitor, MediaKind::Audio, false),
        Err(SignalCode::NoActiveCall)
    );

    s.request_call(Role::Monitor).ok();
    assert_eq!(
        s.toggle_media(Role::Monitor, MediaKind::Audio, false),
        Err(SignalCode::NoActiveCall)
    );
}

#[test]
fn toggle_is_idempotent() -> Result<(), SignalCode> {
    let mut s = session();
    s.request_call(Role::Monitor)?;
    s.accept_call(Role::Kiosk)?;

    s.toggle_media(Role::Monitor, MediaKind::Video, true)?;
    s.toggle_media(Role::Monitor, MediaKind::Video, true)?;
    assert!(s.media.monitor.video_enabled);

    s.toggle_media(Role::Kiosk, MediaKind::Audio, false)?;
    assert!(!s.media.kiosk.audio_enabled);
    // The other side is untouched.
    assert!(s.media.monitor.audio_enabled);
    Ok(())
}

// ── session store ─────────────────────────────────────────────────────

#[tokio::test]
async fn one_active_session_per_kiosk() {
    let store = SessionStore::new();
    store.start("K1", "M1", ConnId::new()).await.unwrap();

    let err = store.start("K1", "M2", ConnId::new()).await.unwrap_err();
    assert_eq!(err, "M1");
    assert_eq!(store.count().await, 1);

    let session = store.get("K1").await.unwrap();
    assert_eq!(session.monitor_id, "M1");
}

#[tokio::test]
async fn same_monitor_may_restart_monitoring() {
    let store = SessionStore::new();
    let old_conn = ConnId::new();
    let new_conn = ConnId::new();
    store.start("K1", "M1", old_conn).await.unwrap();
    store.start("K1", "M1", new_conn).await.unwrap();

    let session = store.get("K1").await.unwrap();
    assert_eq!(session.monitor_conn, new_conn);
    assert!(session.call.is_idle());
}

#[tokio::test]
async fn monitor_may_hold_one_session_per_kiosk() {
    let store = SessionStore::new();
    let conn = ConnId::new();
    store.start("K1", "M1", conn).await.unwrap();
    store.start("K2", "M1", conn).await.unwrap();
    assert_eq!(store.count().await, 2);

    let removed = store.remove_owned_by_conn(conn).await;
    assert_eq!(removed.len(), 2);
    assert_eq!(store.count().await, 0);
}

#[tokio::test]
async fn remove_owned_by_conn_spares_other_monitors() {
    let store = SessionStore::new();
    let conn_a = ConnId::new();
    let conn_b = ConnId::new();
    store.start("K1", "M1", conn_a).await.unwrap();
    store.start("K2", "M2", conn_b).await.unwrap();

    let removed = store.remove_owned_by_conn(conn_a).await;
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].kiosk_id, "K1");
    assert!(store.get("K2").await.is_some());
}

#[tokio::test]
async fn remove_checked_rejects_without_removing() {
    let store = SessionStore::new();
    store.start("K1", "M1", ConnId::new()).await.unwrap();

    let err = store
        .remove_checked("K1", |_| Err(SignalCode::NotOwner))
        .await
        .map(|_| ())
        .unwrap_err();
    assert_eq!(err, SignalCode::NotOwner);
    assert!(store.get("K1").await.is_some());
}

#[tokio::test]
async fn idle_sessions_are_reaped_and_touched_ones_survive() {
    let store = SessionStore::new();
    store.start("K1", "M1", ConnId::new()).await.unwrap();
    store.start("K2", "M1", ConnId::new()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    store.touch_participant("K2", Role::Kiosk).await;

    let removed = store.remove_idle(Duration::from_millis(10)).await;
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].kiosk_id, "K1");
    assert!(store.get("K2").await.is_some());
}

#[tokio::test]
async fn with_session_reports_missing_sessions() {
    let store = SessionStore::new();
    let err = store.with_session("nope", |_| Ok(())).await.unwrap_err();
    assert_eq!(err, SignalCode::NoSession);
}
