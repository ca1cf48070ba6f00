// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end signaling tests over a real listener.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use vigil_core::role::Role;
use vigil_core::token::IdentityClaims;
use vigil_hub::config::HubConfig;
use vigil_hub::protocol::{ClientEvent, ServerEvent};
use vigil_hub::state::HubState;
use vigil_hub::transport::build_router;

type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn test_config() -> HubConfig {
    HubConfig {
        host: "127.0.0.1".into(),
        port: 0,
        signing_key: Some("e2e-key".into()),
        session_timeout_ms: 300_000,
        stream_token_ttl_secs: 60,
        gateway_secret: None,
    }
}

async fn spawn_hub() -> (String, Arc<HubState>) {
    let state =
        Arc::new(HubState::new(test_config(), CancellationToken::new()).expect("state"));
    let router = build_router(Arc::clone(&state));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    (format!("ws://{addr}/ws"), state)
}

async fn connect(base: &str, state: &HubState, client_id: &str, role: Role) -> WsClient {
    let token = state.signer.sign_identity(&IdentityClaims::new(client_id, role));
    let (socket, _) = tokio_tungstenite::connect_async(format!("{base}?token={token}"))
        .await
        .expect("ws connect");
    socket
}

async fn send(socket: &mut WsClient, event: &ClientEvent) {
    let json = serde_json::to_string(event).expect("serialize");
    socket.send(Message::Text(json.into())).await.expect("send");
}

/// Read server events until one matches, failing after a timeout.
async fn expect_event(
    socket: &mut WsClient,
    want: impl Fn(&ServerEvent) -> bool,
) -> ServerEvent {
    let deadline = Duration::from_secs(5);
    loop {
        let msg = tokio::time::timeout(deadline, socket.next())
            .await
            .expect("timed out waiting for event")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = msg {
            let event: ServerEvent = serde_json::from_str(text.as_str()).expect("parse");
            if want(&event) {
                return event;
            }
        }
    }
}

#[tokio::test]
async fn unauthenticated_upgrade_is_refused() {
    let (base, _state) = spawn_hub().await;

    let err = tokio_tungstenite::connect_async(base).await;
    assert!(err.is_err(), "upgrade without token must fail");
}

#[tokio::test]
async fn bad_token_upgrade_is_refused() {
    let (base, _state) = spawn_hub().await;

    let err = tokio_tungstenite::connect_async(format!("{base}?token=forged.token")).await;
    assert!(err.is_err(), "upgrade with a forged token must fail");
}

#[tokio::test]
async fn full_call_round_trip_over_the_wire() {
    let (base, state) = spawn_hub().await;

    let mut kiosk = connect(&base, &state, "K1", Role::Kiosk).await;
    send(&mut kiosk, &ClientEvent::RegisterKiosk).await;
    expect_event(&mut kiosk, |e| matches!(e, ServerEvent::KioskRegistered { .. })).await;

    let mut monitor = connect(&base, &state, "M1", Role::Monitor).await;
    send(&mut monitor, &ClientEvent::RegisterMonitor).await;
    let registered =
        expect_event(&mut monitor, |e| matches!(e, ServerEvent::MonitorRegistered { .. })).await;
    match registered {
        ServerEvent::MonitorRegistered { online_kiosks } => {
            assert_eq!(online_kiosks.len(), 1);
            assert_eq!(online_kiosks[0].kiosk_id, "K1");
        }
        _ => unreachable!(),
    }

    send(&mut monitor, &ClientEvent::StartMonitoring { kiosk_id: "K1".into() }).await;
    expect_event(&mut monitor, |e| matches!(e, ServerEvent::MonitoringStarted { .. })).await;

    // Ring, accept, toggle, hang up.
    send(&mut monitor, &ClientEvent::CallRequest { kiosk_id: "K1".into() }).await;
    expect_event(&mut kiosk, |e| {
        matches!(e, ServerEvent::CallRequest { from_id } if from_id == "M1")
    })
    .await;

    send(&mut kiosk, &ClientEvent::CallAccept { kiosk_id: "K1".into() }).await;
    expect_event(&mut monitor, |e| {
        matches!(e, ServerEvent::CallAccepted { from_id } if from_id == "K1")
    })
    .await;

    send(&mut monitor, &ClientEvent::ToggleVideo { kiosk_id: "K1".into(), enabled: false })
        .await;
    expect_event(&mut kiosk, |e| {
        matches!(e, ServerEvent::VideoToggled { enabled: false, .. })
    })
    .await;

    send(&mut monitor, &ClientEvent::CallEnd { kiosk_id: "K1".into() }).await;
    expect_event(&mut kiosk, |e| matches!(e, ServerEvent::CallEnded { .. })).await;

    // Session survives the call in IDLE.
    let session = state.sessions.get("K1").await.expect("session still active");
    assert!(session.call.is_idle());
}

#[tokio::test]
async fn kiosk_drop_reaches_monitors_as_offline() {
    let (base, state) = spawn_hub().await;

    let mut kiosk = connect(&base, &state, "K1", Role::Kiosk).await;
    send(&mut kiosk, &ClientEvent::RegisterKiosk).await;
    expect_event(&mut kiosk, |e| matches!(e, ServerEvent::KioskRegistered { .. })).await;

    let mut monitor = connect(&base, &state, "M1", Role::Monitor).await;
    send(&mut monitor, &ClientEvent::RegisterMonitor).await;
    expect_event(&mut monitor, |e| matches!(e, ServerEvent::MonitorRegistered { .. })).await;

    send(&mut monitor, &ClientEvent::StartMonitoring { kiosk_id: "K1".into() }).await;
    expect_event(&mut monitor, |e| matches!(e, ServerEvent::MonitoringStarted { .. })).await;

    drop(kiosk);

    // The session-end notification and the presence broadcast travel
    // different channels, so their relative order is not fixed.
    let mut saw_stopped = false;
    let mut saw_offline = false;
    while !(saw_stopped && saw_offline) {
        match expect_event(&mut monitor, |e| {
            matches!(e, ServerEvent::MonitoringStopped { .. } | ServerEvent::KioskOffline { .. })
        })
        .await
        {
            ServerEvent::MonitoringStopped { reason, .. } => {
                assert_eq!(reason, "kiosk-disconnected");
                saw_stopped = true;
            }
            ServerEvent::KioskOffline { kiosk_id, .. } => {
                assert_eq!(kiosk_id, "K1");
                saw_offline = true;
            }
            _ => unreachable!(),
        }
    }

    assert_eq!(state.sessions.count().await, 0);
}

#[tokio::test]
async fn malformed_frames_get_an_error_event() {
    let (base, state) = spawn_hub().await;

    let mut monitor = connect(&base, &state, "M1", Role::Monitor).await;
    monitor
        .send(Message::Text(r#"{"type":"self-destruct"}"#.into()))
        .await
        .expect("send");

    let event = expect_event(&mut monitor, |e| matches!(e, ServerEvent::Error { .. })).await;
    match event {
        ServerEvent::Error { code, .. } => assert_eq!(code, "SIGNALING_BAD_REQUEST"),
        _ => unreachable!(),
    }
}
