// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// ── client events ─────────────────────────────────────────────────────

#[test]
fn parses_kebab_case_types_and_camel_case_fields() -> anyhow::Result<()> {
    let event: ClientEvent =
        serde_json::from_str(r#"{"type":"start-monitoring","kioskId":"K1"}"#)?;
    assert!(matches!(event, ClientEvent::StartMonitoring { ref kiosk_id } if kiosk_id == "K1"));

    let event: ClientEvent =
        serde_json::from_str(r#"{"type":"toggle-video","kioskId":"K1","enabled":false}"#)?;
    assert!(matches!(event, ClientEvent::ToggleVideo { enabled: false, .. }));
    Ok(())
}

#[test]
fn unknown_event_types_fail_to_parse() {
    let result = serde_json::from_str::<ClientEvent>(r#"{"type":"reboot-kiosk"}"#);
    assert!(result.is_err());
}

#[test]
fn missing_required_fields_fail_to_parse() {
    let result = serde_json::from_str::<ClientEvent>(r#"{"type":"call-request"}"#);
    assert!(result.is_err());
}

#[test]
fn unknown_fields_are_ignored() -> anyhow::Result<()> {
    let event: ClientEvent =
        serde_json::from_str(r#"{"type":"call-end","kioskId":"K1","legacy":true}"#)?;
    assert!(matches!(event, ClientEvent::CallEnd { .. }));
    Ok(())
}

// ── server events ─────────────────────────────────────────────────────

#[test]
fn server_events_serialize_with_type_tag() -> anyhow::Result<()> {
    let event = ServerEvent::KioskOffline {
        kiosk_id: "K1".into(),
        timestamp: chrono::Utc::now(),
        reason: "disconnected".into(),
    };
    let json = serde_json::to_value(&event)?;
    assert_eq!(json["type"], "kiosk-offline");
    assert_eq!(json["kioskId"], "K1");
    assert_eq!(json["reason"], "disconnected");
    // Timestamps are ISO-8601 strings on the wire.
    assert!(json["timestamp"].as_str().is_some_and(|t| t.contains('T')));
    Ok(())
}

#[test]
fn error_event_carries_stable_code() -> anyhow::Result<()> {
    let event = ServerEvent::error(SignalCode::NoActiveCall);
    let json = serde_json::to_value(&event)?;
    assert_eq!(json["type"], "error");
    assert_eq!(json["code"], "NO_ACTIVE_CALL");
    assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));
    Ok(())
}

#[test]
fn confirmation_events_use_expected_tags() -> anyhow::Result<()> {
    let cases = vec![
        (ServerEvent::CallAcceptConfirmed { kiosk_id: "K1".into() }, "call-accept-confirmed"),
        (ServerEvent::CallEndConfirmed { kiosk_id: "K1".into() }, "call-end-confirmed"),
        (ServerEvent::VideoToggleConfirmed { enabled: true }, "video-toggle-confirmed"),
        (ServerEvent::AudioToggled { from_id: "M1".into(), enabled: false }, "audio-toggled"),
        (ServerEvent::Pong, "pong"),
    ];
    for (event, tag) in cases {
        let json = serde_json::to_value(&event)?;
        assert_eq!(json["type"], tag);
    }
    Ok(())
}
