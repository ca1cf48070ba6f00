// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::HeaderMap;
use tokio_util::sync::CancellationToken;

use vigil_core::role::Role;
use vigil_core::token::IdentityClaims;

use super::*;
use crate::config::HubConfig;
use crate::error::ApiError;

fn test_state(gateway_secret: Option<&str>) -> HubState {
    let config = HubConfig {
        host: "127.0.0.1".into(),
        port: 0,
        signing_key: Some("test-key".into()),
        session_timeout_ms: 300_000,
        stream_token_ttl_secs: 60,
        gateway_secret: gateway_secret.map(str::to_owned),
    };
    HubState::new(config, CancellationToken::new()).unwrap()
}

fn bearer(state: &HubState, client_id: &str, role: Role) -> HeaderMap {
    let token = state.signer.sign_identity(&IdentityClaims::new(client_id, role));
    let mut headers = HeaderMap::new();
    headers.insert("authorization", format!("Bearer {token}").parse().unwrap());
    headers
}

// ── bearer identity ───────────────────────────────────────────────────

#[test]
fn valid_bearer_yields_claims() {
    let state = test_state(None);
    let headers = bearer(&state, "M1", Role::Monitor);

    let claims = identity_from_headers(&state, &headers).unwrap();
    assert_eq!(claims.client_id, "M1");
    assert_eq!(claims.role, Role::Monitor);
}

#[test]
fn missing_or_malformed_bearer_is_unauthorized() {
    let state = test_state(None);

    let empty = HeaderMap::new();
    assert_eq!(identity_from_headers(&state, &empty).map(|_| ()), Err(ApiError::Unauthorized));

    let mut no_prefix = HeaderMap::new();
    no_prefix.insert("authorization", "Basic abc".parse().unwrap());
    assert_eq!(identity_from_headers(&state, &no_prefix).map(|_| ()), Err(ApiError::Unauthorized));

    let mut garbage = HeaderMap::new();
    garbage.insert("authorization", "Bearer not.a.token".parse().unwrap());
    assert_eq!(identity_from_headers(&state, &garbage).map(|_| ()), Err(ApiError::Unauthorized));
}

#[test]
fn kiosk_bearer_is_forbidden_on_monitor_routes() {
    let state = test_state(None);
    let headers = bearer(&state, "K1", Role::Kiosk);
    assert_eq!(require_monitor(&state, &headers).map(|_| ()), Err(ApiError::Forbidden));
}

// ── gateway secret ────────────────────────────────────────────────────

#[test]
fn gateway_secret_is_optional_when_unconfigured() {
    let state = test_state(None);
    assert!(check_gateway_secret(&state, &HeaderMap::new()).is_ok());
}

#[test]
fn configured_gateway_secret_is_enforced() {
    let state = test_state(Some("hush"));

    assert_eq!(check_gateway_secret(&state, &HeaderMap::new()), Err(ApiError::Unauthorized));

    let mut wrong = HeaderMap::new();
    wrong.insert("x-gateway-secret", "loud".parse().unwrap());
    assert_eq!(check_gateway_secret(&state, &wrong), Err(ApiError::Unauthorized));

    let mut right = HeaderMap::new();
    right.insert("x-gateway-secret", "hush".parse().unwrap());
    assert!(check_gateway_secret(&state, &right).is_ok());
}
