// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::HeaderMap;

use vigil_core::token::secrets_match;

use crate::error::GatewayError;
use crate::state::GatewayState;

/// Enforce the pre-shared secret on camera-registration calls when one
/// is configured.
pub fn check_gateway_secret(state: &GatewayState, headers: &HeaderMap) -> Result<(), GatewayError> {
    let expected = match state.config.gateway_secret.as_deref() {
        Some(secret) => secret,
        None => return Ok(()),
    };
    let presented = headers
        .get("x-gateway-secret")
        .and_then(|v| v.to_str().ok())
        .ok_or(GatewayError::Unauthorized)?;
    if secrets_match(presented, expected) {
        Ok(())
    } else {
        Err(GatewayError::Unauthorized)
    }
}
