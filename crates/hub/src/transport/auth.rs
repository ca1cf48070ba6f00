// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::HeaderMap;

use vigil_core::role::Role;
use vigil_core::token::{secrets_match, IdentityClaims};

use crate::error::ApiError;
use crate::state::HubState;

/// Extract and verify the identity bearer token from HTTP headers.
pub fn identity_from_headers(
    state: &HubState,
    headers: &HeaderMap,
) -> Result<IdentityClaims, ApiError> {
    let header =
        headers.get("authorization").and_then(|v| v.to_str().ok()).ok_or(ApiError::Unauthorized)?;
    let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
    state.signer.verify_identity(token).map_err(|_| ApiError::Unauthorized)
}

/// Camera endpoints are monitor-only (kiosks may not enumerate cameras
/// or mint tokens).
pub fn require_monitor(state: &HubState, headers: &HeaderMap) -> Result<IdentityClaims, ApiError> {
    let claims = identity_from_headers(state, headers)?;
    if claims.role != Role::Monitor {
        return Err(ApiError::Forbidden);
    }
    Ok(claims)
}

/// Validate the optional pre-shared gateway secret on health callbacks.
pub fn check_gateway_secret(state: &HubState, headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = match state.config.gateway_secret.as_deref() {
        Some(secret) => secret,
        None => return Ok(()),
    };
    let presented = headers
        .get("x-gateway-secret")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    if secrets_match(presented, expected) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
