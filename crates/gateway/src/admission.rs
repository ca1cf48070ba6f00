// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Viewer admission: single-use token validation.
//!
//! Checks run in a fixed order: presence, signature and expiry, replay
//! consumption, permission, camera binding. A token is consumed the
//! moment it passes the replay check, even if a later step still
//! rejects the viewer: single use means single presentation.

use vigil_core::token::{StreamClaims, TokenError};

use crate::state::GatewayState;

/// Machine-readable admission failures, each with the exact close reason
/// sent to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    TokenRequired,
    BadSignature,
    Expired,
    Replayed,
    NoViewPermission,
    UnknownCamera,
    ViewerLimit,
}

impl AdmissionError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::TokenRequired => "Token required",
            Self::BadSignature => "Invalid token signature",
            Self::Expired => "Token expired",
            Self::Replayed => "Token already used",
            Self::NoViewPermission => "No VIEW permission",
            Self::UnknownCamera => "Unknown camera",
            Self::ViewerLimit => "Viewer limit reached",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::TokenRequired | Self::BadSignature | Self::Expired | Self::Replayed => 401,
            Self::NoViewPermission => 403,
            Self::UnknownCamera => 404,
            Self::ViewerLimit => 503,
        }
    }
}

fn verify(state: &GatewayState, token: &str) -> Result<StreamClaims, AdmissionError> {
    state.verifier.verify_stream(token).map_err(|e| match e {
        TokenError::Expired => AdmissionError::Expired,
        TokenError::Malformed | TokenError::BadSignature => AdmissionError::BadSignature,
    })
}

/// Admit a viewer, consuming the token. On success the returned claims
/// bind the connection to exactly one camera.
pub async fn admit(
    state: &GatewayState,
    token: Option<&str>,
) -> Result<StreamClaims, AdmissionError> {
    let token = token.filter(|t| !t.is_empty()).ok_or(AdmissionError::TokenRequired)?;
    let claims = verify(state, token)?;

    if !state.replay.check_and_insert(token, claims.expires_at).await {
        return Err(AdmissionError::Replayed);
    }
    if !claims.has_view_permission() {
        return Err(AdmissionError::NoViewPermission);
    }
    Ok(claims)
}

/// Run the admission checks without consuming the token. Used by the
/// `/validate-token` probe; a probe must not burn the single use it is
/// probing.
pub async fn probe(
    state: &GatewayState,
    token: Option<&str>,
) -> Result<StreamClaims, AdmissionError> {
    let token = token.filter(|t| !t.is_empty()).ok_or(AdmissionError::TokenRequired)?;
    let claims = verify(state, token)?;

    if state.replay.contains(token).await {
        return Err(AdmissionError::Replayed);
    }
    if !claims.has_view_permission() {
        return Err(AdmissionError::NoViewPermission);
    }
    Ok(claims)
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
