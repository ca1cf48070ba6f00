// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compact HMAC-signed capability tokens.
//!
//! Wire format: `base64url(claims JSON) "." base64url(HMAC-SHA256 tag)`,
//! both halves unpadded. The tag covers the encoded claims half, so a
//! token verifies byte-for-byte or not at all. Two claim sets share the
//! format: stream tokens (single-use viewer admission) and identity
//! tokens (persistent signaling connections).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ring::hmac;
use ring::rand::SystemRandom;
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Permission string required for viewer admission.
pub const PERMISSION_VIEW: &str = "VIEW";

/// Compare two shared secrets without leaking where they diverge.
/// Used for pre-shared header secrets on both planes.
pub fn secrets_match(a: &str, b: &str) -> bool {
    ring::constant_time::verify_slices_are_equal(a.as_bytes(), b.as_bytes()).is_ok()
}

/// Token verification failures, ordered by how far verification got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Claims of a short-lived, single-use stream viewing capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamClaims {
    pub camera_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub permissions: Vec<String>,
    /// Monitor identity, recorded for audit only.
    pub monitor_id: String,
    pub iat: i64,
}

impl StreamClaims {
    /// Build claims for a fresh token valid for `ttl` from now.
    pub fn issue(camera_id: &str, monitor_id: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            camera_id: camera_id.to_owned(),
            issued_at: now,
            expires_at: now + ttl,
            permissions: vec![PERMISSION_VIEW.to_owned()],
            monitor_id: monitor_id.to_owned(),
            iat: now.timestamp(),
        }
    }

    pub fn has_view_permission(&self) -> bool {
        self.permissions.iter().any(|p| p == PERMISSION_VIEW)
    }
}

/// Claims identifying an authenticated signaling client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    pub client_id: String,
    pub role: Role,
    pub iat: i64,
}

impl IdentityClaims {
    pub fn new(client_id: &str, role: Role) -> Self {
        Self { client_id: client_id.to_owned(), role, iat: Utc::now().timestamp() }
    }
}

/// The shared signing key. Read-only after construction.
pub struct TokenKey {
    key: hmac::Key,
}

impl TokenKey {
    /// Derive the key from the environment-supplied shared secret.
    pub fn from_secret(secret: &str) -> Self {
        Self { key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()) }
    }

    /// Generate a process-local random key.
    ///
    /// Used when the signing-key variable is absent: tokens still work
    /// within this process but will not verify across services.
    pub fn ephemeral() -> Result<Self, ring::error::Unspecified> {
        let rng = SystemRandom::new();
        let key = hmac::Key::generate(hmac::HMAC_SHA256, &rng)?;
        Ok(Self { key })
    }

    pub fn sign_stream(&self, claims: &StreamClaims) -> String {
        self.sign_claims(claims)
    }

    pub fn sign_identity(&self, claims: &IdentityClaims) -> String {
        self.sign_claims(claims)
    }

    /// Verify a stream token: signature, then wall-clock expiry.
    ///
    /// A token exactly at its expiry instant is already expired.
    pub fn verify_stream(&self, token: &str) -> Result<StreamClaims, TokenError> {
        self.verify_stream_at(token, Utc::now())
    }

    pub fn verify_identity(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        self.verify_claims(token)
    }

    fn verify_stream_at(&self, token: &str, now: DateTime<Utc>) -> Result<StreamClaims, TokenError> {
        let claims: StreamClaims = self.verify_claims(token)?;
        if claims.expires_at <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn sign_claims<C: Serialize>(&self, claims: &C) -> String {
        let json = serde_json::to_vec(claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let tag = hmac::sign(&self.key, payload.as_bytes());
        format!("{payload}.{}", URL_SAFE_NO_PAD.encode(tag.as_ref()))
    }

    fn verify_claims<C: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<C, TokenError> {
        let (payload, tag_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let tag = URL_SAFE_NO_PAD.decode(tag_b64).map_err(|_| TokenError::Malformed)?;
        hmac::verify(&self.key, payload.as_bytes(), &tag)
            .map_err(|_| TokenError::BadSignature)?;
        let json = URL_SAFE_NO_PAD.decode(payload).map_err(|_| TokenError::Malformed)?;
        serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
