// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable signaling error codes, emitted as `error {code, message}` events.
///
/// A violation never mutates presence or session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalCode {
    NoSession,
    InvalidTarget,
    NotOwner,
    BadRole,
    InvalidCallState,
    NoActiveCall,
    KioskNotFound,
    SessionConflict,
    BadRequest,
}

impl SignalCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSession => "SIGNALING_NO_SESSION",
            Self::InvalidTarget => "SIGNALING_INVALID_TARGET",
            Self::NotOwner => "SIGNALING_NOT_OWNER",
            Self::BadRole => "SIGNALING_BAD_ROLE",
            Self::InvalidCallState => "INVALID_CALL_STATE",
            Self::NoActiveCall => "NO_ACTIVE_CALL",
            Self::KioskNotFound => "KIOSK_NOT_FOUND",
            Self::SessionConflict => "SESSION_CONFLICT",
            Self::BadRequest => "SIGNALING_BAD_REQUEST",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::NoSession => "no session for this kiosk",
            Self::InvalidTarget => "sender is not a participant of this session",
            Self::NotOwner => "session is owned by another monitor",
            Self::BadRole => "role not permitted for this command",
            Self::InvalidCallState => "command not valid in the current call state",
            Self::NoActiveCall => "no active call",
            Self::KioskNotFound => "kiosk is not online",
            Self::SessionConflict => "kiosk is already monitored by another monitor",
            Self::BadRequest => "malformed or unknown event",
        }
    }
}

impl fmt::Display for SignalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error codes for the control-backend HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    Unauthorized,
    Forbidden,
    BadRequest,
    NotFound,
    Internal,
}

impl ApiError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
