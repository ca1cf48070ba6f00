// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the signaling hub and control backend.
#[derive(Debug, Clone, clap::Parser)]
pub struct HubConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "HUB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 4000, env = "HUB_PORT")]
    pub port: u16,

    /// Shared signing key for identity and stream tokens. When unset a
    /// process-local random key is used and a warning is logged.
    #[arg(long, env = "VIGIL_SIGNING_KEY")]
    pub signing_key: Option<String>,

    /// Idle session timeout in milliseconds.
    #[arg(long, default_value_t = 300_000, env = "SESSION_TIMEOUT_MS")]
    pub session_timeout_ms: u64,

    /// Stream token time-to-live in seconds.
    #[arg(long, default_value_t = 60, env = "STREAM_TOKEN_TTL")]
    pub stream_token_ttl_secs: u64,

    /// Pre-shared secret expected in `X-Gateway-Secret` on health callbacks.
    /// If unset, the callback endpoint is open.
    #[arg(long, env = "GATEWAY_SECRET")]
    pub gateway_secret: Option<String>,
}

impl HubConfig {
    pub fn session_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.session_timeout_ms)
    }

    pub fn stream_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stream_token_ttl_secs as i64)
    }
}
