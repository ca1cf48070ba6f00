// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the stream gateway.
#[derive(Debug, Clone, clap::Parser)]
pub struct GatewayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "GATEWAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "GATEWAY_PORT")]
    pub port: u16,

    /// Shared signing key used to verify stream tokens offline. When
    /// unset a process-local random key is used and a warning is logged.
    #[arg(long, env = "VIGIL_SIGNING_KEY")]
    pub signing_key: Option<String>,

    /// Maximum simultaneous viewers per camera.
    #[arg(long, default_value_t = 10, env = "MAX_VIEWERS_PER_CAMERA")]
    pub max_viewers_per_camera: usize,

    /// Stop a worker after this long with zero viewers, in milliseconds.
    #[arg(long, default_value_t = 60_000, env = "STREAM_TIMEOUT_NO_VIEWERS")]
    pub stream_timeout_no_viewers_ms: u64,

    /// Delay before restarting a failed worker, in milliseconds.
    #[arg(long, default_value_t = 5_000, env = "AUTO_RESTART_DELAY")]
    pub auto_restart_delay_ms: u64,

    /// Restart attempts before a worker is declared permanently failed.
    #[arg(long, default_value_t = 5, env = "MAX_RESTARTS")]
    pub max_restarts: u32,

    /// Interval between health reports to the control plane, in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "HEALTH_CHECK_INTERVAL")]
    pub health_check_interval_ms: u64,

    /// Control-plane health-callback endpoint. Reporting is disabled when unset.
    #[arg(long, env = "HEALTH_CALLBACK_URL")]
    pub health_callback_url: Option<String>,

    /// Pre-shared secret sent in `X-Gateway-Secret` on health callbacks
    /// and required (when set) to register cameras.
    #[arg(long, env = "GATEWAY_SECRET")]
    pub gateway_secret: Option<String>,

    /// Directory for HLS fallback playlists and segments.
    #[arg(long, default_value = "./hls", env = "GATEWAY_HLS_DIR")]
    pub hls_dir: std::path::PathBuf,

    /// Media tool binary.
    #[arg(long, default_value = "ffmpeg", env = "GATEWAY_FFMPEG_BIN")]
    pub ffmpeg_bin: String,
}

impl GatewayConfig {
    pub fn stream_timeout_no_viewers(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.stream_timeout_no_viewers_ms)
    }

    pub fn auto_restart_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.auto_restart_delay_ms)
    }

    pub fn health_check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.health_check_interval_ms)
    }
}
