// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Vigil-gateway: CCTV stream gateway.
//!
//! Supervises one transcoding worker per camera, admits viewers with
//! single-use signed tokens, fans frames out through bounded per-viewer
//! queues, and reports per-camera health to the control plane. The
//! signaling plane never touches this process; the only thing shared
//! with it is the signing key.

pub mod admission;
pub mod config;
pub mod error;
pub mod health;
pub mod replay;
pub mod sources;
pub mod state;
pub mod transport;
pub mod worker;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::health::spawn_health_reporter;
use crate::replay::spawn_replay_sweeper;
use crate::state::GatewayState;
use crate::transport::build_router;
use crate::worker::spawn_idle_reaper;

/// Run the gateway until shutdown.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let state = Arc::new(GatewayState::new(config, shutdown.clone())?);

    // Propagate Ctrl-C into the cancellation tree; workers then run
    // their SIGTERM-then-kill stop path.
    let ctrlc_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrlc_shutdown.cancel();
        }
    });

    spawn_idle_reaper(Arc::clone(&state));
    spawn_replay_sweeper(Arc::clone(&state));
    spawn_health_reporter(Arc::clone(&state));

    tracing::info!("vigil-gateway listening on {addr}");
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
