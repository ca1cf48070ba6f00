// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Vigil-hub: signaling hub and control backend.
//!
//! Owns presence, sessions, and the kiosk↔monitor call state machine
//! over persistent WebSocket connections, plus the camera registry and
//! stream-token issuance consumed by monitors. Media never flows through
//! this plane.

pub mod config;
pub mod error;
pub mod presence;
pub mod protocol;
pub mod reaper;
pub mod registry;
pub mod session;
pub mod signaling;
pub mod state;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::HubConfig;
use crate::reaper::spawn_session_reaper;
use crate::state::HubState;
use crate::transport::build_router;

/// Run the hub until shutdown.
pub async fn run(config: HubConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let state = Arc::new(HubState::new(config, shutdown.clone())?);

    // Propagate Ctrl-C into the cancellation tree.
    let ctrlc_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrlc_shutdown.cancel();
        }
    });

    spawn_session_reaper(Arc::clone(&state));

    tracing::info!("vigil-hub listening on {addr}");
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
