// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background session-timeout reaper.

use std::sync::Arc;
use std::time::Duration;

use crate::signaling;
use crate::state::HubState;

/// Scan interval between timeout sweeps.
pub const REAPER_INTERVAL: Duration = Duration::from_secs(30);

/// Spawn a single background task that ends sessions idle past the
/// configured timeout. Both sides are notified; a live call counts as
/// ended first.
pub fn spawn_session_reaper(state: Arc<HubState>) {
    let timeout = state.config.session_timeout();

    tokio::spawn(async move {
        let mut timer = tokio::time::interval(REAPER_INTERVAL);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = state.shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            let expired = state.sessions.remove_idle(timeout).await;
            for session in expired {
                tracing::warn!(
                    kiosk_id = %session.kiosk_id,
                    monitor_id = %session.monitor_id,
                    "session timed out"
                );
                signaling::notify_session_ended(&state, &session.into(), "timeout").await;
            }
        }
    });
}
