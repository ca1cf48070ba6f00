// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-use token replay set.
//!
//! Every admitted token is recorded by exact value until its own expiry,
//! after which signature verification alone rejects it. The set is
//! therefore bounded by token TTL; a periodic sweep removes entries past
//! their purge deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::state::GatewayState;

/// Interval between purge sweeps.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Consumed-token record: exact token value -> purge deadline.
#[derive(Default)]
pub struct ReplaySet {
    inner: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl ReplaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a token. Returns false when the exact value was already
    /// admitted once.
    pub async fn check_and_insert(&self, token: &str, purge_at: DateTime<Utc>) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.contains_key(token) {
            return false;
        }
        inner.insert(token.to_owned(), purge_at);
        true
    }

    /// Non-consuming probe used by `/validate-token`.
    pub async fn contains(&self, token: &str) -> bool {
        self.inner.lock().await.contains_key(token)
    }

    /// Drop entries whose purge deadline has passed. Returns how many
    /// were removed.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        let before = inner.len();
        inner.retain(|_, purge_at| *purge_at > now);
        before - inner.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Spawn the periodic replay-set sweeper.
pub fn spawn_replay_sweeper(state: Arc<GatewayState>) {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(SWEEP_INTERVAL);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = state.shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            let removed = state.replay.sweep().await;
            if removed > 0 {
                tracing::debug!(removed, "swept expired replay entries");
            }
        }
    });
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
