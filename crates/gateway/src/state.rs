// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio_util::sync::CancellationToken;

use vigil_core::token::TokenKey;

use crate::config::GatewayConfig;
use crate::replay::ReplaySet;
use crate::sources::SourceTable;
use crate::worker::WorkerTable;

/// Shared gateway state.
pub struct GatewayState {
    pub sources: SourceTable,
    pub workers: WorkerTable,
    pub replay: ReplaySet,
    pub verifier: TokenKey,
    pub config: GatewayConfig,
    pub shutdown: CancellationToken,
}

impl GatewayState {
    pub fn new(config: GatewayConfig, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let verifier = match config.signing_key.as_deref() {
            Some(secret) => TokenKey::from_secret(secret),
            None => {
                tracing::warn!(
                    "VIGIL_SIGNING_KEY is not set; using an ephemeral key, \
                     control-plane tokens will not verify here"
                );
                TokenKey::ephemeral().map_err(|_| anyhow::anyhow!("key generation failed"))?
            }
        };

        Ok(Self {
            sources: SourceTable::new(),
            workers: WorkerTable::new(),
            replay: ReplaySet::new(),
            verifier,
            config,
            shutdown,
        })
    }
}
