// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio_util::sync::CancellationToken;

use vigil_core::token::TokenKey;

use crate::config::HubConfig;
use crate::presence::Presence;
use crate::registry::CameraRegistry;
use crate::session::SessionStore;

/// Shared hub state: the single logical authority over presence,
/// sessions, and the camera registry.
pub struct HubState {
    pub presence: Presence,
    pub sessions: SessionStore,
    pub registry: CameraRegistry,
    pub signer: TokenKey,
    pub config: HubConfig,
    pub shutdown: CancellationToken,
}

impl HubState {
    pub fn new(config: HubConfig, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let signer = match config.signing_key.as_deref() {
            Some(secret) => TokenKey::from_secret(secret),
            None => {
                tracing::warn!(
                    "VIGIL_SIGNING_KEY is not set; using an ephemeral key, \
                     tokens will not verify across services"
                );
                TokenKey::ephemeral().map_err(|_| anyhow::anyhow!("key generation failed"))?
            }
        };

        Ok(Self {
            presence: Presence::new(),
            sessions: SessionStore::new(),
            registry: CameraRegistry::new(),
            signer,
            config,
            shutdown,
        })
    }
}
