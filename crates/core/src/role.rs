// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use serde::{Deserialize, Serialize};

/// Client role carried in identity tokens and presence entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Kiosk,
    Monitor,
}

impl Role {
    /// The opposite side of a kiosk↔monitor session.
    pub fn peer(self) -> Role {
        match self {
            Self::Kiosk => Self::Monitor,
            Self::Monitor => Self::Kiosk,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kiosk => "KIOSK",
            Self::Monitor => "MONITOR",
        }
    }

    /// Whether this role may own sessions and drive call/media commands.
    pub fn may_own_sessions(self) -> bool {
        matches!(self, Self::Monitor)
    }

    /// Whether this role may mint stream tokens and enumerate cameras.
    pub fn may_view_cameras(self) -> bool {
        matches!(self, Self::Monitor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
