// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Vigil-core: signing-key token primitives and shared role types.
//!
//! Both planes of the system depend on this crate and on nothing else of
//! each other: the control backend mints stream tokens, the gateway
//! verifies them offline against the same key.

pub mod role;
pub mod token;
