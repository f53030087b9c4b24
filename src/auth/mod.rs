// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Admin Authentication
//!
//! There is a single shared admin marker, not per-admin identities. A
//! browser counts as "admin" when either channel is set:
//!
//! - the `web3_admin_auth` cookie (name configurable) with any non-empty
//!   value, or
//! - the `x-admin-auth` header equal to `1`, sent by same-origin XHR callers whose
//!   cookie may not survive a cross-context navigation.
//!
//! ## Enforcement
//!
//! - [`AdminGate`] guards every privileged endpoint and answers 401 before
//!   any side effect.
//! - [`route_gate`] redirects page navigation under `/admin` and
//!   `/dashboard` on cookie presence alone.

pub mod gate;
pub mod route_gate;

pub use gate::{admin_proof, AdminGate, AdminProof};
pub use route_gate::route_gate;
