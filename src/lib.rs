// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet Admin Bridge - admin impersonation for the wallet dashboard
//!
//! This crate lets an administrator mint a one-time magic link for a user
//! and turn it into a real browser session, using a GoTrue-compatible
//! Credential Store for identity.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Admin gate and page route gate
//! - `credential_store` - GoTrue REST clients behind async traits
//! - `impersonation` - link minting and server-side redemption
//! - `session` - session cookie layout and response cookie sinks

pub mod api;
pub mod auth;
pub mod config;
pub mod credential_store;
pub mod error;
pub mod impersonation;
pub mod logging;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;
