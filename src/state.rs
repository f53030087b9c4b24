// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use crate::config::{ConfigError, GateSettings, DEFAULT_UPSTREAM_TIMEOUT, SUPABASE_URL_ENV};
use crate::credential_store::AuthClients;
use crate::session::SessionCookieStore;

#[derive(Clone)]
pub struct AppState {
    pub gate: GateSettings,
    pub upstream_timeout: Duration,
    /// Origins allowed to call the API cross-origin. Empty means none.
    pub allowed_origins: Vec<String>,
    /// Either working Credential Store handles or the reason they could not
    /// be built. Privileged endpoints report the error as a 500.
    clients: Result<AuthClients, ConfigError>,
}

impl AppState {
    pub fn new(clients: AuthClients) -> Self {
        Self {
            gate: GateSettings::default(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            allowed_origins: Vec::new(),
            clients: Ok(clients),
        }
    }

    /// State for a deployment whose Credential Store settings are missing.
    pub fn unconfigured(error: ConfigError) -> Self {
        Self {
            gate: GateSettings::default(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            allowed_origins: Vec::new(),
            clients: Err(error),
        }
    }

    pub fn with_gate_settings(mut self, gate: GateSettings) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn clients(&self) -> Result<&AuthClients, ConfigError> {
        self.clients.as_ref().map_err(Clone::clone)
    }

    /// Session cookie layout for the configured project, if any.
    pub fn session_cookies(&self) -> Option<SessionCookieStore> {
        self.clients
            .as_ref()
            .ok()
            .map(|c| SessionCookieStore::new(&c.project_ref))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::unconfigured(ConfigError::Missing(SUPABASE_URL_ENV.to_string()))
    }
}
