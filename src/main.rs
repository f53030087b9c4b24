// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use wallet_admin_bridge::{
    api::router,
    config::{ConfigError, CredentialStoreConfig, GateSettings, LogFormat, ServerConfig},
    credential_store::AuthClients,
    logging,
    state::AppState,
};

/// In-flight requests get this long to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn build_state() -> AppState {
    let gate = GateSettings::from_env();

    let config = match CredentialStoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Credential Store is not configured; admin endpoints will fail");
            return AppState::unconfigured(e).with_gate_settings(gate);
        }
    };

    if config.anon_key.is_none() {
        warn!("No anon key configured; impersonation login is disabled");
    }

    match AuthClients::from_config(&config) {
        Ok(clients) => {
            info!(
                base_url = %config.base_url,
                project_ref = %clients.project_ref,
                timeout_secs = config.timeout.as_secs(),
                "Credential Store clients ready"
            );
            AppState::new(clients)
                .with_gate_settings(gate)
                .with_upstream_timeout(config.timeout)
        }
        Err(e) => {
            error!(error = %e, "Failed to build Credential Store clients");
            AppState::unconfigured(ConfigError::Invalid(e.to_string())).with_gate_settings(gate)
        }
    }
}

async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
        _ = shutdown.cancelled() => {}
    }
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logging::init(LogFormat::from_env()) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        error!("Failed to install rustls crypto provider");
        return ExitCode::FAILURE;
    }

    let server = ServerConfig::from_env();
    let addr: SocketAddr = match format!("{}:{}", server.host, server.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(host = %server.host, port = server.port, error = %e, "Invalid bind address");
            return ExitCode::FAILURE;
        }
    };

    let app = router(build_state().with_allowed_origins(server.allowed_origins.clone()));

    let shutdown = CancellationToken::new();
    let handle = Handle::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        let handle = handle.clone();
        async move {
            wait_for_signal(shutdown).await;
            info!("Shutting down");
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    let result = match &server.tls {
        Some((cert_path, key_path)) => {
            let tls_config = match RustlsConfig::from_pem_file(cert_path, key_path).await {
                Ok(config) => config,
                Err(e) => {
                    error!(
                        cert = %cert_path,
                        key = %key_path,
                        error = %e,
                        "Failed to load TLS certificate"
                    );
                    return ExitCode::FAILURE;
                }
            };
            info!("Wallet admin bridge listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            info!("Wallet admin bridge listening on http://{addr} (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };

    shutdown.cancel();
    match result {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
