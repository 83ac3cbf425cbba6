// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use gated_vault::{api::router, config::AppConfig, logging, state::build_vault, state::AppState};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("Invalid configuration");
    logging::init(config.log_format);

    let (vault, gateway) = build_vault(&config).expect("Failed to initialize vault");

    gateway
        .connect()
        .await
        .expect("Failed to connect to key network");


    let addr = config.bind_addr().expect("Failed to parse bind address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!(%addr, chain = %config.chain, "Gated Vault listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    let state = AppState::new(vault, config.max_upload_bytes).with_shutdown(shutdown.clone());
    let app = router(state);

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                signal.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .expect("HTTP server failed");

    gateway.disconnect().await;
    tracing::info!("Gated Vault stopped");
}
