// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, net::SocketAddr};

use tracing_subscriber::EnvFilter;

use hcert_gateway::api::router;
use hcert_gateway::config::{AppConfig, DATA_DIR_ENV};
use hcert_gateway::hcert::keys::load_signing_key;
use hcert_gateway::state::AppState;
use hcert_gateway::storage::{FileStore, StoragePaths};
use hcert_gateway::trust::TrustClient;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = AppConfig::from_env();

    // Initialize persistent storage
    let data_dir = env::var(DATA_DIR_ENV).unwrap_or_else(|_| "/data".to_string());
    let mut storage = FileStore::new(StoragePaths::new(&data_dir));
    storage
        .initialize()
        .expect("Failed to initialize storage directories");

    // Load the document-signer key (panics if not available - signing is mandatory)
    let signer = load_signing_key(&config.dsc_key_path).expect("Failed to load signing key");
    tracing::info!(key_id = %config.dsc_key_id, "Loaded document-signer key");

    let trust = TrustClient::new(config.trust_network_url.clone());
    let state = AppState::new(config, storage, trust, signer);
    let app = router(state);

    // Parse bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!("hcert-gateway listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .await
        .expect("HTTP server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    match env::var("LOG_FORMAT").as_deref() {
        Ok("json") => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
