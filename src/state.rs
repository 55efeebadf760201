// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use p256::ecdsa::SigningKey;

use crate::access::KeyedLocks;
use crate::config::AppConfig;
use crate::storage::FileStore;
use crate::trust::TrustClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: FileStore,
    pub trust: TrustClient,
    pub signer: Arc<SigningKey>,
    pub locks: KeyedLocks,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        storage: FileStore,
        trust: TrustClient,
        signer: SigningKey,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            trust,
            signer: Arc::new(signer),
            locks: KeyedLocks::default(),
        }
    }
}

#[cfg(test)]
pub fn test_state() -> AppState {
    use crate::storage::StoragePaths;
    use rand::rngs::OsRng;

    let dir = std::env::temp_dir().join(format!("test-state-{}", uuid::Uuid::new_v4()));
    let mut storage = FileStore::new(StoragePaths::new(&dir));
    storage.initialize().expect("Failed to initialize");

    AppState::new(
        AppConfig {
            base_url: "https://gateway.example".to_string(),
            country_code: "XA".to_string(),
            dsc_key_path: "/tmp/unused.pem".to_string(),
            dsc_key_id: "dsc-001".to_string(),
            trust_network_url: "http://127.0.0.1:1".to_string(),
            manifest_ttl_minutes: 5,
        },
        storage,
        TrustClient::new("http://127.0.0.1:1"),
        SigningKey::random(&mut OsRng),
    )
}
