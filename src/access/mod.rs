// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Control Module
//!
//! The manifest-based access layer that gates clinical-data retrieval.
//!
//! A passcode-protected manifest never hands out its document directly.
//! Resolving it mints (or rotates) a single-use retrieval identity; only
//! that identity, spent on first use, fetches the document. Unprotected
//! manifests skip the indirection and serve the document repeatably.
//!
//! The mint-or-rotate sequence and the accessed-flag transition each run
//! under a per-identifier async lock: concurrent resolutions of one
//! manifest must agree on a single fresh identity, and concurrent
//! retrievals of one identity must yield exactly one success.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::AppConfig;
use crate::storage::{
    DocumentStore, FileStore, IpsFileRecord, IpsFileRepository, QrCodeRepository, StorageError,
};

/// Content type of every served clinical document.
pub const FHIR_JSON_CONTENT_TYPE: &str = "application/fhir+json";

/// Error type for access-control operations.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("retrieval identity already consumed")]
    AlreadyAccessed,
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Per-key async mutual exclusion.
///
/// Guards check-and-mint and test-and-set sequences that span several
/// storage operations. Lock entries are kept for the process lifetime;
/// the key space is bounded by the number of live identifiers.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl KeyedLocks {
    /// Acquire the lock for `key`, waiting if another task holds it.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().await;
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Where and how to fetch a resolved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalDescriptor {
    /// Retrieval URL embedding the current single-use identity
    pub location: String,
    /// Fixed clinical-document media type
    pub content_type: &'static str,
}

/// Resolves manifests into single-use retrieval descriptors.
pub struct AccessGateway<'a> {
    config: &'a AppConfig,
    storage: &'a FileStore,
    locks: &'a KeyedLocks,
}

impl<'a> AccessGateway<'a> {
    /// Create a new AccessGateway.
    pub fn new(config: &'a AppConfig, storage: &'a FileStore, locks: &'a KeyedLocks) -> Self {
        Self {
            config,
            storage,
            locks,
        }
    }

    /// Resolve a passcode-protected manifest into a retrieval descriptor.
    ///
    /// Mints the backing retrieval identity on first resolution and rotates
    /// it (delete + fresh mint) whenever the existing one is past its TTL
    /// or already consumed. Rotation is transparent to the caller.
    pub async fn resolve_manifest(
        &self,
        manifest_id: &str,
        passcode: Option<&str>,
    ) -> Result<RetrievalDescriptor, AccessError> {
        let qr_code = QrCodeRepository::new(self.storage)
            .find_by_manifest_id(manifest_id)
            .map_err(|e| match e {
                StorageError::NotFound(_) => {
                    AccessError::NotFound(format!("manifest {manifest_id}"))
                }
                other => AccessError::Storage(other),
            })?;

        if !qr_code.flag.is_protected() {
            return Err(AccessError::InvalidRequest(
                "manifest resolution applies to passcode-protected records only".to_string(),
            ));
        }

        // Exact string equality, full length; no partial-match leniency.
        let matches = match (qr_code.pass_code.as_deref(), passcode) {
            (Some(stored), Some(given)) => stored == given,
            _ => false,
        };
        if !matches {
            return Err(AccessError::Validation("passcode mismatch".to_string()));
        }

        // Serialize check-and-mint per manifest id.
        let _guard = self.locks.acquire(&format!("manifest:{manifest_id}")).await;

        let repo = IpsFileRepository::new(self.storage);
        let record = match repo.find_by_manifest_id(manifest_id)? {
            None => {
                let fresh = IpsFileRecord::mint(manifest_id);
                repo.create(&fresh)?;
                fresh
            }
            Some(existing) => {
                let stale = existing.is_expired(self.config.manifest_ttl_minutes, Utc::now())
                    || existing.accessed;
                if stale {
                    repo.delete(&existing.id)?;
                    let fresh = IpsFileRecord::mint(manifest_id);
                    repo.create(&fresh)?;
                    tracing::debug!(manifest_id, old = %existing.id, new = %fresh.id, "rotated retrieval identity");
                    fresh
                } else {
                    existing
                }
            }
        };

        Ok(RetrievalDescriptor {
            location: self.config.ips_json_url(&record.id),
            content_type: FHIR_JSON_CONTENT_TYPE,
        })
    }
}

/// Serves clinical documents, enforcing single use on protected paths.
pub struct RetrievalResolver<'a> {
    storage: &'a FileStore,
    locks: &'a KeyedLocks,
}

impl<'a> RetrievalResolver<'a> {
    /// Create a new RetrievalResolver.
    pub fn new(storage: &'a FileStore, locks: &'a KeyedLocks) -> Self {
        Self { storage, locks }
    }

    /// Fetch the clinical document behind `id`.
    ///
    /// `id` is either the manifest identifier of an unprotected record
    /// (repeatable access) or a single-use retrieval identity minted by
    /// manifest resolution (consumed on first success).
    pub async fn retrieve(&self, id: &str) -> Result<Vec<u8>, AccessError> {
        let qr_repo = QrCodeRepository::new(self.storage);

        // Direct path: id names an unprotected manifest.
        match qr_repo.find_by_manifest_id(id) {
            Ok(qr_code) => {
                if qr_code.flag.is_protected() {
                    return Err(AccessError::InvalidRequest(
                        "protected documents are served through their manifest".to_string(),
                    ));
                }
                return Ok(DocumentStore::new(self.storage).get(&qr_code.json_file)?);
            }
            Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(AccessError::Storage(e)),
        }

        // Single-use path: id is a retrieval identity. The accessed flag
        // must transition exactly once, so test-and-set runs under the
        // identity's lock and persists before any content is returned.
        let _guard = self.locks.acquire(&format!("ips:{id}")).await;

        let repo = IpsFileRepository::new(self.storage);
        let mut record = repo.get(id).map_err(|e| match e {
            StorageError::NotFound(_) => AccessError::NotFound(format!("retrieval identity {id}")),
            other => AccessError::Storage(other),
        })?;

        if record.accessed {
            return Err(AccessError::AlreadyAccessed);
        }
        repo.mark_accessed(&mut record)?;

        let qr_code = qr_repo
            .find_by_manifest_id(&record.manifest_id)
            .map_err(|e| match e {
                StorageError::NotFound(_) => {
                    AccessError::NotFound(format!("manifest {}", record.manifest_id))
                }
                other => AccessError::Storage(other),
            })?;

        Ok(DocumentStore::new(self.storage).get(&qr_code.json_file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{AccessFlag, StoragePaths, StoredQrCode};
    use chrono::Duration;
    use std::env;
    use std::fs;
    use uuid::Uuid;

    fn test_config() -> AppConfig {
        AppConfig {
            base_url: "https://gateway.example".to_string(),
            country_code: "XA".to_string(),
            dsc_key_path: "/tmp/unused.pem".to_string(),
            dsc_key_id: "dsc-001".to_string(),
            trust_network_url: "https://tng.example.int".to_string(),
            manifest_ttl_minutes: 5,
        }
    }

    fn test_storage() -> FileStore {
        let dir = env::temp_dir().join(format!("test-access-{}", Uuid::new_v4()));
        let mut storage = FileStore::new(StoragePaths::new(&dir));
        storage.initialize().expect("Failed to initialize");
        storage
    }

    fn cleanup(storage: &FileStore) {
        let _ = fs::remove_dir_all(storage.paths().root());
    }

    fn seed_qr_code(storage: &FileStore, manifest_id: &str, flag: AccessFlag) -> StoredQrCode {
        let id = Uuid::new_v4().to_string();
        let json_file = DocumentStore::file_name(&id);
        DocumentStore::new(storage)
            .put(&json_file, b"{\"resourceType\":\"Bundle\"}")
            .unwrap();

        let record = StoredQrCode {
            id,
            manifest_id: manifest_id.to_string(),
            json_file,
            key: "k".repeat(43),
            flag,
            pass_code: flag.is_protected().then(|| "secret123".to_string()),
            expires_on: None,
            created_at: Utc::now(),
        };
        QrCodeRepository::new(storage).create(&record).unwrap();
        record
    }

    fn identity_from(descriptor: &RetrievalDescriptor) -> String {
        descriptor.location.rsplit('/').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn unknown_manifest_is_not_found() {
        let config = test_config();
        let storage = test_storage();
        let locks = KeyedLocks::default();
        let gateway = AccessGateway::new(&config, &storage, &locks);

        let result = gateway.resolve_manifest("nope", Some("secret123")).await;
        assert!(matches!(result, Err(AccessError::NotFound(_))));

        cleanup(&storage);
    }

    #[tokio::test]
    async fn unprotected_manifest_rejects_resolution() {
        let config = test_config();
        let storage = test_storage();
        let locks = KeyedLocks::default();
        seed_qr_code(&storage, "manifest-u", AccessFlag::U);

        let gateway = AccessGateway::new(&config, &storage, &locks);
        let result = gateway.resolve_manifest("manifest-u", Some("secret123")).await;
        assert!(matches!(result, Err(AccessError::InvalidRequest(_))));

        cleanup(&storage);
    }

    #[tokio::test]
    async fn wrong_passcode_is_a_validation_error() {
        let config = test_config();
        let storage = test_storage();
        let locks = KeyedLocks::default();
        seed_qr_code(&storage, "manifest-p", AccessFlag::P);

        let gateway = AccessGateway::new(&config, &storage, &locks);

        for wrong in [Some("secret12"), Some("SECRET123"), Some(""), None] {
            let result = gateway.resolve_manifest("manifest-p", wrong).await;
            assert!(matches!(result, Err(AccessError::Validation(_))));
        }

        cleanup(&storage);
    }

    #[tokio::test]
    async fn resolution_mints_and_reuses_a_fresh_identity() {
        let config = test_config();
        let storage = test_storage();
        let locks = KeyedLocks::default();
        seed_qr_code(&storage, "manifest-m", AccessFlag::P);

        let gateway = AccessGateway::new(&config, &storage, &locks);

        let first = gateway
            .resolve_manifest("manifest-m", Some("secret123"))
            .await
            .unwrap();
        assert_eq!(first.content_type, FHIR_JSON_CONTENT_TYPE);
        assert!(first
            .location
            .starts_with("https://gateway.example/v2/ips-json/"));

        // Unconsumed and within TTL: the identity is stable across calls.
        let second = gateway
            .resolve_manifest("manifest-m", Some("secret123"))
            .await
            .unwrap();
        assert_eq!(identity_from(&first), identity_from(&second));

        cleanup(&storage);
    }

    #[tokio::test]
    async fn consumed_identity_is_rotated() {
        let config = test_config();
        let storage = test_storage();
        let locks = KeyedLocks::default();
        seed_qr_code(&storage, "manifest-r", AccessFlag::P);

        let gateway = AccessGateway::new(&config, &storage, &locks);
        let first = gateway
            .resolve_manifest("manifest-r", Some("secret123"))
            .await
            .unwrap();

        let repo = IpsFileRepository::new(&storage);
        let mut record = repo.get(&identity_from(&first)).unwrap();
        repo.mark_accessed(&mut record).unwrap();

        let second = gateway
            .resolve_manifest("manifest-r", Some("secret123"))
            .await
            .unwrap();
        assert_ne!(identity_from(&first), identity_from(&second));

        // The consumed identity is gone, not resurrected.
        assert!(!repo.exists(&identity_from(&first)));

        cleanup(&storage);
    }

    #[tokio::test]
    async fn expired_identity_is_rotated() {
        let config = test_config();
        let storage = test_storage();
        let locks = KeyedLocks::default();
        seed_qr_code(&storage, "manifest-t", AccessFlag::P);

        let repo = IpsFileRepository::new(&storage);
        let mut old = IpsFileRecord::mint("manifest-t");
        old.created_at = Utc::now() - Duration::minutes(10);
        repo.create(&old).unwrap();

        let gateway = AccessGateway::new(&config, &storage, &locks);
        let descriptor = gateway
            .resolve_manifest("manifest-t", Some("secret123"))
            .await
            .unwrap();
        assert_ne!(identity_from(&descriptor), old.id);

        cleanup(&storage);
    }

    #[tokio::test]
    async fn concurrent_resolutions_agree_on_one_identity() {
        let config = test_config();
        let storage = test_storage();
        let locks = KeyedLocks::default();
        seed_qr_code(&storage, "manifest-c", AccessFlag::P);

        let gateway = AccessGateway::new(&config, &storage, &locks);
        let (a, b) = tokio::join!(
            gateway.resolve_manifest("manifest-c", Some("secret123")),
            gateway.resolve_manifest("manifest-c", Some("secret123")),
        );
        assert_eq!(identity_from(&a.unwrap()), identity_from(&b.unwrap()));

        let all = IpsFileRepository::new(&storage)
            .find_by_manifest_id("manifest-c")
            .unwrap();
        assert!(all.is_some());

        cleanup(&storage);
    }

    #[tokio::test]
    async fn unprotected_retrieval_is_repeatable() {
        let storage = test_storage();
        let locks = KeyedLocks::default();
        seed_qr_code(&storage, "manifest-open", AccessFlag::U);

        let resolver = RetrievalResolver::new(&storage, &locks);
        for _ in 0..3 {
            let bytes = resolver.retrieve("manifest-open").await.unwrap();
            assert_eq!(bytes, b"{\"resourceType\":\"Bundle\"}");
        }

        cleanup(&storage);
    }

    #[tokio::test]
    async fn protected_manifest_id_rejects_direct_retrieval() {
        let storage = test_storage();
        let locks = KeyedLocks::default();
        seed_qr_code(&storage, "manifest-locked", AccessFlag::P);

        let resolver = RetrievalResolver::new(&storage, &locks);
        let result = resolver.retrieve("manifest-locked").await;
        assert!(matches!(result, Err(AccessError::InvalidRequest(_))));

        cleanup(&storage);
    }

    #[tokio::test]
    async fn retrieval_identity_is_single_use() {
        let storage = test_storage();
        let locks = KeyedLocks::default();
        seed_qr_code(&storage, "manifest-once", AccessFlag::P);

        let record = IpsFileRecord::mint("manifest-once");
        IpsFileRepository::new(&storage).create(&record).unwrap();

        let resolver = RetrievalResolver::new(&storage, &locks);
        let bytes = resolver.retrieve(&record.id).await.unwrap();
        assert_eq!(bytes, b"{\"resourceType\":\"Bundle\"}");

        let again = resolver.retrieve(&record.id).await;
        assert!(matches!(again, Err(AccessError::AlreadyAccessed)));

        cleanup(&storage);
    }

    #[tokio::test]
    async fn concurrent_retrievals_yield_exactly_one_success() {
        let storage = test_storage();
        let locks = KeyedLocks::default();
        seed_qr_code(&storage, "manifest-race", AccessFlag::P);

        let record = IpsFileRecord::mint("manifest-race");
        IpsFileRepository::new(&storage).create(&record).unwrap();

        let resolver = RetrievalResolver::new(&storage, &locks);
        let (a, b) = tokio::join!(resolver.retrieve(&record.id), resolver.retrieve(&record.id));

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!([a, b]
            .into_iter()
            .any(|r| matches!(r, Err(AccessError::AlreadyAccessed))));

        cleanup(&storage);
    }

    #[tokio::test]
    async fn unknown_identity_is_not_found() {
        let storage = test_storage();
        let locks = KeyedLocks::default();

        let resolver = RetrievalResolver::new(&storage, &locks);
        let result = resolver.retrieve("no-such-id").await;
        assert!(matches!(result, Err(AccessError::NotFound(_))));

        cleanup(&storage);
    }
}
