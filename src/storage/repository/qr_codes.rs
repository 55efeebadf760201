// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! QR code record repository.
//!
//! One record per issued credential. The `manifest_id` is the only
//! externally-addressable reference to the record; it is generated
//! independently of the record's own UUID. Records are created once at
//! issuance and read (never mutated) during retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStore, StorageError, StorageResult};

/// Access flag of a stored QR code: passcode-protected or unprotected.
///
/// `P` records resolve through the manifest endpoint; `U` records are
/// fetched directly from the JSON endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum AccessFlag {
    /// Passcode-protected; retrieval goes through the manifest endpoint.
    P,
    /// Unprotected; the JSON endpoint serves the document directly.
    U,
}

impl AccessFlag {
    pub fn is_protected(self) -> bool {
        matches!(self, AccessFlag::P)
    }
}

/// QR code record stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredQrCode {
    /// Record identity (UUID); also derives the document blob name
    pub id: String,
    /// Public-facing manifest identifier (base64url of 32 random bytes)
    pub manifest_id: String,
    /// File name of the stored clinical JSON blob
    pub json_file: String,
    /// Base64url-encoded 32-byte symmetric key embedded in the SHL payload
    pub key: String,
    /// Access flag (`P` = passcode-protected, `U` = unprotected)
    pub flag: AccessFlag,
    /// Passcode required to resolve the manifest, if protected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_code: Option<String>,
    /// Credential expiry supplied at issuance (epoch ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<i64>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

/// Repository for QR code records.
pub struct QrCodeRepository<'a> {
    storage: &'a FileStore,
}

impl<'a> QrCodeRepository<'a> {
    /// Create a new QrCodeRepository.
    pub fn new(storage: &'a FileStore) -> Self {
        Self { storage }
    }

    /// Check if a record exists.
    pub fn exists(&self, id: &str) -> bool {
        self.storage.exists(self.storage.paths().qr_code(id))
    }

    /// Get a record by its own identity.
    pub fn get(&self, id: &str) -> StorageResult<StoredQrCode> {
        let path = self.storage.paths().qr_code(id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("QrCode {id}")));
        }
        self.storage.read_json(path)
    }

    /// Find a record by its public manifest identifier.
    pub fn find_by_manifest_id(&self, manifest_id: &str) -> StorageResult<StoredQrCode> {
        let ids = self
            .storage
            .list_files(self.storage.paths().qr_codes_dir(), "json")?;

        for id in ids {
            if let Ok(record) = self.get(&id) {
                if record.manifest_id == manifest_id {
                    return Ok(record);
                }
            }
        }

        Err(StorageError::NotFound(format!(
            "QrCode with manifest id {manifest_id}"
        )))
    }

    /// Create a new record.
    pub fn create(&self, record: &StoredQrCode) -> StorageResult<()> {
        if self.exists(&record.id) {
            return Err(StorageError::AlreadyExists(format!("QrCode {}", record.id)));
        }
        self.storage
            .write_json(self.storage.paths().qr_code(&record.id), record)
    }

    /// Delete a record. Only used as compensating cleanup during issuance.
    pub fn delete(&self, id: &str) -> StorageResult<()> {
        if !self.exists(id) {
            return Err(StorageError::NotFound(format!("QrCode {id}")));
        }
        self.storage.delete(self.storage.paths().qr_code(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use std::env;
    use std::fs;

    fn test_storage() -> FileStore {
        let dir = env::temp_dir().join(format!("test-qr-repo-{}", uuid::Uuid::new_v4()));
        let mut storage = FileStore::new(StoragePaths::new(&dir));
        storage.initialize().expect("Failed to initialize");
        storage
    }

    fn cleanup(storage: &FileStore) {
        let _ = fs::remove_dir_all(storage.paths().root());
    }

    fn test_record(id: &str, manifest_id: &str, flag: AccessFlag) -> StoredQrCode {
        StoredQrCode {
            id: id.to_string(),
            manifest_id: manifest_id.to_string(),
            json_file: format!("{id}.json"),
            key: "a".repeat(43),
            flag,
            pass_code: flag.is_protected().then(|| "secret123".to_string()),
            expires_on: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_get_record() {
        let storage = test_storage();
        let repo = QrCodeRepository::new(&storage);

        let record = test_record("qr-1", "manifest-aaa", AccessFlag::P);
        repo.create(&record).unwrap();

        let loaded = repo.get("qr-1").unwrap();
        assert_eq!(loaded, record);

        cleanup(&storage);
    }

    #[test]
    fn find_by_manifest_id_works() {
        let storage = test_storage();
        let repo = QrCodeRepository::new(&storage);

        repo.create(&test_record("qr-a", "manifest-a", AccessFlag::U))
            .unwrap();
        repo.create(&test_record("qr-b", "manifest-b", AccessFlag::P))
            .unwrap();

        let found = repo.find_by_manifest_id("manifest-b").unwrap();
        assert_eq!(found.id, "qr-b");
        assert!(found.flag.is_protected());

        let missing = repo.find_by_manifest_id("manifest-c");
        assert!(matches!(missing, Err(StorageError::NotFound(_))));

        cleanup(&storage);
    }

    #[test]
    fn duplicate_id_rejected() {
        let storage = test_storage();
        let repo = QrCodeRepository::new(&storage);

        let record = test_record("qr-dup", "manifest-dup", AccessFlag::U);
        repo.create(&record).unwrap();
        let result = repo.create(&record);
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

        cleanup(&storage);
    }

    #[test]
    fn access_flag_serializes_as_single_letter() {
        assert_eq!(serde_json::to_string(&AccessFlag::P).unwrap(), "\"P\"");
        assert_eq!(serde_json::to_string(&AccessFlag::U).unwrap(), "\"U\"");
    }
}
