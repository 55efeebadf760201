// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-use retrieval record repository.
//!
//! Each record is a short-lived capability guarding one download of the
//! clinical document behind a passcode-protected manifest. The record's own
//! id is the retrieval identity embedded in manifest responses; it holds a
//! non-owning back-reference to the manifest identifier. Rotation never
//! mutates an existing identity: a stale or consumed record is deleted and
//! a replacement minted under a fresh id.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::super::{FileStore, StorageError, StorageResult};

/// Single-use retrieval record stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IpsFileRecord {
    /// Retrieval identity (UUID), distinct from the manifest identifier
    pub id: String,
    /// Manifest identifier of the owning QR code record
    pub manifest_id: String,
    /// When this identity was minted
    pub created_at: DateTime<Utc>,
    /// Whether the identity has been consumed
    pub accessed: bool,
}

impl IpsFileRecord {
    /// Mint a fresh unaccessed record for a manifest identifier.
    pub fn mint(manifest_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            manifest_id: manifest_id.to_string(),
            created_at: Utc::now(),
            accessed: false,
        }
    }

    /// Whether the record is past its TTL at the given instant.
    pub fn is_expired(&self, ttl_minutes: i64, now: DateTime<Utc>) -> bool {
        self.created_at + Duration::minutes(ttl_minutes) <= now
    }
}

/// Repository for single-use retrieval records.
pub struct IpsFileRepository<'a> {
    storage: &'a FileStore,
}

impl<'a> IpsFileRepository<'a> {
    /// Create a new IpsFileRepository.
    pub fn new(storage: &'a FileStore) -> Self {
        Self { storage }
    }

    /// Check if a record exists.
    pub fn exists(&self, id: &str) -> bool {
        self.storage.exists(self.storage.paths().ips_file(id))
    }

    /// Get a record by retrieval identity.
    pub fn get(&self, id: &str) -> StorageResult<IpsFileRecord> {
        let path = self.storage.paths().ips_file(id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("IpsFile {id}")));
        }
        self.storage.read_json(path)
    }

    /// Find the record currently backing a manifest identifier.
    pub fn find_by_manifest_id(&self, manifest_id: &str) -> StorageResult<Option<IpsFileRecord>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().ips_files_dir(), "json")?;

        for id in ids {
            if let Ok(record) = self.get(&id) {
                if record.manifest_id == manifest_id {
                    return Ok(Some(record));
                }
            }
        }
        Ok(None)
    }

    /// Persist a freshly minted record.
    pub fn create(&self, record: &IpsFileRecord) -> StorageResult<()> {
        if self.exists(&record.id) {
            return Err(StorageError::AlreadyExists(format!(
                "IpsFile {}",
                record.id
            )));
        }
        self.storage
            .write_json(self.storage.paths().ips_file(&record.id), record)
    }

    /// Mark a record as consumed, persisting before the caller releases it.
    pub fn mark_accessed(&self, record: &mut IpsFileRecord) -> StorageResult<()> {
        record.accessed = true;
        self.storage
            .write_json(self.storage.paths().ips_file(&record.id), record)
    }

    /// Delete a record (revocation half of a rotation).
    pub fn delete(&self, id: &str) -> StorageResult<()> {
        if !self.exists(id) {
            return Err(StorageError::NotFound(format!("IpsFile {id}")));
        }
        self.storage.delete(self.storage.paths().ips_file(id))
    }
}
