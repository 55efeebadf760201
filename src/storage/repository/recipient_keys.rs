// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipient key record repository.
//!
//! Stores per-recipient key material references alongside the document id
//! they were issued for. The core issuance/verification flow does not read
//! these records; they exist for deployments that track who unlocked a
//! manifest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStore, StorageError, StorageResult};

/// Recipient key record stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RecipientKeyRecord {
    /// Record identity (UUID)
    pub id: String,
    /// Display name of the recipient who unlocked the data
    pub recipient: String,
    /// Identity of the document the key was issued against
    pub json_id: String,
    /// When the key expires, if bounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<DateTime<Utc>>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

/// Repository for recipient key records.
pub struct RecipientKeyRepository<'a> {
    storage: &'a FileStore,
}

impl<'a> RecipientKeyRepository<'a> {
    /// Create a new RecipientKeyRepository.
    pub fn new(storage: &'a FileStore) -> Self {
        Self { storage }
    }

    /// Check if a record exists.
    pub fn exists(&self, id: &str) -> bool {
        self.storage.exists(self.storage.paths().recipient_key(id))
    }

    /// Get a record by id.
    pub fn get(&self, id: &str) -> StorageResult<RecipientKeyRecord> {
        let path = self.storage.paths().recipient_key(id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("RecipientKey {id}")));
        }
        self.storage.read_json(path)
    }

    /// Find a record by id and document id.
    pub fn find_by_id_and_json_id(
        &self,
        id: &str,
        json_id: &str,
    ) -> StorageResult<RecipientKeyRecord> {
        let record = self.get(id)?;
        if record.json_id == json_id {
            Ok(record)
        } else {
            Err(StorageError::NotFound(format!(
                "RecipientKey {id} for document {json_id}"
            )))
        }
    }

    /// Create a new record.
    pub fn create(&self, record: &RecipientKeyRecord) -> StorageResult<()> {
        if self.exists(&record.id) {
            return Err(StorageError::AlreadyExists(format!(
                "RecipientKey {}",
                record.id
            )));
        }
        self.storage
            .write_json(self.storage.paths().recipient_key(&record.id), record)
    }

    /// Delete a record.
    pub fn delete(&self, id: &str) -> StorageResult<()> {
        if !self.exists(id) {
            return Err(StorageError::NotFound(format!("RecipientKey {id}")));
        }
        self.storage
            .delete(self.storage.paths().recipient_key(id))
    }
}
