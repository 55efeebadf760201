// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blob store for raw IPS JSON documents.
//!
//! Documents are stored verbatim under `documents/`, keyed by a file name
//! derived from the owning QR code record's UUID (`{uuid}.json`). The store
//! never inspects the clinical payload.

use super::{FileStore, StorageError, StorageResult};

/// Blob store for clinical JSON documents.
pub struct DocumentStore<'a> {
    storage: &'a FileStore,
}

impl<'a> DocumentStore<'a> {
    /// Create a new DocumentStore.
    pub fn new(storage: &'a FileStore) -> Self {
        Self { storage }
    }

    /// File name for the document belonging to a QR code record.
    pub fn file_name(qr_code_id: &str) -> String {
        format!("{qr_code_id}.json")
    }

    /// Store a document under the given file name.
    pub fn put(&self, file_name: &str, content: &[u8]) -> StorageResult<()> {
        self.storage
            .write_raw(self.storage.paths().document(file_name), content)
    }

    /// Fetch a document by file name.
    pub fn get(&self, file_name: &str) -> StorageResult<Vec<u8>> {
        let path = self.storage.paths().document(file_name);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Document {file_name}")));
        }
        self.storage.read_raw(path)
    }

    /// Delete a document. Used as compensating cleanup when issuance fails
    /// after the blob write.
    pub fn delete(&self, file_name: &str) -> StorageResult<()> {
        self.storage
            .delete(self.storage.paths().document(file_name))
    }
}
