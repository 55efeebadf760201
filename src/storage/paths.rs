// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the persistent storage layout.

use std::path::{Path, PathBuf};

/// Base directory for all persistent storage.
pub const DATA_ROOT: &str = "/data";

/// Storage path utilities for the on-disk layout.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== QR Code Record Paths ==========

    /// Directory containing all QR code records.
    pub fn qr_codes_dir(&self) -> PathBuf {
        self.root.join("qr_codes")
    }

    /// Path to a specific QR code record file.
    pub fn qr_code(&self, id: &str) -> PathBuf {
        self.qr_codes_dir().join(format!("{id}.json"))
    }

    // ========== IPS File (Retrieval Identity) Paths ==========

    /// Directory containing all single-use retrieval records.
    pub fn ips_files_dir(&self) -> PathBuf {
        self.root.join("ips_files")
    }

    /// Path to a specific retrieval record file.
    pub fn ips_file(&self, id: &str) -> PathBuf {
        self.ips_files_dir().join(format!("{id}.json"))
    }

    // ========== Recipient Key Paths ==========

    /// Directory containing all recipient key records.
    pub fn recipient_keys_dir(&self) -> PathBuf {
        self.root.join("recipient_keys")
    }

    /// Path to a specific recipient key record file.
    pub fn recipient_key(&self, id: &str) -> PathBuf {
        self.recipient_keys_dir().join(format!("{id}.json"))
    }

    // ========== Document Blob Paths ==========

    /// Directory containing the raw IPS JSON documents.
    pub fn documents_dir(&self) -> PathBuf {
        self.root.join("documents")
    }

    /// Path to a stored document blob by file name.
    pub fn document(&self, file_name: &str) -> PathBuf {
        self.documents_dir().join(file_name)
    }
}
