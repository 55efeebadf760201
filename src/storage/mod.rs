// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Persistent Storage Module
//!
//! File-backed persistence for the gateway. Every entity is a JSON file
//! under the data root; the clinical document blobs live beside them as
//! raw files.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/
//!   qr_codes/
//!     {uuid}.json          # QR code records (one per issued credential)
//!   ips_files/
//!     {uuid}.json          # Single-use retrieval records (rotated)
//!   recipient_keys/
//!     {uuid}.json          # Recipient key records
//!   documents/
//!     {qr_uuid}.json       # Raw IPS JSON blobs
//! ```

pub mod documents;
pub mod file_store;
pub mod paths;
pub mod repository;

pub use documents::DocumentStore;
pub use file_store::{FileStore, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{
    AccessFlag, IpsFileRecord, IpsFileRepository, QrCodeRepository, RecipientKeyRecord,
    RecipientKeyRepository, StoredQrCode,
};
