// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to file-backed storage.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using the FileStore for all file operations.

pub mod ips_files;
pub mod qr_codes;
pub mod recipient_keys;

pub use ips_files::{IpsFileRecord, IpsFileRepository};
pub use qr_codes::{AccessFlag, QrCodeRepository, StoredQrCode};
pub use recipient_keys::{RecipientKeyRecord, RecipientKeyRepository};
