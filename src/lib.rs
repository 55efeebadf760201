// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! hcert-gateway - Signed Health Credential Issuance & Verification
//!
//! This crate issues and verifies VSHC credentials: compact signed tokens
//! (`HC1:` + base45 + zlib + COSE_Sign1) embedding SMART Health Links to
//! IPS clinical documents, with a manifest/passcode access layer enforcing
//! single-use document retrieval.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `hcert` - credential token encoding, signing and the verification pipeline
//! - `trust` - trust network key resolution
//! - `access` - manifest gating and single-use retrieval
//! - `storage` - file-backed persistence and document blobs

pub mod access;
pub mod api;
pub mod config;
pub mod error;
pub mod hcert;
pub mod models;
pub mod state;
pub mod storage;
pub mod trust;
