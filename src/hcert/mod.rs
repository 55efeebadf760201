// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Health Certificate Module
//!
//! Everything that touches the credential token format:
//!
//! - `codec` - context prefix, base45 text coding, zlib compression
//! - `cose` - COSE_Sign1 envelope sign/verify and key id extraction
//! - `keys` - document-signer key loading (PEM, P-256)
//! - `payload` - wire payload types and the `shlink://` URI form
//! - `encoder` - credential issuance
//! - `decoder` - the nine-stage verification pipeline
//!
//! The credential string layering is fixed for interoperability:
//! `"HC1:" + base45(zlib(COSE_Sign1(JSON payload)))`.

pub mod codec;
pub mod cose;
pub mod decoder;
pub mod encoder;
pub mod keys;
pub mod payload;

pub use decoder::{
    CredentialVerifier, StageOutcome, StageStatus, VerificationReport, VerificationStage,
};
pub use encoder::{CredentialEncoder, IssuanceError};
pub use payload::{CertificatePayload, SHLinkContent};
