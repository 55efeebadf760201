// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! COSE_Sign1 envelope handling.
//!
//! The credential payload travels inside a COSE_Sign1 message signed with
//! ES256. The protected header carries the algorithm and the key id that
//! verifiers use to resolve the signer certificate from the trust network.
//! The key id is readable without verification, like any unauthenticated
//! header.

use coset::{iana, CborSerializable, CoseSign1, CoseSign1Builder, HeaderBuilder};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use thiserror::Error;

/// Error type for envelope operations.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("COSE encode failed: {0}")]
    Encode(String),
    #[error("COSE decode failed: {0}")]
    Decode(String),
    #[error("envelope has no payload")]
    MissingPayload,
    #[error("envelope has no key id")]
    MissingKeyId,
}

/// Sign `payload` into a COSE_Sign1 envelope with the given key id.
pub fn sign_envelope(
    payload: &[u8],
    key: &SigningKey,
    key_id: &str,
) -> Result<Vec<u8>, EnvelopeError> {
    let protected = HeaderBuilder::new()
        .algorithm(iana::Algorithm::ES256)
        .key_id(key_id.as_bytes().to_vec())
        .build();

    let sign1 = CoseSign1Builder::new()
        .protected(protected)
        .payload(payload.to_vec())
        .create_signature(b"", |to_sign| {
            let signature: Signature = key.sign(to_sign);
            signature.to_bytes().to_vec()
        })
        .build();

    sign1.to_vec().map_err(|e| EnvelopeError::Encode(e.to_string()))
}

/// Parse a COSE_Sign1 envelope from bytes.
pub fn parse_envelope(bytes: &[u8]) -> Result<CoseSign1, EnvelopeError> {
    CoseSign1::from_slice(bytes).map_err(|e| EnvelopeError::Decode(e.to_string()))
}

/// The signed payload bytes of a parsed envelope.
pub fn payload_bytes(envelope: &CoseSign1) -> Result<Vec<u8>, EnvelopeError> {
    envelope
        .payload
        .clone()
        .ok_or(EnvelopeError::MissingPayload)
}

/// Read the key id from the protected header. Does NOT verify anything.
pub fn extract_key_id(envelope: &CoseSign1) -> Result<String, EnvelopeError> {
    let kid = &envelope.protected.header.key_id;
    if kid.is_empty() {
        return Err(EnvelopeError::MissingKeyId);
    }
    String::from_utf8(kid.clone()).map_err(|_| EnvelopeError::MissingKeyId)
}

/// Verify the envelope signature against a public key.
///
/// Fails closed: any malformed signature material yields `false`.
pub fn verify_envelope(envelope: &CoseSign1, public_key: &VerifyingKey) -> bool {
    envelope
        .verify_signature(b"", |signature, to_verify| {
            let signature =
                Signature::from_slice(signature).map_err(|e| e.to_string())?;
            public_key
                .verify(to_verify, &signature)
                .map_err(|e| e.to_string())
        })
        .is_ok()
}
