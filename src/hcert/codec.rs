// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Text and compression primitives for the credential string.
//!
//! The outermost layers of the token format: a fixed 4-character context
//! prefix, base45 (QR alphanumeric mode alphabet), and zlib compression.
//! All transforms here are pure; every decode direction fails closed on
//! malformed input.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

/// Context prefix identifying a health certificate QR payload.
pub const CONTEXT_PREFIX: &str = "HC1:";

/// Error type for codec operations.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("missing HC1: context prefix")]
    MissingPrefix,
    #[error("base45 decode failed: {0}")]
    Base45(String),
    #[error("compression failed: {0}")]
    Compress(#[source] std::io::Error),
    #[error("decompression failed: {0}")]
    Decompress(#[source] std::io::Error),
}

/// Prepend the context prefix to a text-encoded token.
pub fn attach_prefix(encoded: &str) -> String {
    format!("{CONTEXT_PREFIX}{encoded}")
}

/// Strip the context prefix from a scanned token.
pub fn strip_prefix(token: &str) -> Result<&str, CodecError> {
    token
        .strip_prefix(CONTEXT_PREFIX)
        .ok_or(CodecError::MissingPrefix)
}

/// Encode bytes into the base45 alphabet.
pub fn text_encode(bytes: &[u8]) -> String {
    base45::encode(bytes)
}

/// Decode a base45 string back to bytes.
pub fn text_decode(text: &str) -> Result<Vec<u8>, CodecError> {
    base45::decode(text).map_err(|e| CodecError::Base45(e.to_string()))
}

/// Compress bytes with zlib.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(CodecError::Compress)?;
    encoder.finish().map_err(CodecError::Compress)
}

/// Decompress zlib-compressed bytes.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(CodecError::Decompress)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_encode_round_trips() {
        let inputs: [&[u8]; 4] = [b"", b"AB", b"Hello!!", &[0u8, 255, 7, 91, 200, 13]];
        for input in inputs {
            let encoded = text_encode(input);
            let decoded = text_decode(&encoded).unwrap();
            assert_eq!(decoded, input);
        }
    }

    #[test]
    fn text_decode_rejects_invalid_alphabet() {
        assert!(text_decode("abc~~~").is_err());
    }

    #[test]
    fn compression_round_trips() {
        let inputs: [&[u8]; 3] = [b"", b"{\"iss\":\"XA\"}", &[0u8; 1024]];
        for input in inputs {
            let compressed = compress(input).unwrap();
            let restored = decompress(&compressed).unwrap();
            assert_eq!(restored, input);
        }
    }

    #[test]
    fn decompress_rejects_garbage() {
        assert!(decompress(b"definitely not zlib").is_err());
    }

    #[test]
    fn prefix_attach_and_strip() {
        let token = attach_prefix("NCFOXN");
        assert_eq!(token, "HC1:NCFOXN");
        assert_eq!(strip_prefix(&token).unwrap(), "NCFOXN");
        assert!(matches!(
            strip_prefix("XX9:NCFOXN"),
            Err(CodecError::MissingPrefix)
        ));
    }
}
