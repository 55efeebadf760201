// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire payload types carried inside the signed credential.
//!
//! Field names are part of the credential format and must not change:
//! external verifiers deserialize the exact JSON produced here.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::AccessFlag;

/// URI scheme prefix for SMART Health Links.
pub const SHLINK_SCHEME: &str = "shlink://";

/// Display label embedded in every issued SHL payload.
pub const SHLINK_LABEL: &str = "GDHCN Validator";

/// Expiry sentinel used when the caller supplies none. The payload `exp`
/// claim is epoch seconds, so the sentinel is the maximum representable
/// millisecond timestamp scaled down.
pub const NO_EXPIRY_SECONDS: i64 = i64::MAX / 1000;

/// SMART Health Link payload: where and how to retrieve the document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SHLinkContent {
    /// Retrieval URL (manifest endpoint for `P`, JSON endpoint for `U`)
    pub url: String,
    /// Access flag
    pub flag: AccessFlag,
    /// Human-readable label
    pub label: String,
    /// Link expiry (epoch ms), absent when unbounded
    pub exp: Option<i64>,
    /// Base64url-encoded 32-byte symmetric key. Generated at issuance and
    /// carried for interoperability; nothing in this service consumes it.
    pub key: String,
}

impl SHLinkContent {
    /// Wrap the payload into its `shlink://` URI form.
    pub fn to_uri(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{SHLINK_SCHEME}{}", BASE64_STANDARD.encode(json)))
    }

    /// Parse a `shlink://` URI back into its payload.
    pub fn from_uri(uri: &str) -> Result<Self, String> {
        let encoded = uri
            .strip_prefix(SHLINK_SCHEME)
            .ok_or_else(|| format!("missing {SHLINK_SCHEME} prefix"))?;
        let json = BASE64_STANDARD
            .decode(encoded)
            .map_err(|e| format!("invalid base64: {e}"))?;
        serde_json::from_slice(&json).map_err(|e| format!("invalid SHL payload: {e}"))
    }
}

/// One smart health link entry in the credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SmartHealthLink {
    #[serde(rename = "shLink")]
    pub sh_link: String,
}

/// Container of health links inside the credential payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCertificate {
    #[serde(rename = "healthLinks")]
    pub health_links: Vec<SmartHealthLink>,
}

/// The signed credential payload (CWT-style claims as JSON).
///
/// `iat` is epoch milliseconds; `exp` is epoch seconds, with
/// [`NO_EXPIRY_SECONDS`] standing in for "no practical expiry".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificatePayload {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "healthCertificate")]
    pub health_certificate: HealthCertificate,
}

impl CertificatePayload {
    /// The effective `exp` claim for an optional caller expiry (epoch ms).
    pub fn effective_expiry(expires_on_ms: Option<i64>) -> i64 {
        match expires_on_ms {
            Some(ms) => ms / 1000,
            None => NO_EXPIRY_SECONDS,
        }
    }
}
