// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trust network resolution.
//!
//! Maps an (issuer, key id) pair to the signer's public key by fetching the
//! document-signer certificate from the trust network and extracting its
//! subject public key. Every verification re-resolves; nothing is cached,
//! so a revoked or rotated certificate is never served stale.
//!
//! Verification code depends on the [`KeySource`] trait rather than the
//! concrete HTTP client, so tests can resolve keys locally.

use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use p256::ecdsa::VerifyingKey;
use serde::Deserialize;
use thiserror::Error;
use x509_cert::der::Decode;
use x509_cert::Certificate;

/// Default timeout for trust network calls.
const TRUST_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for trust resolution.
#[derive(Debug, Error)]
pub enum TrustError {
    #[error("trust network unreachable: {0}")]
    Unreachable(String),
    #[error("no certificate for issuer {issuer} and key id {key_id}")]
    CertificateNotFound { issuer: String, key_id: String },
    #[error("invalid certificate material: {0}")]
    InvalidCertificate(String),
}

/// Source of verification keys, keyed by (issuer, key id).
pub trait KeySource {
    fn resolve_key(
        &self,
        issuer: &str,
        key_id: &str,
    ) -> impl Future<Output = Result<VerifyingKey, TrustError>> + Send;
}

/// Trust list entry returned by the trust network.
#[derive(Debug, Deserialize)]
struct TrustListEntry {
    certificate: String,
}

/// HTTP client for the trust network.
#[derive(Clone)]
pub struct TrustClient {
    base_url: String,
    client: reqwest::Client,
}

impl TrustClient {
    /// Create a new trust client for the given trust network base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(TRUST_CALL_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Fetch the document-signer certificate for (issuer, key id).
    ///
    /// Returns `Ok(None)` when the trust network has no matching entry.
    async fn fetch_certificate(
        &self,
        issuer: &str,
        key_id: &str,
    ) -> Result<Option<String>, TrustError> {
        let url = format!(
            "{}/trustList/{issuer}/{key_id}",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TrustError::Unreachable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(TrustError::Unreachable(format!(
                "HTTP {} from trust network",
                response.status()
            )));
        }

        let entry: TrustListEntry = response
            .json()
            .await
            .map_err(|e| TrustError::Unreachable(e.to_string()))?;

        Ok(Some(entry.certificate))
    }
}

impl KeySource for TrustClient {
    async fn resolve_key(&self, issuer: &str, key_id: &str) -> Result<VerifyingKey, TrustError> {
        let certificate = self
            .fetch_certificate(issuer, key_id)
            .await?
            .ok_or_else(|| TrustError::CertificateNotFound {
                issuer: issuer.to_string(),
                key_id: key_id.to_string(),
            })?;

        public_key_from_certificate(&certificate)
    }
}

/// Extract the P-256 subject public key from a base64 DER certificate.
pub fn public_key_from_certificate(certificate: &str) -> Result<VerifyingKey, TrustError> {
    let compact: String = certificate
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let der = BASE64_STANDARD
        .decode(compact)
        .map_err(|e| TrustError::InvalidCertificate(format!("base64: {e}")))?;

    let cert = Certificate::from_der(&der)
        .map_err(|e| TrustError::InvalidCertificate(format!("X.509: {e}")))?;

    let point = cert
        .tbs_certificate
        .subject_public_key_info
        .subject_public_key
        .raw_bytes();

    VerifyingKey::from_sec1_bytes(point)
        .map_err(|e| TrustError::InvalidCertificate(format!("not a P-256 key: {e}")))
}
