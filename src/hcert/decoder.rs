// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential verification.
//!
//! A strict nine-stage, fail-fast pipeline. Each stage is attempted only if
//! every prior stage succeeded; the first failure short-circuits the rest
//! and the full outcome vector is always returned, never an error. The
//! recovered SMART Health Link payload is present only when the final
//! stage succeeded.

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::trust::KeySource;

use super::codec;
use super::cose;
use super::payload::{CertificatePayload, SHLinkContent};

/// The ordered verification stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStage {
    DecodeBase45,
    DecompressPayload,
    ParseCoseMessage,
    ExtractClaims,
    ExtractCountryCode,
    FetchPublicKey,
    ValidateSignature,
    ExtractHealthLink,
    ValidateExpiry,
}

impl VerificationStage {
    /// All stages in pipeline order.
    pub const ALL: [VerificationStage; 9] = [
        VerificationStage::DecodeBase45,
        VerificationStage::DecompressPayload,
        VerificationStage::ParseCoseMessage,
        VerificationStage::ExtractClaims,
        VerificationStage::ExtractCountryCode,
        VerificationStage::FetchPublicKey,
        VerificationStage::ValidateSignature,
        VerificationStage::ExtractHealthLink,
        VerificationStage::ValidateExpiry,
    ];

    /// Stable wire code for this stage.
    pub fn code(self) -> &'static str {
        match self {
            VerificationStage::DecodeBase45 => "DECODE_BASE45",
            VerificationStage::DecompressPayload => "DEFLATE_COSE_BYTES",
            VerificationStage::ParseCoseMessage => "CONVERT_COSE_MESSAGE",
            VerificationStage::ExtractClaims => "COSE_MESSAGE_PAYLOAD_TO_JSON",
            VerificationStage::ExtractCountryCode => "EXTRACT_COUNTRY_CODE",
            VerificationStage::FetchPublicKey => "FETCH_PUBLIC_KEY_GDHCN",
            VerificationStage::ValidateSignature => "VALIDATE_SIGNATURE",
            VerificationStage::ExtractHealthLink => "EXTRACT_HCERT",
            VerificationStage::ValidateExpiry => "VALIDATE_EXPIRY",
        }
    }

    /// Human description for this stage.
    pub fn description(self) -> &'static str {
        match self {
            VerificationStage::DecodeBase45 => "Decoding Base45 QR",
            VerificationStage::DecompressPayload => "Decompressing (Deflate) decoded QR Payload",
            VerificationStage::ParseCoseMessage => "Converting Decompressed Payload to CWT",
            VerificationStage::ExtractClaims => "Extracting Claims from CWT",
            VerificationStage::ExtractCountryCode => "Extracting Country Code",
            VerificationStage::FetchPublicKey => "Connecting & Fetching Public Key from GDHCN",
            VerificationStage::ValidateSignature => "Validating Signature",
            VerificationStage::ExtractHealthLink => "Extracting Smart Health Link",
            VerificationStage::ValidateExpiry => "Verifying SHL QR Expiry",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Status of one verification stage.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Pending,
    Success,
    Failed,
}

/// Outcome of one verification stage.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct StageOutcome {
    /// One-based stage position, as a string on the wire
    pub step: String,
    pub status: StageStatus,
    /// Stable stage code
    pub code: String,
    /// Human description of the stage
    pub description: String,
    /// Failure detail, present only when the stage failed
    pub error: Option<String>,
}

/// The full result of a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// One outcome per stage, in pipeline order
    pub stages: Vec<StageOutcome>,
    /// Recovered link payload; present only if all nine stages succeeded
    pub content: Option<SHLinkContent>,
}

impl VerificationReport {
    fn build(completed: usize, failure: Option<String>, content: Option<SHLinkContent>) -> Self {
        let stages = VerificationStage::ALL
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                let (status, error) = if i < completed {
                    (StageStatus::Success, None)
                } else if i == completed && failure.is_some() {
                    (StageStatus::Failed, failure.clone())
                } else {
                    (StageStatus::Pending, None)
                };
                StageOutcome {
                    step: (i + 1).to_string(),
                    status,
                    code: stage.code().to_string(),
                    description: stage.description().to_string(),
                    error,
                }
            })
            .collect();

        Self { stages, content }
    }

    fn success(content: SHLinkContent) -> Self {
        Self::build(VerificationStage::ALL.len(), None, Some(content))
    }

    fn failed_at(stage: VerificationStage, error: String) -> Self {
        Self::build(stage.index(), Some(error), None)
    }

    /// Whether every stage succeeded.
    pub fn is_fully_verified(&self) -> bool {
        self.stages
            .iter()
            .all(|outcome| outcome.status == StageStatus::Success)
    }

    /// Status of a single stage.
    pub fn status_of(&self, stage: VerificationStage) -> StageStatus {
        self.stages[stage.index()].status
    }
}

type StageFailure = (VerificationStage, String);

/// Credential verifier over a key source.
pub struct CredentialVerifier<'a, K: KeySource> {
    keys: &'a K,
}

impl<'a, K: KeySource> CredentialVerifier<'a, K> {
    /// Create a new CredentialVerifier.
    pub fn new(keys: &'a K) -> Self {
        Self { keys }
    }

    /// Run the nine-stage verification pipeline.
    ///
    /// Never fails outward: every failure is reported as the current
    /// stage's outcome, with the remaining stages left pending.
    pub async fn verify(&self, credential: &str) -> VerificationReport {
        match self.run_pipeline(credential).await {
            Ok(content) => {
                tracing::debug!("credential fully verified");
                VerificationReport::success(content)
            }
            Err((stage, error)) => {
                tracing::info!(code = stage.code(), %error, "credential verification failed");
                VerificationReport::failed_at(stage, error)
            }
        }
    }

    async fn run_pipeline(&self, credential: &str) -> Result<SHLinkContent, StageFailure> {
        use VerificationStage as Stage;

        // 1: context prefix + base45
        let encoded = codec::strip_prefix(credential)
            .map_err(|e| (Stage::DecodeBase45, e.to_string()))?;
        let compressed =
            codec::text_decode(encoded).map_err(|e| (Stage::DecodeBase45, e.to_string()))?;

        // 2: zlib
        let envelope_bytes = codec::decompress(&compressed)
            .map_err(|e| (Stage::DecompressPayload, e.to_string()))?;

        // 3: COSE_Sign1 structure
        let envelope = cose::parse_envelope(&envelope_bytes)
            .map_err(|e| (Stage::ParseCoseMessage, e.to_string()))?;

        // 4: claims
        let payload_bytes =
            cose::payload_bytes(&envelope).map_err(|e| (Stage::ExtractClaims, e.to_string()))?;
        let payload: CertificatePayload = serde_json::from_slice(&payload_bytes)
            .map_err(|e| (Stage::ExtractClaims, e.to_string()))?;

        // 5: issuer + key id
        let key_id = cose::extract_key_id(&envelope)
            .map_err(|e| (Stage::ExtractCountryCode, e.to_string()))?;
        let issuer = payload.iss.clone();

        // 6: trust network resolution
        let public_key = self
            .keys
            .resolve_key(&issuer, &key_id)
            .await
            .map_err(|e| (Stage::FetchPublicKey, e.to_string()))?;

        // 7: signature
        if !cose::verify_envelope(&envelope, &public_key) {
            return Err((
                Stage::ValidateSignature,
                "signature validation failed".to_string(),
            ));
        }

        // 8: first health link
        let sh_link = payload
            .health_certificate
            .health_links
            .first()
            .map(|link| link.sh_link.clone())
            .ok_or_else(|| {
                (
                    Stage::ExtractHealthLink,
                    "credential carries no health link".to_string(),
                )
            })?;

        // 9: link payload + expiry
        let content = SHLinkContent::from_uri(&sh_link)
            .map_err(|e| (Stage::ValidateExpiry, e))?;
        if let Some(exp) = content.exp {
            if Utc::now().timestamp_millis() >= exp {
                return Err((Stage::ValidateExpiry, "shlink expired".to_string()));
            }
        }

        Ok(content)
    }
}
