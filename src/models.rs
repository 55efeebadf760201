// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request/response DTOs for the public API.
//!
//! Field names follow the original wire protocol (camelCase).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::access::RetrievalDescriptor;
use crate::hcert::{SHLinkContent, StageOutcome, VerificationReport};

/// Issuance request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeRequest {
    /// Passcode to unlock the QR code information
    #[schema(example = "passcode123")]
    pub pass_code: Option<String>,
    /// Expiration date of the QR code
    #[schema(example = "2025-04-25T14:05:15.953Z")]
    pub expires_on: Option<DateTime<Utc>>,
    /// FHIR resource JSON object
    pub json_content: String,
}

/// Verification request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    /// Scanned QR content, starting with `HC1:`
    pub qr_code_content: String,
}

/// Verification response: per-stage statuses plus the recovered link.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCwtResponse {
    /// Stage outcomes keyed by one-based stage position
    pub validation_status: BTreeMap<u8, StageOutcome>,
    /// Recovered SHL payload; null unless all stages succeeded
    pub sh_link_content: Option<SHLinkContent>,
}

impl From<VerificationReport> for ValidateCwtResponse {
    fn from(report: VerificationReport) -> Self {
        let validation_status = report
            .stages
            .into_iter()
            .enumerate()
            .map(|(i, outcome)| (i as u8 + 1, outcome))
            .collect();
        Self {
            validation_status,
            sh_link_content: report.content,
        }
    }
}

/// Manifest resolution request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ManifestRequest {
    /// Name of the subject that is going to unlock the data
    #[schema(example = "John Doe")]
    pub recipient: Option<String>,
    /// Passcode to unlock the QR code information
    #[schema(example = "passcode123")]
    pub passcode: Option<String>,
}

/// One retrievable file in a manifest response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFile {
    pub content_type: String,
    pub location: String,
}

/// Manifest resolution response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ManifestResponse {
    pub files: Vec<ManifestFile>,
}

impl From<RetrievalDescriptor> for ManifestResponse {
    fn from(descriptor: RetrievalDescriptor) -> Self {
        Self {
            files: vec![ManifestFile {
                content_type: descriptor.content_type.to_string(),
                location: descriptor.location,
            }],
        }
    }
}
